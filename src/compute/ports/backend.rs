//! Compute backend port consumed by the OCCI glue services.

use crate::compute::domain::{
    Console, DeviceName, Flavor, FlavorName, ImageRef, InstanceId, InstanceRecord, LaunchRequest,
    RebootType, SecurityContext, VolumeId, VolumeRecord,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for compute backend operations.
pub type ComputeBackendResult<T> = Result<T, ComputeBackendError>;

/// Contract of the external compute management API.
///
/// Every call carries the caller's [`SecurityContext`]; implementations must
/// not fall back to an ambient identity.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ComputeBackend: Send + Sync {
    /// Fetches an instance.
    ///
    /// # Errors
    ///
    /// Returns [`ComputeBackendError::InstanceNotFound`] when the instance
    /// does not exist in the caller's project.
    async fn get(
        &self,
        ctx: &SecurityContext,
        instance_id: InstanceId,
    ) -> ComputeBackendResult<InstanceRecord>;

    /// Launches a new instance.
    async fn create(
        &self,
        ctx: &SecurityContext,
        request: &LaunchRequest,
    ) -> ComputeBackendResult<InstanceRecord>;

    /// Rebuilds an instance from another image.
    async fn rebuild(
        &self,
        ctx: &SecurityContext,
        instance_id: InstanceId,
        image: &ImageRef,
        admin_password: &str,
    ) -> ComputeBackendResult<()>;

    /// Looks up a flavor by name.
    ///
    /// # Errors
    ///
    /// Returns [`ComputeBackendError::FlavorNotFound`] when no flavor has
    /// the given name.
    async fn find_flavor(
        &self,
        ctx: &SecurityContext,
        name: &FlavorName,
    ) -> ComputeBackendResult<Flavor>;

    /// Starts resizing an instance to another flavor.
    async fn resize(
        &self,
        ctx: &SecurityContext,
        instance_id: InstanceId,
        flavor_id: &str,
    ) -> ComputeBackendResult<()>;

    /// Confirms a pending resize.
    async fn confirm_resize(
        &self,
        ctx: &SecurityContext,
        instance_id: InstanceId,
    ) -> ComputeBackendResult<()>;

    /// Reverts a pending resize.
    async fn revert_resize(
        &self,
        ctx: &SecurityContext,
        instance_id: InstanceId,
    ) -> ComputeBackendResult<()>;

    /// Deletes an instance immediately.
    async fn delete(&self, ctx: &SecurityContext, instance_id: InstanceId)
    -> ComputeBackendResult<()>;

    /// Marks an instance for deferred reclamation.
    async fn soft_delete(
        &self,
        ctx: &SecurityContext,
        instance_id: InstanceId,
    ) -> ComputeBackendResult<()>;

    /// Pauses an instance in memory.
    async fn pause(&self, ctx: &SecurityContext, instance_id: InstanceId)
    -> ComputeBackendResult<()>;

    /// Unpauses a paused instance.
    async fn unpause(
        &self,
        ctx: &SecurityContext,
        instance_id: InstanceId,
    ) -> ComputeBackendResult<()>;

    /// Suspends an instance to disk.
    async fn suspend(
        &self,
        ctx: &SecurityContext,
        instance_id: InstanceId,
    ) -> ComputeBackendResult<()>;

    /// Resumes a suspended instance.
    async fn resume(
        &self,
        ctx: &SecurityContext,
        instance_id: InstanceId,
    ) -> ComputeBackendResult<()>;

    /// Snapshots an instance into a new image.
    async fn snapshot(
        &self,
        ctx: &SecurityContext,
        instance_id: InstanceId,
        image_name: &str,
    ) -> ComputeBackendResult<ImageRef>;

    /// Reboots an instance.
    async fn reboot(
        &self,
        ctx: &SecurityContext,
        instance_id: InstanceId,
        reboot_type: RebootType,
    ) -> ComputeBackendResult<()>;

    /// Sets the admin password of an instance.
    async fn set_admin_password(
        &self,
        ctx: &SecurityContext,
        instance_id: InstanceId,
        password: &str,
    ) -> ComputeBackendResult<()>;

    /// Returns VNC console connection details.
    ///
    /// # Errors
    ///
    /// Returns [`ComputeBackendError::ConsoleUnavailable`] when the console
    /// is not ready yet.
    async fn vnc_console(
        &self,
        ctx: &SecurityContext,
        instance_id: InstanceId,
    ) -> ComputeBackendResult<Console>;

    /// Fetches a volume.
    ///
    /// # Errors
    ///
    /// Returns [`ComputeBackendError::VolumeNotFound`] when the volume does
    /// not exist in the caller's project.
    async fn get_volume(
        &self,
        ctx: &SecurityContext,
        volume_id: VolumeId,
    ) -> ComputeBackendResult<VolumeRecord>;

    /// Attaches a volume to an instance under a guest device name.
    ///
    /// # Errors
    ///
    /// Returns [`ComputeBackendError::VolumeInUse`] when the volume is
    /// already attached.
    async fn attach_volume(
        &self,
        ctx: &SecurityContext,
        instance_id: InstanceId,
        volume_id: VolumeId,
        device: &DeviceName,
    ) -> ComputeBackendResult<()>;

    /// Detaches a volume from whichever instance holds it.
    async fn detach_volume(
        &self,
        ctx: &SecurityContext,
        volume_id: VolumeId,
    ) -> ComputeBackendResult<()>;
}

/// Errors returned by compute backend implementations.
#[derive(Debug, Clone, Error)]
pub enum ComputeBackendError {
    /// The instance does not exist.
    #[error("instance not found: {0}")]
    InstanceNotFound(InstanceId),

    /// The volume does not exist.
    #[error("volume not found: {0}")]
    VolumeNotFound(VolumeId),

    /// The image does not exist.
    #[error("image not found: {0}")]
    ImageNotFound(ImageRef),

    /// The flavor does not exist.
    #[error("flavor not found: {0}")]
    FlavorNotFound(FlavorName),

    /// The instance's current state does not allow the operation.
    #[error("instance {instance_id} is in an invalid state for this operation: {state}")]
    InvalidInstanceState {
        /// Instance identifier.
        instance_id: InstanceId,
        /// Raw lifecycle tag at the time of the call.
        state: String,
    },

    /// A resize was requested to the flavor the instance already runs with.
    #[error("instance {0} cannot be resized to its current flavor")]
    CannotResizeToSameSize(InstanceId),

    /// No pending resize migration exists for the instance.
    #[error("instance {0} has not been resized")]
    MigrationNotFound(InstanceId),

    /// The volume is already attached elsewhere.
    #[error("volume {0} is already in use")]
    VolumeInUse(VolumeId),

    /// The console is not available yet.
    #[error("console for instance {0} is not available")]
    ConsoleUnavailable(InstanceId),

    /// Generic backend failure.
    #[error("compute backend error: {0}")]
    Runtime(Arc<dyn std::error::Error + Send + Sync>),
}

impl ComputeBackendError {
    /// Wraps a runtime error from the backend adapter.
    pub fn runtime(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Runtime(Arc::new(err))
    }
}
