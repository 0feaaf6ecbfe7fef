//! Service layer translating OCCI compute operations into backend calls.

use super::{ErrorKind, GlueConfig, GlueConfigError};
use crate::compute::{
    domain::{
        Action, Classification, ComputeDomainError, ComputeEntity, Console, DeviceName, FlavorName,
        ImageRef, InstanceId, InstanceRecord, LaunchSpec, LifecycleState, NormalizedState,
        RestartMethod, SecurityContext, UnknownStateError, VolumeId,
    },
    ports::{ComputeBackend, ComputeBackendError, PasswordGenerator},
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Service-level errors for VM operations.
#[derive(Debug, Error)]
pub enum VmServiceError {
    /// Request validation failed.
    #[error(transparent)]
    Domain(#[from] ComputeDomainError),
    /// The backend reported a lifecycle tag that cannot be classified.
    #[error(transparent)]
    UnknownState(#[from] UnknownStateError),
    /// Backend operation failed.
    #[error(transparent)]
    Backend(#[from] ComputeBackendError),
    /// The action is not in the instance's permitted action set.
    #[error("action {action} is not permitted on instance {instance_id} while it is {state}")]
    ActionNotPermitted {
        /// Instance identifier.
        instance_id: InstanceId,
        /// Refused action.
        action: Action,
        /// Normalized state at the time of the request.
        state: NormalizedState,
    },
}

impl VmServiceError {
    /// Returns the failure category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(_) => ErrorKind::InvalidInput,
            Self::UnknownState(_) | Self::ActionNotPermitted { .. } => ErrorKind::InvalidState,
            Self::Backend(err) => backend_error_kind(err),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        self.kind().status_code()
    }
}

/// Categorizes a backend failure.
#[must_use]
pub const fn backend_error_kind(err: &ComputeBackendError) -> ErrorKind {
    match err {
        ComputeBackendError::InstanceNotFound(_) | ComputeBackendError::VolumeNotFound(_) => {
            ErrorKind::NotFound
        }
        ComputeBackendError::ImageNotFound(_)
        | ComputeBackendError::FlavorNotFound(_)
        | ComputeBackendError::CannotResizeToSameSize(_)
        | ComputeBackendError::MigrationNotFound(_) => ErrorKind::InvalidInput,
        ComputeBackendError::InvalidInstanceState { .. }
        | ComputeBackendError::ConsoleUnavailable(_) => ErrorKind::InvalidState,
        ComputeBackendError::VolumeInUse(_) => ErrorKind::Conflict,
        ComputeBackendError::Runtime(_) => ErrorKind::Backend,
    }
}

/// Result type for VM service operations.
pub type VmServiceResult<T> = Result<T, VmServiceError>;

/// Action invocation with its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionRequest {
    /// Resume or unpause.
    Start,
    /// Stop (suspend to disk).
    Stop,
    /// Suspend (pause in memory).
    Suspend,
    /// Restart with the given method.
    Restart(RestartMethod),
    /// Confirm a pending resize.
    ConfirmResize,
    /// Revert a pending resize.
    RevertResize,
    /// Set a new admin password.
    ChangePassword(String),
    /// Snapshot into an image with the given name.
    CreateImage(String),
}

impl ActionRequest {
    /// Returns the action being requested.
    #[must_use]
    pub const fn action(&self) -> Action {
        match self {
            Self::Start => Action::Start,
            Self::Stop => Action::Stop,
            Self::Suspend => Action::Suspend,
            Self::Restart(_) => Action::Restart,
            Self::ConfirmResize => Action::ConfirmResize,
            Self::RevertResize => Action::RevertResize,
            Self::ChangePassword(_) => Action::ChangePassword,
            Self::CreateImage(_) => Action::CreateImage,
        }
    }
}

/// Result of a triggered action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The backend accepted the action.
    Accepted,
    /// A snapshot image was created.
    ImageCreated(ImageRef),
}

/// VM lifecycle glue service.
#[derive(Clone)]
pub struct VmService<B, P>
where
    B: ComputeBackend,
    P: PasswordGenerator,
{
    backend: Arc<B>,
    passwords: Arc<P>,
    config: GlueConfig,
}

impl<B, P> VmService<B, P>
where
    B: ComputeBackend,
    P: PasswordGenerator,
{
    /// Creates a new VM service.
    ///
    /// # Errors
    ///
    /// Returns [`GlueConfigError`] when `config` fails validation.
    pub fn new(
        backend: Arc<B>,
        passwords: Arc<P>,
        config: GlueConfig,
    ) -> Result<Self, GlueConfigError> {
        config.validate()?;
        Ok(Self {
            backend,
            passwords,
            config,
        })
    }

    /// Creates a VM service with [`GlueConfig::default`].
    #[must_use]
    pub fn with_default_config(backend: Arc<B>, passwords: Arc<P>) -> Self {
        Self {
            backend,
            passwords,
            config: GlueConfig::default(),
        }
    }

    /// Returns the service configuration.
    #[must_use]
    pub const fn config(&self) -> &GlueConfig {
        &self.config
    }

    /// Returns the backend the service talks to.
    #[must_use]
    pub const fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    fn generate_password(&self) -> String {
        self.passwords.generate(self.config.password_length)
    }

    fn default_flavor(&self) -> VmServiceResult<FlavorName> {
        warn!(
            default_flavor = %self.config.default_flavor,
            "no resource template in request, using the default flavor"
        );
        Ok(FlavorName::new(self.config.default_flavor.as_str())?)
    }

    /// Fetches an instance record.
    ///
    /// # Errors
    ///
    /// Returns [`VmServiceError::Backend`] with
    /// [`ComputeBackendError::InstanceNotFound`] when the instance does not
    /// exist.
    pub async fn instance(
        &self,
        ctx: &SecurityContext,
        instance_id: InstanceId,
    ) -> VmServiceResult<InstanceRecord> {
        Ok(self.backend.get(ctx, instance_id).await?)
    }

    /// Launches a VM for an OCCI compute entity.
    ///
    /// # Errors
    ///
    /// Returns domain errors when extraction fails and backend errors when
    /// the flavor is unknown or the launch is rejected.
    pub async fn create(
        &self,
        ctx: &SecurityContext,
        entity: &ComputeEntity,
    ) -> VmServiceResult<InstanceRecord> {
        let spec = LaunchSpec::from_entity(entity)?;
        let flavor_name = spec
            .flavor()
            .cloned()
            .map_or_else(|| self.default_flavor(), Ok)?;
        let flavor = self.backend.find_flavor(ctx, &flavor_name).await?;
        let request = spec.into_request(flavor, || self.generate_password());

        let instance = self.backend.create(ctx, &request).await?;
        info!(
            instance_id = %instance.id,
            flavor = %instance.flavor.name,
            image = %instance.image,
            project_id = ctx.project_id(),
            "created VM"
        );
        Ok(instance)
    }

    /// Rebuilds a VM from another image with a freshly generated password.
    ///
    /// # Errors
    ///
    /// Returns backend errors when the instance or image does not exist or
    /// the instance is in an invalid state.
    pub async fn rebuild(
        &self,
        ctx: &SecurityContext,
        instance_id: InstanceId,
        image: &ImageRef,
    ) -> VmServiceResult<()> {
        let admin_password = self.generate_password();
        self.backend
            .rebuild(ctx, instance_id, image, &admin_password)
            .await?;
        info!(%instance_id, %image, "rebuilding VM");
        Ok(())
    }

    /// Resizes a VM to the named flavor.
    ///
    /// # Errors
    ///
    /// Returns domain errors for an empty flavor name and backend errors
    /// when the flavor is unknown, unchanged, or the instance is in an
    /// invalid state.
    pub async fn resize(
        &self,
        ctx: &SecurityContext,
        instance_id: InstanceId,
        flavor_name: &str,
    ) -> VmServiceResult<()> {
        let name = FlavorName::new(flavor_name)?;
        let flavor = self.backend.find_flavor(ctx, &name).await?;
        self.backend.resize(ctx, instance_id, &flavor.id).await?;
        info!(%instance_id, flavor = %flavor.name, "resizing VM");
        Ok(())
    }

    /// Deletes a VM, deferring reclamation when configured to.
    ///
    /// # Errors
    ///
    /// Returns backend errors when the instance does not exist.
    pub async fn delete(&self, ctx: &SecurityContext, instance_id: InstanceId) -> VmServiceResult<()> {
        if self.config.soft_deletes() {
            self.backend.soft_delete(ctx, instance_id).await?;
            info!(
                %instance_id,
                reclaim_after_secs = self.config.reclaim_instance_interval_secs,
                "soft deleted VM"
            );
        } else {
            self.backend.delete(ctx, instance_id).await?;
            info!(%instance_id, "deleted VM");
        }
        Ok(())
    }

    /// Suspends a VM by pausing it; [`VmService::start`] undoes this.
    ///
    /// # Errors
    ///
    /// Returns backend errors when the instance does not exist or cannot be
    /// paused.
    pub async fn suspend(
        &self,
        ctx: &SecurityContext,
        instance_id: InstanceId,
    ) -> VmServiceResult<()> {
        self.backend.pause(ctx, instance_id).await?;
        debug!(%instance_id, "paused VM");
        Ok(())
    }

    /// Stops a VM by suspending it to disk.
    ///
    /// # Errors
    ///
    /// Returns backend errors when the instance does not exist or cannot be
    /// suspended.
    pub async fn stop(&self, ctx: &SecurityContext, instance_id: InstanceId) -> VmServiceResult<()> {
        self.backend.suspend(ctx, instance_id).await?;
        debug!(%instance_id, "suspended VM");
        Ok(())
    }

    /// Starts a VM: unpauses a paused instance, resumes anything else.
    ///
    /// # Errors
    ///
    /// Returns an unknown-state error when the backend tag cannot be
    /// parsed, or backend errors when the instance cannot be started.
    pub async fn start(&self, ctx: &SecurityContext, instance_id: InstanceId) -> VmServiceResult<()> {
        let instance = self.instance(ctx, instance_id).await?;
        let lifecycle = instance.lifecycle()?;
        if matches!(
            lifecycle.state(),
            LifecycleState::Paused | LifecycleState::Pausing
        ) {
            self.backend.unpause(ctx, instance_id).await?;
            debug!(%instance_id, "unpaused VM");
        } else {
            self.backend.resume(ctx, instance_id).await?;
            debug!(%instance_id, "resumed VM");
        }
        Ok(())
    }

    /// Restarts a VM; `graceful` and `warm` map to a soft reboot, `cold` to
    /// a hard reboot.
    ///
    /// # Errors
    ///
    /// Returns backend errors when the instance does not exist or cannot be
    /// rebooted.
    pub async fn restart(
        &self,
        ctx: &SecurityContext,
        instance_id: InstanceId,
        method: RestartMethod,
    ) -> VmServiceResult<()> {
        let reboot_type = method.reboot_type();
        self.backend.reboot(ctx, instance_id, reboot_type).await?;
        info!(%instance_id, %method, %reboot_type, "rebooting VM");
        Ok(())
    }

    /// Snapshots a VM into a new image.
    ///
    /// # Errors
    ///
    /// Returns domain errors for an empty image name and backend errors
    /// when the instance does not exist or is in an invalid state.
    pub async fn snapshot(
        &self,
        ctx: &SecurityContext,
        instance_id: InstanceId,
        image_name: &str,
    ) -> VmServiceResult<ImageRef> {
        let name = image_name.trim();
        if name.is_empty() {
            return Err(ComputeDomainError::EmptyImageName.into());
        }
        let image = self.backend.snapshot(ctx, instance_id, name).await?;
        info!(%instance_id, %image, "created snapshot image");
        Ok(image)
    }

    /// Sets a new admin password.
    ///
    /// # Errors
    ///
    /// Returns domain errors for an empty password and backend errors when
    /// the instance does not exist or is in an invalid state.
    pub async fn set_password(
        &self,
        ctx: &SecurityContext,
        instance_id: InstanceId,
        password: &str,
    ) -> VmServiceResult<()> {
        if password.is_empty() {
            return Err(ComputeDomainError::EmptyPassword.into());
        }
        self.backend
            .set_admin_password(ctx, instance_id, password)
            .await?;
        debug!(%instance_id, "changed admin password");
        Ok(())
    }

    /// Returns VNC console details, or `None` while the console is not
    /// available.
    ///
    /// # Errors
    ///
    /// Returns backend errors when the instance does not exist.
    pub async fn vnc_console(
        &self,
        ctx: &SecurityContext,
        instance_id: InstanceId,
    ) -> VmServiceResult<Option<Console>> {
        self.instance(ctx, instance_id).await?;
        let console = self.backend.vnc_console(ctx, instance_id).await;
        Ok(console.map_or_else(
            |err| {
                warn!(%instance_id, error = %err, "console info is not available yet");
                None
            },
            Some,
        ))
    }

    /// Confirms a pending resize.
    ///
    /// # Errors
    ///
    /// Returns backend errors when the instance has not been resized or is
    /// in an invalid state.
    pub async fn confirm_resize(
        &self,
        ctx: &SecurityContext,
        instance_id: InstanceId,
    ) -> VmServiceResult<()> {
        self.backend.confirm_resize(ctx, instance_id).await?;
        info!(%instance_id, "confirmed resize");
        Ok(())
    }

    /// Reverts a pending resize.
    ///
    /// # Errors
    ///
    /// Returns backend errors when the instance has not been resized or is
    /// in an invalid state.
    pub async fn revert_resize(
        &self,
        ctx: &SecurityContext,
        instance_id: InstanceId,
    ) -> VmServiceResult<()> {
        self.backend.revert_resize(ctx, instance_id).await?;
        info!(%instance_id, "reverted resize");
        Ok(())
    }

    /// Attaches a volume to a VM.
    ///
    /// # Errors
    ///
    /// Returns backend errors when the instance or volume does not exist or
    /// the volume is already attached.
    pub async fn attach_volume(
        &self,
        ctx: &SecurityContext,
        instance_id: InstanceId,
        volume_id: VolumeId,
        device: &DeviceName,
    ) -> VmServiceResult<()> {
        self.instance(ctx, instance_id).await?;
        self.backend.get_volume(ctx, volume_id).await?;
        self.backend
            .attach_volume(ctx, instance_id, volume_id, device)
            .await?;
        info!(%instance_id, %volume_id, %device, "attached volume");
        Ok(())
    }

    /// Detaches a volume.
    ///
    /// # Errors
    ///
    /// Returns backend errors when the volume does not exist.
    pub async fn detach_volume(
        &self,
        ctx: &SecurityContext,
        volume_id: VolumeId,
    ) -> VmServiceResult<()> {
        self.backend.get_volume(ctx, volume_id).await?;
        self.backend.detach_volume(ctx, volume_id).await?;
        info!(%volume_id, "detached volume");
        Ok(())
    }

    /// Returns the OCCI state and permitted actions of a VM.
    ///
    /// # Errors
    ///
    /// Returns backend errors when the instance does not exist and
    /// [`VmServiceError::UnknownState`] when its lifecycle tag cannot be
    /// classified.
    pub async fn occi_state(
        &self,
        ctx: &SecurityContext,
        instance_id: InstanceId,
    ) -> VmServiceResult<Classification> {
        let instance = self.instance(ctx, instance_id).await?;
        Ok(instance.classify()?)
    }

    /// Invokes an action after checking it against the VM's permitted
    /// actions.
    ///
    /// # Errors
    ///
    /// Returns [`VmServiceError::ActionNotPermitted`] when the current state
    /// does not permit the action, otherwise the errors of the dispatched
    /// operation.
    pub async fn trigger(
        &self,
        ctx: &SecurityContext,
        instance_id: InstanceId,
        request: ActionRequest,
    ) -> VmServiceResult<ActionOutcome> {
        let classification = self.occi_state(ctx, instance_id).await?;
        let action = request.action();
        if !classification.permits(action) {
            warn!(
                %instance_id,
                %action,
                state = %classification.state(),
                "refusing action not permitted in current state"
            );
            return Err(VmServiceError::ActionNotPermitted {
                instance_id,
                action,
                state: classification.state(),
            });
        }

        match request {
            ActionRequest::Start => self.start(ctx, instance_id).await?,
            ActionRequest::Stop => self.stop(ctx, instance_id).await?,
            ActionRequest::Suspend => self.suspend(ctx, instance_id).await?,
            ActionRequest::Restart(method) => self.restart(ctx, instance_id, method).await?,
            ActionRequest::ConfirmResize => self.confirm_resize(ctx, instance_id).await?,
            ActionRequest::RevertResize => self.revert_resize(ctx, instance_id).await?,
            ActionRequest::ChangePassword(password) => {
                self.set_password(ctx, instance_id, &password).await?;
            }
            ActionRequest::CreateImage(image_name) => {
                let image = self.snapshot(ctx, instance_id, &image_name).await?;
                return Ok(ActionOutcome::ImageCreated(image));
            }
        }
        Ok(ActionOutcome::Accepted)
    }
}
