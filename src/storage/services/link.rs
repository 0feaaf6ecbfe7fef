//! Service creating and removing storage links through the VM glue.

use crate::compute::{
    domain::SecurityContext,
    ports::{ComputeBackend, PasswordGenerator},
    services::{ErrorKind, VmService, VmServiceError},
};
use crate::storage::domain::{StorageLink, StorageLinkDomainError, StorageLinkRequest};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Service-level errors for storage link operations.
#[derive(Debug, Error)]
pub enum StorageLinkServiceError {
    /// The link request could not be resolved.
    #[error(transparent)]
    Domain(#[from] StorageLinkDomainError),
    /// The underlying VM operation failed.
    #[error(transparent)]
    Vm(#[from] VmServiceError),
}

impl StorageLinkServiceError {
    /// Returns the failure category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(_) => ErrorKind::InvalidInput,
            Self::Vm(err) => err.kind(),
        }
    }
}

/// Result type for storage link operations.
pub type StorageLinkServiceResult<T> = Result<T, StorageLinkServiceError>;

/// Storage link glue service.
#[derive(Clone)]
pub struct StorageLinkService<B, P>
where
    B: ComputeBackend,
    P: PasswordGenerator,
{
    vms: Arc<VmService<B, P>>,
}

impl<B, P> StorageLinkService<B, P>
where
    B: ComputeBackend,
    P: PasswordGenerator,
{
    /// Creates a storage link service on top of the VM glue.
    #[must_use]
    pub const fn new(vms: Arc<VmService<B, P>>) -> Self {
        Self { vms }
    }

    /// Attaches the linked volume to the linked instance.
    ///
    /// # Errors
    ///
    /// Returns [`StorageLinkServiceError::Domain`] when the request lacks a
    /// compute endpoint, a storage endpoint or a device, and
    /// [`StorageLinkServiceError::Vm`] when the attachment fails.
    pub async fn create(
        &self,
        ctx: &SecurityContext,
        request: &StorageLinkRequest,
    ) -> StorageLinkServiceResult<StorageLink> {
        let instance_id = request.instance_id()?;
        let volume_id = request.volume_id()?;
        let device = request.device()?;

        self.vms
            .attach_volume(ctx, instance_id, volume_id, &device)
            .await?;
        let link = StorageLink::attached(instance_id, volume_id, device);
        info!(link_id = %link.id(), %instance_id, %volume_id, "created storage link");
        Ok(link)
    }

    /// Detaches the linked volume.
    ///
    /// # Errors
    ///
    /// Returns [`StorageLinkServiceError::Domain`] when the request lacks a
    /// storage endpoint, and [`StorageLinkServiceError::Vm`] when the
    /// volume does not exist.
    pub async fn delete(
        &self,
        ctx: &SecurityContext,
        request: &StorageLinkRequest,
    ) -> StorageLinkServiceResult<()> {
        let volume_id = request.volume_id()?;
        self.vms.detach_volume(ctx, volume_id).await?;
        info!(%volume_id, "removed storage link");
        Ok(())
    }
}

#[cfg(test)]
#[expect(
    clippy::expect_used,
    reason = "Test code uses expect for assertion clarity"
)]
mod tests {
    use super::*;
    use crate::compute::{
        domain::{
            Flavor, FlavorName, ImageRef, InstanceId, InstanceRecord, VolumeId,
            VolumeRecord,
        },
        ports::{ComputeBackendError, MockComputeBackend, MockPasswordGenerator},
    };
    use crate::storage::domain::{EntityKind, LinkEndpoint};
    use chrono::Utc;
    use rstest::{fixture, rstest};
    use uuid::Uuid;

    #[fixture]
    fn ctx() -> SecurityContext {
        SecurityContext::new("alice", "project-a")
    }

    type TestService = StorageLinkService<MockComputeBackend, MockPasswordGenerator>;

    fn service(backend: MockComputeBackend) -> TestService {
        let vms =
            VmService::with_default_config(Arc::new(backend), Arc::new(MockPasswordGenerator::new()));
        StorageLinkService::new(Arc::new(vms))
    }

    fn instance(id: InstanceId) -> InstanceRecord {
        let now = Utc::now();
        InstanceRecord {
            id,
            display_name: None,
            flavor: Flavor::new("1", FlavorName::new("m1.small").expect("valid flavor")),
            image: ImageRef::new("cirros").expect("valid image"),
            state_tag: "active".to_owned(),
            frozen: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn volume(id: VolumeId) -> VolumeRecord {
        VolumeRecord {
            id,
            size_gb: 1,
            attachment: None,
        }
    }

    #[rstest]
    #[tokio::test]
    async fn create_attaches_volume_from_either_end(ctx: SecurityContext) {
        let instance_id = InstanceId::new();
        let volume_id = VolumeId::new();
        let mut backend = MockComputeBackend::new();
        backend.expect_get().returning(|_, id| Ok(instance(id)));
        backend.expect_get_volume().returning(|_, id| Ok(volume(id)));
        backend
            .expect_attach_volume()
            .withf(move |_, inst, vol, device| {
                *inst == instance_id && *vol == volume_id && device.as_str() == "/dev/vdc"
            })
            .times(1)
            .returning(|_, _, _, _| Ok(()));
        let request = StorageLinkRequest::new(
            LinkEndpoint::storage(volume_id),
            LinkEndpoint::compute(instance_id),
        )
        .with_device("/dev/vdc");

        let link = service(backend)
            .create(&ctx, &request)
            .await
            .expect("link should be created");

        assert_eq!(link.instance_id(), instance_id);
        assert_eq!(link.volume_id(), volume_id);
        assert_eq!(link.device().as_str(), "/dev/vdc");
    }

    #[rstest]
    #[tokio::test]
    async fn create_without_compute_endpoint_never_reaches_backend(ctx: SecurityContext) {
        let request = StorageLinkRequest::new(
            LinkEndpoint::new(EntityKind::Network, Uuid::new_v4()),
            LinkEndpoint::storage(VolumeId::new()),
        )
        .with_device("/dev/vdb");

        let err = service(MockComputeBackend::new())
            .create(&ctx, &request)
            .await
            .expect_err("request without instance must fail");

        assert!(matches!(
            err,
            StorageLinkServiceError::Domain(StorageLinkDomainError::InstanceEndpointMissing)
        ));
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[rstest]
    #[tokio::test]
    async fn create_with_attached_volume_is_a_conflict(ctx: SecurityContext) {
        let volume_id = VolumeId::new();
        let mut backend = MockComputeBackend::new();
        backend.expect_get().returning(|_, id| Ok(instance(id)));
        backend.expect_get_volume().returning(|_, id| Ok(volume(id)));
        backend
            .expect_attach_volume()
            .returning(move |_, _, _, _| Err(ComputeBackendError::VolumeInUse(volume_id)));
        let request = StorageLinkRequest::new(
            LinkEndpoint::compute(InstanceId::new()),
            LinkEndpoint::storage(volume_id),
        )
        .with_device("/dev/vdb");

        let err = service(backend)
            .create(&ctx, &request)
            .await
            .expect_err("attached volume must be refused");

        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[rstest]
    #[tokio::test]
    async fn delete_detaches_the_linked_volume(ctx: SecurityContext) {
        let volume_id = VolumeId::new();
        let mut backend = MockComputeBackend::new();
        backend.expect_get_volume().returning(|_, id| Ok(volume(id)));
        backend
            .expect_detach_volume()
            .withf(move |_, vol| *vol == volume_id)
            .times(1)
            .returning(|_, _| Ok(()));
        let request = StorageLinkRequest::new(
            LinkEndpoint::compute(InstanceId::new()),
            LinkEndpoint::storage(volume_id),
        );

        service(backend)
            .delete(&ctx, &request)
            .await
            .expect("link should be removed");
    }

    #[rstest]
    #[tokio::test]
    async fn delete_of_unknown_volume_is_not_found(ctx: SecurityContext) {
        let mut backend = MockComputeBackend::new();
        backend
            .expect_get_volume()
            .returning(|_, id| Err(ComputeBackendError::VolumeNotFound(id)));
        let request = StorageLinkRequest::new(
            LinkEndpoint::compute(InstanceId::new()),
            LinkEndpoint::storage(VolumeId::new()),
        );

        let err = service(backend)
            .delete(&ctx, &request)
            .await
            .expect_err("unknown volume must fail");

        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
