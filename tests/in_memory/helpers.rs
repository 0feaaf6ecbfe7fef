//! Shared test helpers for in-memory backend integration tests.

use std::sync::Arc;

use nova_occi::compute::{
    adapters::{RandomPasswordGenerator, memory::InMemoryComputeBackend},
    domain::{ATTR_HOSTNAME, ComputeEntity, Flavor, FlavorName, ImageRef, Mixin, SecurityContext},
    services::{GlueConfig, VmService},
};
use nova_occi::storage::services::StorageLinkService;
use mockable::DefaultClock;
use rstest::fixture;

/// Backend type used by the integration tests.
pub type TestBackend = InMemoryComputeBackend<DefaultClock>;

/// VM service type used by the integration tests.
pub type TestVmService = VmService<TestBackend, RandomPasswordGenerator>;

/// Storage link service type used by the integration tests.
pub type TestLinkService = StorageLinkService<TestBackend, RandomPasswordGenerator>;

/// Image every seeded cloud can boot from.
pub const BOOT_IMAGE: &str = "cirros-0.6";

/// Seeded backend together with the services built on it.
pub struct Cloud {
    pub backend: Arc<TestBackend>,
    pub vms: Arc<TestVmService>,
    pub links: TestLinkService,
}

impl Cloud {
    /// Creates a cloud with `m1.small`, `m1.medium` and a bootable image.
    ///
    /// # Errors
    ///
    /// Returns an error if seeding the backend fails or `config` is invalid.
    pub fn seeded(config: GlueConfig) -> Result<Self, eyre::Report> {
        let backend = Arc::new(InMemoryComputeBackend::new(Arc::new(DefaultClock)));
        backend.add_flavor(Flavor::new("1", FlavorName::new("m1.small")?))?;
        backend.add_flavor(Flavor::new("2", FlavorName::new("m1.medium")?))?;
        backend.add_image(ImageRef::new(BOOT_IMAGE)?)?;

        let vms = Arc::new(VmService::new(
            Arc::clone(&backend),
            Arc::new(RandomPasswordGenerator::new()),
            config,
        )?);
        let links = StorageLinkService::new(Arc::clone(&vms));
        Ok(Self {
            backend,
            vms,
            links,
        })
    }
}

/// Provides a seeded cloud with the default configuration.
///
/// # Errors
///
/// Returns an error if seeding the backend fails.
#[fixture]
pub fn seeded_cloud() -> Result<Cloud, eyre::Report> {
    Cloud::seeded(GlueConfig::default())
}

/// Provides a tenant security context.
#[fixture]
pub fn ctx() -> SecurityContext {
    SecurityContext::new("alice", "project-a").with_auth_token("token-a")
}

/// Builds a compute entity booting [`BOOT_IMAGE`] with the given flavor.
#[must_use]
pub fn compute_entity(hostname: &str, flavor: &str) -> ComputeEntity {
    ComputeEntity::new()
        .with_attribute(ATTR_HOSTNAME, hostname)
        .with_mixin(Mixin::ResourceTemplate {
            term: flavor.to_owned(),
        })
        .with_mixin(Mixin::OsTemplate {
            term: "cirros".to_owned(),
            os_id: BOOT_IMAGE.to_owned(),
        })
}
