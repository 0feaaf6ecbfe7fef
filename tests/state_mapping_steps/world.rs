//! Shared world state for OCCI state mapping BDD scenarios.

use std::sync::Arc;

use mockable::DefaultClock;
use nova_occi::compute::{
    adapters::{RandomPasswordGenerator, memory::InMemoryComputeBackend},
    domain::{Classification, InstanceId, SecurityContext, UnknownStateError},
    services::{ActionOutcome, VmService, VmServiceError},
};
use rstest::fixture;

/// Backend type used by the BDD world.
pub type TestBackend = InMemoryComputeBackend<DefaultClock>;

/// Service type used by the BDD world.
pub type TestVmService = VmService<TestBackend, RandomPasswordGenerator>;

/// Image seeded into the world's backend before launching a VM.
pub const BOOT_IMAGE: &str = "cirros-0.6";

/// Scenario world for state mapping behaviour tests.
pub struct StateMappingWorld {
    pub backend: Arc<TestBackend>,
    pub service: TestVmService,
    pub ctx: SecurityContext,
    pub pending_tag: Option<String>,
    pub frozen: bool,
    pub instance_id: Option<InstanceId>,
    pub last_classification: Option<Result<Classification, UnknownStateError>>,
    pub last_trigger_result: Option<Result<ActionOutcome, VmServiceError>>,
}

impl StateMappingWorld {
    /// Creates a world with an empty backend and scenario state.
    #[must_use]
    pub fn new() -> Self {
        let backend = Arc::new(InMemoryComputeBackend::new(Arc::new(DefaultClock)));
        let service = VmService::with_default_config(
            Arc::clone(&backend),
            Arc::new(RandomPasswordGenerator::new()),
        );

        Self {
            backend,
            service,
            ctx: SecurityContext::new("alice", "project-a"),
            pending_tag: None,
            frozen: false,
            instance_id: None,
            last_classification: None,
            last_trigger_result: None,
        }
    }

    /// Returns the VM created by the scenario.
    ///
    /// # Errors
    ///
    /// Returns an error when no VM has been created yet.
    pub fn instance_id(&self) -> Result<InstanceId, eyre::Report> {
        self.instance_id
            .ok_or_else(|| eyre::eyre!("missing VM in scenario world"))
    }
}

impl Default for StateMappingWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> StateMappingWorld {
    StateMappingWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
