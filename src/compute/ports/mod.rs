//! Port contracts for compute lifecycle orchestration.

mod backend;
mod password;

#[cfg(test)]
pub(crate) use backend::MockComputeBackend;
pub use backend::{ComputeBackend, ComputeBackendError, ComputeBackendResult};
#[cfg(test)]
pub(crate) use password::MockPasswordGenerator;
pub use password::PasswordGenerator;
