//! In-memory adapters for compute lifecycle tests and local runs.

mod backend;

pub use backend::InMemoryComputeBackend;
