//! Adapter implementations for compute backend and password ports.

pub mod memory;

mod password;

pub use password::RandomPasswordGenerator;
