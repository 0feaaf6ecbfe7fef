//! Application services for OCCI compute operations.

mod config;
mod error;
mod vm;

pub use config::{GlueConfig, GlueConfigError};
pub use error::ErrorKind;
pub use vm::{
    ActionOutcome, ActionRequest, VmService, VmServiceError, VmServiceResult, backend_error_kind,
};
