//! Error types for storage link resolution.

use crate::compute::domain::ComputeDomainError;
use thiserror::Error;

/// Errors returned while resolving a storage link request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageLinkDomainError {
    /// Neither end of the link is a compute resource.
    #[error("id of the VM not found in link endpoints")]
    InstanceEndpointMissing,

    /// Neither end of the link is a storage resource.
    #[error("id of the volume not found in link endpoints")]
    VolumeEndpointMissing,

    /// A required link attribute is missing.
    #[error("missing required attribute '{0}'")]
    MissingAttribute(&'static str),

    /// The device attribute is not a usable device name.
    #[error(transparent)]
    InvalidDevice(#[from] ComputeDomainError),
}
