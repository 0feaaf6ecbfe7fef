//! Error types for compute domain validation and state classification.

use thiserror::Error;

/// Errors returned while extracting or validating compute domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ComputeDomainError {
    /// A mixin requires an attribute that the entity does not carry.
    #[error("missing required attribute '{0}'")]
    MissingAttribute(&'static str),

    /// An attribute value could not be interpreted.
    #[error("invalid value '{value}' for attribute '{attribute}'")]
    InvalidAttribute {
        /// Attribute name.
        attribute: &'static str,
        /// Rejected value.
        value: String,
    },

    /// The entity does not carry an OS template mixin.
    #[error("no OS template mixin was found in the request")]
    MissingOsTemplate,

    /// More than one template of the same family was supplied.
    #[error("expected at most one {family} template, found {count}")]
    DuplicateTemplate {
        /// Template family (`resource` or `os`).
        family: &'static str,
        /// Number of templates supplied.
        count: usize,
    },

    /// A flavor name is empty after trimming.
    #[error("flavor name must not be empty")]
    EmptyFlavorName,

    /// An image reference is empty after trimming.
    #[error("image reference must not be empty")]
    EmptyImageRef,

    /// A snapshot image name is empty after trimming.
    #[error("image name must not be empty")]
    EmptyImageName,

    /// A device name for a volume attachment is empty after trimming.
    #[error("device name must not be empty")]
    EmptyDeviceName,

    /// An admin password is empty.
    #[error("admin password must not be empty")]
    EmptyPassword,

    /// The restart method is not one of `graceful`, `warm`, or `cold`.
    #[error("unknown restart method: {0}")]
    UnknownRestartMethod(String),
}

/// Error returned when a lifecycle tag falls outside the known domain, or
/// when no classification rule covers a lifecycle state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown lifecycle state: {0}")]
pub struct UnknownStateError(pub String);

/// Error returned while parsing normalized OCCI states.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown OCCI state: {0}")]
pub struct ParseNormalizedStateError(pub String);

/// Error returned while parsing action identifiers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown action: {0}")]
pub struct ParseActionError(pub String);
