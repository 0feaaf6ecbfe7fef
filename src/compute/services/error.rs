//! Transport-neutral error classification shared by the glue services.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of failure categories surfaced to the OCCI front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The referenced instance, volume or link endpoint does not exist.
    NotFound,
    /// The request itself is malformed or refers to unknown templates.
    InvalidInput,
    /// The resource's current lifecycle state does not allow the operation.
    InvalidState,
    /// The operation collides with another holder of the resource.
    Conflict,
    /// The compute backend failed unexpectedly.
    Backend,
}

impl ErrorKind {
    /// Returns the HTTP status code the front end should answer with.
    #[must_use]
    pub const fn status_code(self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::InvalidInput => 400,
            Self::InvalidState | Self::Conflict => 409,
            Self::Backend => 500,
        }
    }

    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::InvalidInput => "invalid_input",
            Self::InvalidState => "invalid_state",
            Self::Conflict => "conflict",
            Self::Backend => "backend",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
