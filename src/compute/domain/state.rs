//! Normalized OCCI compute states.

use super::ParseNormalizedStateError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Three-valued compute state exposed to OCCI consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizedState {
    /// Instance can service network requests.
    Active,
    /// Instance cannot service requests.
    Inactive,
    /// Instance is frozen, for example paused or suspended.
    Suspended,
}

impl NormalizedState {
    /// Returns the OCCI `occi.compute.state` value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Suspended => "suspended",
        }
    }
}

impl fmt::Display for NormalizedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for NormalizedState {
    type Error = ParseNormalizedStateError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "suspended" => Ok(Self::Suspended),
            _ => Err(ParseNormalizedStateError(value.to_owned())),
        }
    }
}
