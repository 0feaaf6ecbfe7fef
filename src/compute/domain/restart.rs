//! OCCI restart methods and backend reboot types.

use super::ComputeDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Restart method requested through the OCCI `restart` action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestartMethod {
    /// Orderly restart through the guest.
    Graceful,
    /// Warm restart.
    Warm,
    /// Power-cycle restart.
    Cold,
}

impl RestartMethod {
    /// Returns the OCCI method name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Graceful => "graceful",
            Self::Warm => "warm",
            Self::Cold => "cold",
        }
    }

    /// Returns the backend reboot type implementing this method.
    #[must_use]
    pub const fn reboot_type(self) -> RebootType {
        match self {
            Self::Graceful | Self::Warm => RebootType::Soft,
            Self::Cold => RebootType::Hard,
        }
    }
}

impl fmt::Display for RestartMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for RestartMethod {
    type Error = ComputeDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "graceful" => Ok(Self::Graceful),
            "warm" => Ok(Self::Warm),
            "cold" => Ok(Self::Cold),
            _ => Err(ComputeDomainError::UnknownRestartMethod(value.to_owned())),
        }
    }
}

/// Reboot flavour understood by the compute backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RebootType {
    /// Guest-initiated reboot.
    Soft,
    /// Hypervisor-level reset.
    Hard,
}

impl RebootType {
    /// Returns the backend representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Soft => "SOFT",
            Self::Hard => "HARD",
        }
    }
}

impl fmt::Display for RebootType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
