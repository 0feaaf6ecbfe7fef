//! Backend lifecycle state tags for compute instances.

use super::UnknownStateError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw lifecycle tag reported by the compute backend.
///
/// The backend mixes coarse VM states (`active`, `paused`, `resized`) with
/// transitional task states (`powering_off`, `resize_prep`) in a single tag;
/// both families are represented here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum LifecycleState {
    /// Instance is running.
    Active,
    /// Instance is being built.
    Building,
    /// Instance is starting.
    Starting,
    /// Instance is powering on.
    PoweringOn,
    /// Instance is performing a soft reboot.
    Rebooting,
    /// Instance is performing a hard reboot.
    RebootingHard,
    /// Instance is stopping.
    Stopping,
    /// Instance is powering off.
    PoweringOff,
    /// Instance is resuming from suspension.
    Resuming,
    /// Instance is being paused.
    Pausing,
    /// Instance is being suspended.
    Suspending,
    /// Instance is paused.
    Paused,
    /// Instance is suspended.
    Suspended,
    /// Instance has been resized and awaits confirmation.
    Resized,
    /// Resize confirmation is in progress.
    ResizeConfirming,
    /// Resize is finishing on the destination host.
    ResizeFinish,
    /// Resize migration has completed.
    ResizeMigrated,
    /// Resize migration is in progress.
    ResizeMigrating,
    /// Resize is being prepared.
    ResizePrep,
    /// Resize is being reverted.
    ResizeReverting,
    /// Admin password is being updated.
    UpdatingPassword,
}

impl LifecycleState {
    /// Every lifecycle state in declaration order.
    pub const ALL: [Self; 21] = [
        Self::Active,
        Self::Building,
        Self::Starting,
        Self::PoweringOn,
        Self::Rebooting,
        Self::RebootingHard,
        Self::Stopping,
        Self::PoweringOff,
        Self::Resuming,
        Self::Pausing,
        Self::Suspending,
        Self::Paused,
        Self::Suspended,
        Self::Resized,
        Self::ResizeConfirming,
        Self::ResizeFinish,
        Self::ResizeMigrated,
        Self::ResizeMigrating,
        Self::ResizePrep,
        Self::ResizeReverting,
        Self::UpdatingPassword,
    ];

    /// Returns the canonical backend tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Building => "building",
            Self::Starting => "starting",
            Self::PoweringOn => "powering_on",
            Self::Rebooting => "rebooting",
            Self::RebootingHard => "rebooting_hard",
            Self::Stopping => "stopping",
            Self::PoweringOff => "powering_off",
            Self::Resuming => "resuming",
            Self::Pausing => "pausing",
            Self::Suspending => "suspending",
            Self::Paused => "paused",
            Self::Suspended => "suspended",
            Self::Resized => "resized",
            Self::ResizeConfirming => "resize_confirming",
            Self::ResizeFinish => "resize_finish",
            Self::ResizeMigrated => "resize_migrated",
            Self::ResizeMigrating => "resize_migrating",
            Self::ResizePrep => "resize_prep",
            Self::ResizeReverting => "resize_reverting",
            Self::UpdatingPassword => "updating_password",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for LifecycleState {
    type Error = UnknownStateError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "active" => Ok(Self::Active),
            "building" => Ok(Self::Building),
            "starting" => Ok(Self::Starting),
            "powering_on" => Ok(Self::PoweringOn),
            "rebooting" => Ok(Self::Rebooting),
            "rebooting_hard" => Ok(Self::RebootingHard),
            "stopping" => Ok(Self::Stopping),
            "powering_off" => Ok(Self::PoweringOff),
            "resuming" => Ok(Self::Resuming),
            "pausing" => Ok(Self::Pausing),
            "suspending" => Ok(Self::Suspending),
            "paused" => Ok(Self::Paused),
            "suspended" => Ok(Self::Suspended),
            "resized" => Ok(Self::Resized),
            "resize_confirming" => Ok(Self::ResizeConfirming),
            "resize_finish" | "resize_finishing" => Ok(Self::ResizeFinish),
            "resize_migrated" => Ok(Self::ResizeMigrated),
            "resize_migrating" => Ok(Self::ResizeMigrating),
            "resize_prep" => Ok(Self::ResizePrep),
            "resize_reverting" => Ok(Self::ResizeReverting),
            "updating_password" => Ok(Self::UpdatingPassword),
            _ => Err(UnknownStateError(value.to_owned())),
        }
    }
}

impl TryFrom<String> for LifecycleState {
    type Error = UnknownStateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

/// Point-in-time lifecycle observation of a single instance.
///
/// `frozen` is set when the underlying instance is paused or suspended
/// while a transitional tag (`resuming`, `pausing`, `suspending`) is being
/// reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LifecycleSnapshot {
    state: LifecycleState,
    frozen: bool,
}

impl LifecycleSnapshot {
    /// Creates a snapshot for a state whose underlying instance is not
    /// frozen.
    #[must_use]
    pub const fn new(state: LifecycleState) -> Self {
        Self {
            state,
            frozen: false,
        }
    }

    /// Sets the paused/suspended sub-flag.
    #[must_use]
    pub const fn with_frozen(mut self, frozen: bool) -> Self {
        self.frozen = frozen;
        self
    }

    /// Parses a raw backend tag into a snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownStateError`] when the tag is not a known lifecycle
    /// state.
    pub fn parse(tag: &str, frozen: bool) -> Result<Self, UnknownStateError> {
        let state = LifecycleState::try_from(tag)?;
        Ok(Self::new(state).with_frozen(frozen))
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub const fn state(&self) -> LifecycleState {
        self.state
    }

    /// Returns whether the underlying instance is paused or suspended.
    #[must_use]
    pub const fn is_frozen(&self) -> bool {
        self.frozen
    }
}
