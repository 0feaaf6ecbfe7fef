//! Mapping from backend lifecycle tags to OCCI states and permitted actions.
//!
//! Classification is an ordered rule table evaluated top to bottom; the first
//! rule whose state group (and optional frozen requirement) matches decides
//! the outcome. `resize_confirming` is listed in two groups and resolves to
//! `active` through that ordering.

use super::{
    Action, ActionSet, LifecycleSnapshot, LifecycleState, NormalizedState, UnknownStateError,
};
use serde::{Deserialize, Serialize};

/// Actions available on a running instance.
const ACTIVE_ACTIONS: &[Action] = &[
    Action::Stop,
    Action::Suspend,
    Action::Restart,
    Action::ConfirmResize,
    Action::RevertResize,
    Action::ChangePassword,
    Action::CreateImage,
];

const START_ONLY: &[Action] = &[Action::Start];

const NO_ACTIONS: &[Action] = &[];

/// Which values of the frozen sub-flag a rule accepts.
#[derive(Debug, Clone, Copy)]
enum FrozenGuard {
    Any,
    Frozen,
    Thawed,
}

impl FrozenGuard {
    const fn admits(self, frozen: bool) -> bool {
        match self {
            Self::Any => true,
            Self::Frozen => frozen,
            Self::Thawed => !frozen,
        }
    }
}

#[derive(Debug)]
struct Rule {
    states: &'static [LifecycleState],
    guard: FrozenGuard,
    outcome: NormalizedState,
    actions: &'static [Action],
}

impl Rule {
    fn matches(&self, snapshot: LifecycleSnapshot) -> bool {
        self.guard.admits(snapshot.is_frozen()) && self.states.contains(&snapshot.state())
    }
}

const RULES: &[Rule] = &[
    Rule {
        states: &[
            LifecycleState::Active,
            LifecycleState::UpdatingPassword,
            LifecycleState::ResizeConfirming,
        ],
        guard: FrozenGuard::Any,
        outcome: NormalizedState::Active,
        actions: ACTIVE_ACTIONS,
    },
    Rule {
        states: &[
            LifecycleState::Starting,
            LifecycleState::PoweringOn,
            LifecycleState::Rebooting,
            LifecycleState::RebootingHard,
        ],
        guard: FrozenGuard::Any,
        outcome: NormalizedState::Inactive,
        actions: NO_ACTIONS,
    },
    Rule {
        states: &[LifecycleState::Stopping, LifecycleState::PoweringOff],
        guard: FrozenGuard::Any,
        outcome: NormalizedState::Inactive,
        actions: START_ONLY,
    },
    Rule {
        states: &[
            LifecycleState::Resuming,
            LifecycleState::Pausing,
            LifecycleState::Suspending,
        ],
        guard: FrozenGuard::Frozen,
        outcome: NormalizedState::Suspended,
        actions: START_ONLY,
    },
    Rule {
        states: &[
            LifecycleState::Resuming,
            LifecycleState::Pausing,
            LifecycleState::Suspending,
        ],
        guard: FrozenGuard::Thawed,
        outcome: NormalizedState::Suspended,
        actions: NO_ACTIONS,
    },
    Rule {
        states: &[LifecycleState::Paused, LifecycleState::Suspended],
        guard: FrozenGuard::Any,
        outcome: NormalizedState::Suspended,
        actions: START_ONLY,
    },
    Rule {
        states: &[
            LifecycleState::Resized,
            LifecycleState::Building,
            LifecycleState::ResizeConfirming,
            LifecycleState::ResizeFinish,
            LifecycleState::ResizeMigrated,
            LifecycleState::ResizeMigrating,
            LifecycleState::ResizePrep,
            LifecycleState::ResizeReverting,
        ],
        guard: FrozenGuard::Any,
        outcome: NormalizedState::Inactive,
        actions: NO_ACTIONS,
    },
];

/// Normalized state together with the actions permitted in it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Classification {
    state: NormalizedState,
    actions: ActionSet,
}

impl Classification {
    /// Creates a classification.
    #[must_use]
    pub const fn new(state: NormalizedState, actions: ActionSet) -> Self {
        Self { state, actions }
    }

    /// Returns the normalized OCCI state.
    #[must_use]
    pub const fn state(&self) -> NormalizedState {
        self.state
    }

    /// Returns the permitted actions.
    #[must_use]
    pub const fn actions(&self) -> &ActionSet {
        &self.actions
    }

    /// Returns whether the action may be invoked in this state.
    #[must_use]
    pub fn permits(&self, action: Action) -> bool {
        self.actions.contains(action)
    }

    /// Splits the classification into its parts.
    #[must_use]
    pub fn into_parts(self) -> (NormalizedState, ActionSet) {
        (self.state, self.actions)
    }
}

/// Stateless classifier from backend lifecycle snapshots to OCCI states.
///
/// # Examples
///
/// ```
/// use nova_occi::compute::domain::{Action, NormalizedState, StateMapper};
///
/// let classification = StateMapper::classify_tag("powering_off", false)
///     .expect("known lifecycle tag");
/// assert_eq!(classification.state(), NormalizedState::Inactive);
/// assert!(classification.permits(Action::Start));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct StateMapper;

impl StateMapper {
    /// Classifies a lifecycle snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownStateError`] when no rule covers the snapshot.
    pub fn classify(snapshot: LifecycleSnapshot) -> Result<Classification, UnknownStateError> {
        RULES
            .iter()
            .find(|rule| rule.matches(snapshot))
            .map(|rule| Classification::new(rule.outcome, ActionSet::from(rule.actions)))
            .ok_or_else(|| UnknownStateError(snapshot.state().as_str().to_owned()))
    }

    /// Parses and classifies a raw backend tag.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownStateError`] when the tag is outside the known
    /// lifecycle domain.
    pub fn classify_tag(tag: &str, frozen: bool) -> Result<Classification, UnknownStateError> {
        Self::classify(LifecycleSnapshot::parse(tag, frozen)?)
    }
}
