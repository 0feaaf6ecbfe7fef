//! OCCI compute actions and permitted-action sets.

use super::ParseActionError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Category scheme of the standard OCCI infrastructure compute actions.
pub const OCCI_COMPUTE_ACTION_SCHEME: &str =
    "http://schemas.ogf.org/occi/infrastructure/compute/action#";

/// Category scheme of the OpenStack instance action extensions.
pub const OPENSTACK_ACTION_SCHEME: &str = "http://schemas.openstack.org/instance/action#";

/// Lifecycle operation that may be invoked on a compute resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Start, resume or unpause the instance.
    Start,
    /// Stop the instance.
    Stop,
    /// Suspend the instance.
    Suspend,
    /// Restart the instance.
    Restart,
    /// Confirm a pending resize.
    ConfirmResize,
    /// Revert a pending resize.
    RevertResize,
    /// Change the admin password.
    ChangePassword,
    /// Snapshot the instance into a new image.
    CreateImage,
}

impl Action {
    /// Every action in declaration order.
    pub const ALL: [Self; 8] = [
        Self::Start,
        Self::Stop,
        Self::Suspend,
        Self::Restart,
        Self::ConfirmResize,
        Self::RevertResize,
        Self::ChangePassword,
        Self::CreateImage,
    ];

    /// Returns the action identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Suspend => "suspend",
            Self::Restart => "restart",
            Self::ConfirmResize => "confirm_resize",
            Self::RevertResize => "revert_resize",
            Self::ChangePassword => "change_password",
            Self::CreateImage => "create_image",
        }
    }

    /// Returns the OCCI category term, which differs from the identifier
    /// only for [`Action::ChangePassword`].
    #[must_use]
    pub const fn term(self) -> &'static str {
        match self {
            Self::ChangePassword => "chg_pwd",
            _ => self.as_str(),
        }
    }

    /// Returns the category scheme the action belongs to.
    #[must_use]
    pub const fn scheme(self) -> &'static str {
        match self {
            Self::Start | Self::Stop | Self::Suspend | Self::Restart => OCCI_COMPUTE_ACTION_SCHEME,
            Self::ConfirmResize | Self::RevertResize | Self::ChangePassword | Self::CreateImage => {
                OPENSTACK_ACTION_SCHEME
            }
        }
    }

    /// Returns the full category identifier (scheme followed by term).
    #[must_use]
    pub fn category_id(self) -> String {
        format!("{}{}", self.scheme(), self.term())
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Action {
    type Error = ParseActionError;

    /// Accepts an identifier, a bare term, or a full category identifier.
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let trimmed = value.trim();
        let term = trimmed
            .strip_prefix(OCCI_COMPUTE_ACTION_SCHEME)
            .or_else(|| trimmed.strip_prefix(OPENSTACK_ACTION_SCHEME))
            .unwrap_or(trimmed)
            .to_ascii_lowercase();
        match term.as_str() {
            "start" => Ok(Self::Start),
            "stop" => Ok(Self::Stop),
            "suspend" => Ok(Self::Suspend),
            "restart" => Ok(Self::Restart),
            "confirm_resize" => Ok(Self::ConfirmResize),
            "revert_resize" => Ok(Self::RevertResize),
            "chg_pwd" | "change_password" => Ok(Self::ChangePassword),
            "create_image" => Ok(Self::CreateImage),
            _ => Err(ParseActionError(value.to_owned())),
        }
    }
}

/// Set of actions currently permitted on a compute resource.
///
/// Iteration order is stable and follows [`Action::ALL`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionSet(BTreeSet<Action>);

impl ActionSet {
    /// Creates an empty action set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(BTreeSet::new())
    }

    /// Returns whether the set permits the given action.
    #[must_use]
    pub fn contains(&self, action: Action) -> bool {
        self.0.contains(&action)
    }

    /// Returns whether no action is permitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of permitted actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over permitted actions.
    pub fn iter(&self) -> impl Iterator<Item = Action> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Action> for ActionSet {
    fn from_iter<I: IntoIterator<Item = Action>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<&[Action]> for ActionSet {
    fn from(actions: &[Action]) -> Self {
        actions.iter().copied().collect()
    }
}

impl fmt::Display for ActionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let terms: Vec<&str> = self.iter().map(Action::as_str).collect();
        write!(f, "{{{}}}", terms.join(", "))
    }
}
