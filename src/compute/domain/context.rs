//! Caller security context passed to every backend call.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tenancy and credentials under which a backend call is made.
///
/// The context is supplied by the caller on every operation; nothing in this
/// crate holds a process-wide connection or identity.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityContext {
    user_id: String,
    project_id: String,
    #[serde(skip_serializing, default)]
    auth_token: Option<String>,
    is_admin: bool,
}

impl SecurityContext {
    /// Creates a non-admin context for a user within a project.
    #[must_use]
    pub fn new(user_id: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            project_id: project_id.into(),
            auth_token: None,
            is_admin: false,
        }
    }

    /// Attaches an authentication token.
    #[must_use]
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Marks the context as carrying admin privileges.
    #[must_use]
    pub const fn with_admin(mut self, is_admin: bool) -> Self {
        self.is_admin = is_admin;
        self
    }

    /// Returns the user identifier.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Returns the project (tenant) identifier.
    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Returns the authentication token, if any.
    #[must_use]
    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    /// Returns whether the context carries admin privileges.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.is_admin
    }
}

// Tokens stay out of logs.
impl fmt::Debug for SecurityContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityContext")
            .field("user_id", &self.user_id)
            .field("project_id", &self.project_id)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .field("is_admin", &self.is_admin)
            .finish()
    }
}

#[cfg(test)]
#[expect(
    clippy::expect_used,
    reason = "Test code uses expect for assertion clarity"
)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn token_is_kept_out_of_debug_and_serialized_output() {
        let ctx = SecurityContext::new("alice", "project-a").with_auth_token("s3cr3t-token");

        let json = serde_json::to_string(&ctx).expect("context should serialize");

        assert!(!json.contains("s3cr3t-token"));
        assert!(!format!("{ctx:?}").contains("s3cr3t-token"));
        assert_eq!(ctx.auth_token(), Some("s3cr3t-token"));
    }

    #[rstest]
    fn token_is_accepted_when_deserializing() {
        let ctx: SecurityContext = serde_json::from_str(
            r#"{"user_id":"alice","project_id":"project-a","auth_token":"tok","is_admin":true}"#,
        )
        .expect("context should deserialize");

        assert_eq!(ctx.auth_token(), Some("tok"));
        assert!(ctx.is_admin());
    }
}
