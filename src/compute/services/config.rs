//! Configuration for the compute glue services.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned while loading or validating [`GlueConfig`].
#[derive(Debug, Error)]
pub enum GlueConfigError {
    /// The configuration document could not be parsed.
    #[error("invalid glue configuration document: {0}")]
    Parse(#[from] serde_json::Error),

    /// Generated passwords must have at least one character.
    #[error("password_length must be greater than zero")]
    ZeroPasswordLength,

    /// The default flavor name is empty after trimming.
    #[error("default_flavor must not be empty")]
    EmptyDefaultFlavor,
}

/// Settings for the VM glue service.
///
/// Missing fields fall back to their defaults when deserializing.
///
/// # Examples
///
/// ```
/// use nova_occi::compute::services::GlueConfig;
///
/// let config = GlueConfig::default();
/// assert_eq!(config.password_length, 12);
/// assert!(!config.soft_deletes());
///
/// let parsed = GlueConfig::from_json_str(r#"{"reclaim_instance_interval_secs": 3600}"#)
///     .expect("valid configuration");
/// assert!(parsed.soft_deletes());
/// assert_eq!(parsed.default_flavor, "m1.small");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlueConfig {
    /// Length of generated admin passwords.
    pub password_length: usize,
    /// Seconds a deleted instance is kept for reclamation; `0` deletes
    /// immediately.
    pub reclaim_instance_interval_secs: u64,
    /// Flavor used when a request carries no resource template.
    pub default_flavor: String,
}

impl Default for GlueConfig {
    fn default() -> Self {
        Self {
            password_length: 12,
            reclaim_instance_interval_secs: 0,
            default_flavor: "m1.small".to_owned(),
        }
    }
}

impl GlueConfig {
    /// Creates a configuration that soft deletes instances and keeps them
    /// for `interval_secs` seconds.
    #[must_use]
    pub fn with_reclaim_interval(interval_secs: u64) -> Self {
        Self {
            reclaim_instance_interval_secs: interval_secs,
            ..Default::default()
        }
    }

    /// Parses and validates a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`GlueConfigError`] when the document is malformed or a value
    /// fails validation.
    pub fn from_json_str(document: &str) -> Result<Self, GlueConfigError> {
        let config: Self = serde_json::from_str(document)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value constraints.
    ///
    /// # Errors
    ///
    /// Returns [`GlueConfigError`] when a value is out of range.
    pub fn validate(&self) -> Result<(), GlueConfigError> {
        if self.password_length == 0 {
            return Err(GlueConfigError::ZeroPasswordLength);
        }
        if self.default_flavor.trim().is_empty() {
            return Err(GlueConfigError::EmptyDefaultFlavor);
        }
        Ok(())
    }

    /// Returns whether deletes are deferred for reclamation.
    #[must_use]
    pub const fn soft_deletes(&self) -> bool {
        self.reclaim_instance_interval_secs > 0
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
    fn empty_document_yields_defaults() {
        let config = GlueConfig::from_json_str("{}").expect("empty document is valid");

        assert_eq!(config, GlueConfig::default());
    }

    #[rstest]
    #[case(r#"{"password_length": 0}"#)]
    #[case(r#"{"default_flavor": "  "}"#)]
    fn invalid_values_are_rejected(#[case] document: &str) {
        let result = GlueConfig::from_json_str(document);

        assert!(matches!(
            result,
            Err(GlueConfigError::ZeroPasswordLength | GlueConfigError::EmptyDefaultFlavor)
        ));
    }

    #[rstest]
    fn malformed_document_is_a_parse_error() {
        let result = GlueConfig::from_json_str("{not json");

        assert!(matches!(result, Err(GlueConfigError::Parse(_))));
    }

    #[rstest]
    fn reclaim_interval_enables_soft_delete() {
        let config = GlueConfig::with_reclaim_interval(60);

        assert!(config.soft_deletes());
        assert_eq!(config.password_length, 12);
    }
}
