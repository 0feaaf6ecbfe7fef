//! Admin password generation port.

/// Source of admin passwords for newly launched or rebuilt instances.
#[cfg_attr(test, mockall::automock)]
pub trait PasswordGenerator: Send + Sync {
    /// Returns a fresh password of exactly `length` characters.
    fn generate(&self, length: usize) -> String;
}
