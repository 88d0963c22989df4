//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// missing records, stale writes, session checks). Storage concerns belong in
/// the infra crate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A required field was missing or malformed.
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. blank).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// The targeted record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A write was based on a stale snapshot.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The supplied credentials were rejected.
    #[error("authentication failed")]
    Auth,

    /// A two-factor verification code did not match.
    #[error("invalid verification code")]
    InvalidCode,
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}

/// Reject blank (empty or whitespace-only) required fields.
pub fn require_non_blank(field: &str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_are_rejected() {
        assert_eq!(
            require_non_blank("name", "   "),
            Err(DomainError::Validation("name is required".to_string()))
        );
        assert!(require_non_blank("name", "Alice").is_ok());
    }

    #[test]
    fn not_found_names_the_target() {
        let err = DomainError::not_found("user 42");
        assert_eq!(err.to_string(), "not found: user 42");
    }
}
