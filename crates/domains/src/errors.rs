//! # DomainError
//!
//! Centralized error handling for the forum core.
//! Maps persistence and input failures to actionable error types.

use thiserror::Error;
use uuid::Uuid;

/// The primary error type for all forum operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Empty or malformed input (e.g., blank title). Never retried.
    #[error("validation error: {0}")]
    Validation(String),

    /// Referenced post, comment, reply or user does not exist.
    #[error("{entity} not found with ID {id}")]
    NotFound { entity: &'static str, id: Uuid },

    /// A second insert of the same like identity lost the race.
    /// Absorbed by the like ledger; callers never see it.
    #[error("duplicate like")]
    DuplicateLike,

    /// Connection pool exhausted; the caller may retry with backoff.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Unclassified persistence failure.
    #[error("storage error: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        DomainError::NotFound { entity, id }
    }

    /// Whether retrying the same call later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, DomainError::ResourceExhausted(_))
    }
}

/// A specialized Result type for forum logic.
pub type Result<T> = std::result::Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_exhaustion_is_transient() {
        assert!(DomainError::ResourceExhausted("pool".into()).is_transient());
        assert!(!DomainError::Validation("title".into()).is_transient());
        assert!(!DomainError::Storage("disk".into()).is_transient());
        assert!(!DomainError::not_found("post", Uuid::nil()).is_transient());
    }

    #[test]
    fn test_not_found_message_names_entity() {
        let err = DomainError::not_found("comment", Uuid::nil());
        assert_eq!(
            err.to_string(),
            "comment not found with ID 00000000-0000-0000-0000-000000000000"
        );
    }
}
