//! Domain-specific error types following panic-free policy.

use thiserror::Error;

/// Errors that can occur in domain operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A nickname was empty after trimming
    #[error("Nickname must not be empty")]
    EmptyNickname,

    /// A nickname contained whitespace or control characters
    #[error("Invalid nickname: {value:?} (expected a single word without control characters)")]
    InvalidNickname { value: String },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
