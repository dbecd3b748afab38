//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// conflicts, missing targets). The `Display` output is the message shown to
/// the caller, so it must read as a complete sentence fragment on its own.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Malformed, missing or out-of-enumeration input.
    #[error("{0}")]
    Validation(String),

    /// A business rule blocked the operation (e.g. a pending submission exists).
    #[error("{0}")]
    Conflict(String),

    /// The targeted record does not exist.
    #[error("{0}")]
    NotFound(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_the_bare_message() {
        let err = DomainError::conflict("You already have a pending request");
        assert_eq!(err.to_string(), "You already have a pending request");

        let err = DomainError::invalid_id("UserId: bad");
        assert_eq!(err.to_string(), "invalid identifier: UserId: bad");
    }
}
