//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// guards). Infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. blank input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A lifecycle guard rejected the command (wrong status and/or actor).
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    /// The order is not in a state where checking can begin.
    #[error("not ready: {0}")]
    NotReady(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_transition(msg: impl Into<String>) -> Self {
        Self::InvalidTransition(msg.into())
    }

    pub fn not_ready(msg: impl Into<String>) -> Self {
        Self::NotReady(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    /// Whether this error is a guard rejection (the caller should re-fetch and decide).
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::InvalidTransition(_) | Self::NotReady(_))
    }
}
