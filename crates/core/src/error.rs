//! Domain error model.

use thiserror::Error;

/// Result type used across the engine.
///
/// Every public operation returns this so callers *can* observe failures, while
/// mutations still never panic or abort the caller's flow.
pub type DomainResult<T> = Result<T, DomainError>;

/// Engine-level diagnostic.
///
/// Division guards (`max(denominator, 1)` and friends) are not represented here:
/// they are part of the computations and never surface as errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A referenced entity id is absent from its collection.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// A stored collection failed to parse as the expected shape.
    #[error("collection `{key}` is malformed: {reason}")]
    MalformedCollection { key: String, reason: String },

    /// A lifecycle transition was requested from a state that does not allow it.
    #[error("{entity} {id}: cannot transition from {from} to {to}")]
    InvalidTransition {
        entity: &'static str,
        id: String,
        from: String,
        to: String,
    },

    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. empty).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A conflict occurred (stale collection version).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The document store rejected or failed an operation.
    #[error("store error: {0}")]
    Store(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str, id: impl core::fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn malformed(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedCollection {
            key: key.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_transition(
        entity: &'static str,
        id: impl core::fmt::Display,
        from: impl core::fmt::Display,
        to: impl core::fmt::Display,
    ) -> Self {
        Self::InvalidTransition {
            entity,
            id: id.to_string(),
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
