//! Domain error model.

use thiserror::Error;

use crate::validation::FieldErrors;

/// Result type used across the domain and service layers.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every failure a caller can observe maps to exactly one variant. The HTTP
/// layer translates these into status codes; nothing below it knows about HTTP.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Input failed one or more field rules (uniqueness included).
    #[error("validation failed: {}", .0.summary())]
    Validation(FieldErrors),

    /// Login was attempted with an unknown email or a wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// A bearer token was missing, unknown, revoked or expired.
    #[error("unauthenticated")]
    Unauthenticated,

    /// A referenced record does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The operation would break referential integrity (e.g. deleting a role in use).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Infrastructure failure (storage, hashing). Not caused by the caller.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn validation(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }

    /// Single-field validation error.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.add(field, message);
        Self::Validation(errors)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
