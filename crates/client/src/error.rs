use serde::Deserialize;
use thiserror::Error;

use warden_core::FieldErrors;

/// Client-side view of the API's failure taxonomy.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A protected call was attempted without a session.
    #[error("not logged in")]
    NotAuthenticated,

    #[error("a login is already in progress")]
    LoginInProgress,

    /// Login rejected (unknown email or wrong password).
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The server refused the token; the session has been cleared.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("validation failed: {message}")]
    Validation { message: String, errors: FieldErrors },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("server responded {status}: {message}")]
    Server { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Error body shape shared by every non-2xx API response.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: FieldErrors,
}

impl ClientError {
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation { errors, .. } => Some(errors),
            _ => None,
        }
    }

    pub(crate) fn from_status(status: reqwest::StatusCode, body: ErrorBody) -> Self {
        use reqwest::StatusCode;

        match status {
            StatusCode::UNAUTHORIZED => Self::Unauthenticated(body.message),
            StatusCode::UNPROCESSABLE_ENTITY => Self::Validation {
                message: body.message,
                errors: body.errors,
            },
            StatusCode::NOT_FOUND => Self::NotFound(body.message),
            StatusCode::CONFLICT => Self::Conflict(body.message),
            other => Self::Server {
                status: other.as_u16(),
                message: body.message,
            },
        }
    }
}
