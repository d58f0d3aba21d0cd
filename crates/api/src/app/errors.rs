//! The single mapping point from domain failures to HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use warden_core::DomainError;

pub const UNAUTHENTICATED: &str = "Unauthenticated.";
pub const INVALID_CREDENTIALS: &str = "Email or password is incorrect.";

#[derive(Debug)]
pub enum ApiError {
    Domain(DomainError),
    /// The body was not valid JSON for the endpoint.
    MalformedBody(String),
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self::Domain(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = match self {
            ApiError::MalformedBody(msg) => {
                return json_error(StatusCode::UNPROCESSABLE_ENTITY, msg);
            }
            ApiError::Domain(err) => err,
        };

        match err {
            DomainError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                axum::Json(json!({
                    "message": errors.summary(),
                    "errors": errors,
                })),
            )
                .into_response(),
            DomainError::InvalidCredentials => json_error(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS),
            DomainError::Unauthenticated => json_error(StatusCode::UNAUTHORIZED, UNAUTHENTICATED),
            DomainError::NotFound(msg) => json_error(StatusCode::NOT_FOUND, msg),
            DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, msg),
            DomainError::Internal(msg) => {
                tracing::error!(error = %msg, "request failed with an internal error");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "Server Error")
            }
        }
    }
}

pub fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "message": message.into(),
        })),
    )
        .into_response()
}
