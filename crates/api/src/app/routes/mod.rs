use std::str::FromStr;

use axum::{
    routing::{get, post},
    Router,
};

use warden_core::DomainError;

use crate::app::errors::ApiError;

pub mod auth;
pub mod roles;
pub mod system;
pub mod users;

/// Endpoints reachable without a token.
pub fn public_router() -> Router {
    Router::new().route("/login", post(auth::login))
}

/// Endpoints behind the bearer-token gate.
pub fn protected_router() -> Router {
    Router::new()
        .route("/logout", post(auth::logout))
        .route("/profile", get(auth::profile))
        .nest("/users", users::router())
        .nest("/roles", roles::router())
}

/// Parse a numeric path id. Anything unparsable is reported as not found.
pub(crate) fn parse_id<T>(raw: &str) -> Result<T, ApiError>
where
    T: FromStr<Err = DomainError>,
{
    Ok(raw.parse::<T>()?)
}
