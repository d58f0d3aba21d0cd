//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: response envelopes
//! - `extract.rs`: JSON body extractor with API-shaped rejections
//! - `errors.rs`: consistent error responses

use axum::{middleware::from_fn, middleware::from_fn_with_state, routing::get, Extension, Router};
use tower::ServiceBuilder;

use warden_infra::Services;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod extract;
pub mod routes;

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app(services: Services) -> Router {
    let auth_state = middleware::AuthState {
        tokens: services.tokens.clone(),
    };

    // Protected routes: the gate runs only for matched routes, so unknown
    // paths still answer 404.
    let protected = routes::protected_router().route_layer(from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    let v1 = routes::public_router().merge(protected);

    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/v1", v1)
        .fallback(routes::system::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(from_fn(middleware::trace_requests))
                .layer(Extension(services)),
        )
}
