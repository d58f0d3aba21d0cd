use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use warden_auth::PlainTextToken;
use warden_core::DomainError;
use warden_infra::services::TokenService;

use crate::app::errors::ApiError;
use crate::context::CurrentUser;

#[derive(Clone)]
pub struct AuthState {
    pub tokens: TokenService,
}

/// Bearer-token gate for every protected route.
///
/// Fails closed: a missing header, another scheme, an empty, unknown,
/// expired or orphaned token all stop the request with 401 before the
/// handler runs.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(req.headers())
        .map(PlainTextToken::from_presented)
        .ok_or(DomainError::Unauthenticated)?;

    let user = state.tokens.authenticate(token.as_str()).await?;

    req.extensions_mut().insert(CurrentUser::new(user, token));

    Ok(next.run(req).await)
}

/// One log line per request with status and latency.
pub async fn trace_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    tracing::info!(
        %method,
        %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request handled"
    );
    response
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?;
    let header = header.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}
