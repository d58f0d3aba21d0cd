use axum::{extract::Extension, Json};

use warden_auth::{Credentials, User};
use warden_infra::Services;

use crate::app::dto::{LoginResponse, MessageResponse};
use crate::app::errors::ApiError;
use crate::app::extract::JsonBody;
use crate::context::CurrentUser;

pub async fn login(
    Extension(services): Extension<Services>,
    JsonBody(body): JsonBody<Credentials>,
) -> Result<Json<LoginResponse>, ApiError> {
    let outcome = services.sessions.login(body).await?;
    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        user: outcome.user,
        token: outcome.token.into_string(),
    }))
}

/// Revoke the token this request was authenticated with.
pub async fn logout(
    Extension(services): Extension<Services>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<MessageResponse>, ApiError> {
    services.sessions.logout(current.token().as_str()).await?;
    Ok(Json(MessageResponse::new("Logged out successfully")))
}

pub async fn profile(Extension(current): Extension<CurrentUser>) -> Json<User> {
    Json(current.into_user())
}
