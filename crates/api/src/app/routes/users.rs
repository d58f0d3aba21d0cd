use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use warden_auth::{CreateUser, UpdateUser, User, UserWithRole};
use warden_core::UserId;
use warden_infra::Services;

use crate::app::dto::UserResponse;
use crate::app::errors::ApiError;
use crate::app::extract::JsonBody;
use crate::app::routes::parse_id;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route(
            "/:id",
            get(get_user)
                .put(update_user)
                .patch(update_user)
                .delete(delete_user),
        )
}

pub async fn list_users(
    Extension(services): Extension<Services>,
) -> Result<Json<Vec<UserWithRole>>, ApiError> {
    Ok(Json(services.users.list().await?))
}

pub async fn create_user(
    Extension(services): Extension<Services>,
    JsonBody(body): JsonBody<CreateUser>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let user = services.users.create(body).await?;
    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            message: "User created successfully".to_string(),
            user,
        }),
    ))
}

pub async fn get_user(
    Extension(services): Extension<Services>,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    let id: UserId = parse_id(&id)?;
    Ok(Json(services.users.get(id).await?))
}

pub async fn update_user(
    Extension(services): Extension<Services>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<UpdateUser>,
) -> Result<Json<UserResponse>, ApiError> {
    let id: UserId = parse_id(&id)?;
    let user = services.users.update(id, body).await?;
    Ok(Json(UserResponse {
        message: "User updated successfully".to_string(),
        user,
    }))
}

pub async fn delete_user(
    Extension(services): Extension<Services>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: UserId = parse_id(&id)?;
    services.users.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
