use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use warden_auth::{CreateRole, Role, UpdateRole};
use warden_core::RoleId;
use warden_infra::Services;

use crate::app::dto::RoleResponse;
use crate::app::errors::ApiError;
use crate::app::extract::JsonBody;
use crate::app::routes::parse_id;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_roles).post(create_role))
        .route(
            "/:id",
            get(get_role)
                .put(update_role)
                .patch(update_role)
                .delete(delete_role),
        )
}

pub async fn list_roles(
    Extension(services): Extension<Services>,
) -> Result<Json<Vec<Role>>, ApiError> {
    Ok(Json(services.roles.list().await?))
}

pub async fn create_role(
    Extension(services): Extension<Services>,
    JsonBody(body): JsonBody<CreateRole>,
) -> Result<(StatusCode, Json<RoleResponse>), ApiError> {
    let role = services.roles.create(body).await?;
    Ok((
        StatusCode::CREATED,
        Json(RoleResponse {
            message: "Role created successfully".to_string(),
            role,
        }),
    ))
}

pub async fn get_role(
    Extension(services): Extension<Services>,
    Path(id): Path<String>,
) -> Result<Json<Role>, ApiError> {
    let id: RoleId = parse_id(&id)?;
    Ok(Json(services.roles.get(id).await?))
}

pub async fn update_role(
    Extension(services): Extension<Services>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<UpdateRole>,
) -> Result<Json<RoleResponse>, ApiError> {
    let id: RoleId = parse_id(&id)?;
    let role = services.roles.update(id, body).await?;
    Ok(Json(RoleResponse {
        message: "Role updated successfully".to_string(),
        role,
    }))
}

/// 409 while users still hold the role.
pub async fn delete_role(
    Extension(services): Extension<Services>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: RoleId = parse_id(&id)?;
    services.roles.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
