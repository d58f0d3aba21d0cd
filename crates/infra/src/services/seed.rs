//! First-run bootstrap data.

use tracing::info;

use warden_auth::{CreateRole, CreateUser};
use warden_core::DomainResult;

use super::Services;

pub const ADMIN_ROLE: &str = "Admin";
pub const ADMIN_ROLE_DESCRIPTION: &str = "Administrator role with full permissions";
pub const ADMIN_FULL_NAME: &str = "Test Admin";
pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "P@ssw0rd!";

/// Create the `Admin` role and a first administrator when no user exists.
///
/// Returns whether anything was written. Running it again is a no-op.
pub async fn seed_admin(services: &Services) -> DomainResult<bool> {
    if !services.users.list().await?.is_empty() {
        return Ok(false);
    }

    let existing = services
        .roles
        .list()
        .await?
        .into_iter()
        .find(|role| role.name == ADMIN_ROLE);
    let role = match existing {
        Some(role) => role,
        None => {
            services
                .roles
                .create(CreateRole {
                    name: Some(ADMIN_ROLE.to_string()),
                    description: Some(ADMIN_ROLE_DESCRIPTION.to_string()),
                })
                .await?
        }
    };

    let user = services
        .users
        .create(CreateUser {
            full_name: Some(ADMIN_FULL_NAME.to_string()),
            email: Some(ADMIN_EMAIL.to_string()),
            password: Some(ADMIN_PASSWORD.to_string()),
            password_confirmation: Some(ADMIN_PASSWORD.to_string()),
            role_id: Some(role.id),
        })
        .await?;

    info!(user_id = %user.id, role_id = %role.id, "seeded administrator account");
    Ok(true)
}
