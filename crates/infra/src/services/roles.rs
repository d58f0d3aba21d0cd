//! Role CRUD.

use chrono::Utc;
use tracing::{info, instrument, warn};

use warden_auth::{CreateRole, Role, UpdateRole};
use warden_core::validation::rules;
use warden_core::{DomainError, DomainResult, FieldErrors, RoleId};

use crate::store::{SharedStore, StoreError};

const NOT_FOUND: &str = "Role not found";

#[derive(Clone)]
pub struct RoleService {
    store: SharedStore,
}

impl RoleService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> DomainResult<Vec<Role>> {
        Ok(self.store.list_roles().await?)
    }

    pub async fn get(&self, id: RoleId) -> DomainResult<Role> {
        self.store
            .get_role(id)
            .await?
            .ok_or_else(|| DomainError::not_found(NOT_FOUND))
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, input: CreateRole) -> DomainResult<Role> {
        let validated = input.validate();
        let mut errors = validated.as_ref().err().cloned().unwrap_or_default();
        let name = input.name.as_deref().map(str::trim);
        self.check_name_free(&mut errors, name, None).await?;
        if !errors.is_empty() {
            return Err(DomainError::validation(errors));
        }

        let new_role = validated.map_err(DomainError::validation)?;
        let role = self.store.insert_role(new_role, Utc::now()).await?;
        info!(role_id = %role.id, name = %role.name, "role created");
        Ok(role)
    }

    #[instrument(skip(self, input), fields(role_id = %id))]
    pub async fn update(&self, id: RoleId, input: UpdateRole) -> DomainResult<Role> {
        self.get(id).await?;

        let validated = input.validate();
        let mut errors = validated.as_ref().err().cloned().unwrap_or_default();
        let name = input.name.as_deref().map(str::trim);
        self.check_name_free(&mut errors, name, Some(id)).await?;
        if !errors.is_empty() {
            return Err(DomainError::validation(errors));
        }

        let changes = validated.map_err(DomainError::validation)?;
        let role = self
            .store
            .update_role(id, changes, Utc::now())
            .await
            .map_err(not_found_as_role)?;
        info!("role updated");
        Ok(role)
    }

    /// Fails with `Conflict` while any user still holds the role.
    #[instrument(skip(self), fields(role_id = %id))]
    pub async fn delete(&self, id: RoleId) -> DomainResult<()> {
        match self.store.delete_role(id).await {
            Ok(()) => {
                info!("role deleted");
                Ok(())
            }
            Err(StoreError::InUse(detail)) => {
                warn!(%detail, "refusing to delete a role in use");
                Err(DomainError::conflict(
                    "The role is assigned to one or more users and cannot be deleted.",
                ))
            }
            Err(other) => Err(not_found_as_role(other)),
        }
    }

    async fn check_name_free(
        &self,
        errors: &mut FieldErrors,
        name: Option<&str>,
        except: Option<RoleId>,
    ) -> DomainResult<()> {
        if let Some(name) = name.filter(|_| !errors.has("name")) {
            if let Some(existing) = self.store.find_role_by_name(name).await? {
                if Some(existing.id) != except {
                    errors.add("name", rules::unique_taken("name"));
                }
            }
        }
        Ok(())
    }
}

fn not_found_as_role(err: StoreError) -> DomainError {
    match err {
        StoreError::NotFound => DomainError::not_found(NOT_FOUND),
        other => other.into(),
    }
}
