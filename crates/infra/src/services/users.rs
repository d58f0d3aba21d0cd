//! User CRUD.

use chrono::Utc;
use tracing::{info, instrument};

use warden_auth::{CreateUser, UpdateUser, User, UserWithRole, normalize_email};
use warden_core::validation::rules;
use warden_core::{DomainError, DomainResult, FieldErrors, RoleId, UserId};

use super::hashing::hash_password;
use crate::store::{SharedStore, StoreError, UserDraft, UserPatch};

const NOT_FOUND: &str = "User not found";

#[derive(Clone)]
pub struct UserService {
    store: SharedStore,
    bcrypt_cost: u32,
}

/// Values that need the store to validate. `None` skips the check.
struct Lookups<'a> {
    full_name: Option<&'a str>,
    email: Option<String>,
    role_id: Option<RoleId>,
}

impl UserService {
    pub fn new(store: SharedStore, bcrypt_cost: u32) -> Self {
        Self { store, bcrypt_cost }
    }

    pub async fn list(&self) -> DomainResult<Vec<UserWithRole>> {
        Ok(self.store.list_users().await?)
    }

    pub async fn get(&self, id: UserId) -> DomainResult<User> {
        self.store
            .get_user(id)
            .await?
            .ok_or_else(|| DomainError::not_found(NOT_FOUND))
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, input: CreateUser) -> DomainResult<User> {
        let validated = input.validate();
        let mut errors = validated.as_ref().err().cloned().unwrap_or_default();
        let lookups = Lookups {
            full_name: input.full_name.as_deref().map(str::trim),
            email: input.email.as_deref().map(normalize_email),
            role_id: input.role_id,
        };
        self.check_store_rules(&mut errors, lookups, None).await?;
        if !errors.is_empty() {
            return Err(DomainError::validation(errors));
        }

        let new_user = validated.map_err(DomainError::validation)?;
        let password_hash = hash_password(new_user.password, self.bcrypt_cost).await?;
        let draft = UserDraft {
            full_name: new_user.full_name,
            email: new_user.email,
            password_hash,
            role_id: new_user.role_id,
        };

        let user = self.store.insert_user(draft, Utc::now()).await?;
        info!(user_id = %user.id, "user created");
        Ok(user)
    }

    /// Partial update. Only supplied fields are validated; uniqueness ignores
    /// the user's own current values.
    #[instrument(skip(self, input), fields(user_id = %id))]
    pub async fn update(&self, id: UserId, input: UpdateUser) -> DomainResult<User> {
        self.get(id).await?;

        let validated = input.validate();
        let mut errors = validated.as_ref().err().cloned().unwrap_or_default();
        let lookups = Lookups {
            full_name: input.full_name.as_deref().map(str::trim),
            email: input.email.as_deref().map(normalize_email),
            role_id: input.role_id,
        };
        self.check_store_rules(&mut errors, lookups, Some(id)).await?;
        if !errors.is_empty() {
            return Err(DomainError::validation(errors));
        }

        let changes = validated.map_err(DomainError::validation)?;
        let password_hash = match changes.password {
            Some(plain) => Some(hash_password(plain, self.bcrypt_cost).await?),
            None => None,
        };
        let patch = UserPatch {
            full_name: changes.full_name,
            email: changes.email,
            password_hash,
            role_id: changes.role_id,
        };

        let user = self
            .store
            .update_user(id, patch, Utc::now())
            .await
            .map_err(not_found_as_user)?;
        info!("user updated");
        Ok(user)
    }

    /// Delete a user together with its tokens.
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn delete(&self, id: UserId) -> DomainResult<()> {
        self.store.delete_user(id).await.map_err(not_found_as_user)?;
        info!("user deleted");
        Ok(())
    }

    /// Uniqueness and role existence for fields that passed the shape checks.
    async fn check_store_rules(
        &self,
        errors: &mut FieldErrors,
        lookups: Lookups<'_>,
        except: Option<UserId>,
    ) -> DomainResult<()> {
        let is_other = |user: &User| Some(user.id) != except;

        if let Some(full_name) = lookups.full_name.filter(|_| !errors.has("full_name")) {
            if let Some(existing) = self.store.find_user_by_full_name(full_name).await? {
                if is_other(&existing) {
                    errors.add("full_name", rules::unique_taken("full_name"));
                }
            }
        }

        if let Some(email) = lookups.email.filter(|_| !errors.has("email")) {
            if let Some(existing) = self.store.find_user_by_email(&email).await? {
                if is_other(&existing.user) {
                    errors.add("email", rules::unique_taken("email"));
                }
            }
        }

        if let Some(role_id) = lookups.role_id.filter(|_| !errors.has("role_id")) {
            if self.store.get_role(role_id).await?.is_none() {
                errors.add("role_id", rules::invalid_selection("role_id"));
            }
        }

        Ok(())
    }
}

fn not_found_as_user(err: StoreError) -> DomainError {
    match err {
        StoreError::NotFound => DomainError::not_found(NOT_FOUND),
        other => other.into(),
    }
}
