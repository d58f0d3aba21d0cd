use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use warden_auth::{AccessToken, NewRole, Role, RoleChanges, RoleSummary, TokenHash, User, UserWithRole};
use warden_core::{RoleId, TokenId, UserId};

use super::r#trait::{CredentialStore, StoreError, StoredUser, UserDraft, UserPatch};

#[derive(Debug, Default)]
struct Tables {
    roles: BTreeMap<RoleId, Role>,
    users: BTreeMap<UserId, StoredUser>,
    tokens: HashMap<TokenHash, AccessToken>,
    last_role_id: i64,
    last_user_id: i64,
}

impl Tables {
    fn role_name_taken(&self, name: &str, except: Option<RoleId>) -> bool {
        self.roles
            .values()
            .any(|r| r.name == name && Some(r.id) != except)
    }

    fn user_field_taken(&self, field: &'static str, value: &str, except: Option<UserId>) -> bool {
        self.users.values().any(|u| {
            let current = match field {
                "email" => &u.user.email,
                _ => &u.user.full_name,
            };
            current == value && Some(u.user.id) != except
        })
    }
}

/// In-memory credential store for tests/dev.
///
/// All tables sit behind one lock, so every constraint check and the write it
/// guards happen atomically with respect to other writers.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    inner: RwLock<Tables>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::Backend("credential store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::Backend("credential store lock poisoned".to_string()))
    }
}

#[async_trait::async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn list_roles(&self) -> Result<Vec<Role>, StoreError> {
        Ok(self.read()?.roles.values().cloned().collect())
    }

    async fn get_role(&self, id: RoleId) -> Result<Option<Role>, StoreError> {
        Ok(self.read()?.roles.get(&id).cloned())
    }

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, StoreError> {
        Ok(self.read()?.roles.values().find(|r| r.name == name).cloned())
    }

    async fn insert_role(&self, role: NewRole, now: DateTime<Utc>) -> Result<Role, StoreError> {
        let mut tables = self.write()?;
        if tables.role_name_taken(&role.name, None) {
            return Err(StoreError::Duplicate { field: "name" });
        }

        tables.last_role_id += 1;
        let stored = Role {
            id: RoleId::new(tables.last_role_id),
            name: role.name,
            description: role.description,
            created_at: now,
            updated_at: now,
        };
        tables.roles.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update_role(
        &self,
        id: RoleId,
        changes: RoleChanges,
        now: DateTime<Utc>,
    ) -> Result<Role, StoreError> {
        let mut tables = self.write()?;
        if let Some(name) = &changes.name {
            if tables.role_name_taken(name, Some(id)) {
                return Err(StoreError::Duplicate { field: "name" });
            }
        }

        let role = tables.roles.get_mut(&id).ok_or(StoreError::NotFound)?;
        if let Some(name) = changes.name {
            role.name = name;
        }
        if let Some(description) = changes.description {
            role.description = description;
        }
        role.updated_at = now;
        Ok(role.clone())
    }

    async fn delete_role(&self, id: RoleId) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        if !tables.roles.contains_key(&id) {
            return Err(StoreError::NotFound);
        }

        let holders = tables.users.values().filter(|u| u.user.role_id == id).count();
        if holders > 0 {
            return Err(StoreError::InUse(format!("role {id} is assigned to {holders} user(s)")));
        }

        tables.roles.remove(&id);
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<UserWithRole>, StoreError> {
        let tables = self.read()?;
        Ok(tables
            .users
            .values()
            .map(|u| UserWithRole {
                user: u.user.clone(),
                role: tables.roles.get(&u.user.role_id).map(RoleSummary::from),
            })
            .collect())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.read()?.users.get(&id).map(|u| u.user.clone()))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<StoredUser>, StoreError> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|u| u.user.email == email)
            .cloned())
    }

    async fn find_user_by_full_name(&self, full_name: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|u| u.user.full_name == full_name)
            .map(|u| u.user.clone()))
    }

    async fn insert_user(&self, user: UserDraft, now: DateTime<Utc>) -> Result<User, StoreError> {
        let mut tables = self.write()?;
        if tables.user_field_taken("full_name", &user.full_name, None) {
            return Err(StoreError::Duplicate { field: "full_name" });
        }
        if tables.user_field_taken("email", &user.email, None) {
            return Err(StoreError::Duplicate { field: "email" });
        }
        if !tables.roles.contains_key(&user.role_id) {
            return Err(StoreError::MissingReference { field: "role_id" });
        }

        tables.last_user_id += 1;
        let public = User {
            id: UserId::new(tables.last_user_id),
            full_name: user.full_name,
            email: user.email,
            role_id: user.role_id,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(
            public.id,
            StoredUser {
                user: public.clone(),
                password_hash: user.password_hash,
            },
        );
        Ok(public)
    }

    async fn update_user(
        &self,
        id: UserId,
        patch: UserPatch,
        now: DateTime<Utc>,
    ) -> Result<User, StoreError> {
        let mut tables = self.write()?;
        if !tables.users.contains_key(&id) {
            return Err(StoreError::NotFound);
        }
        if let Some(full_name) = &patch.full_name {
            if tables.user_field_taken("full_name", full_name, Some(id)) {
                return Err(StoreError::Duplicate { field: "full_name" });
            }
        }
        if let Some(email) = &patch.email {
            if tables.user_field_taken("email", email, Some(id)) {
                return Err(StoreError::Duplicate { field: "email" });
            }
        }
        if let Some(role_id) = patch.role_id {
            if !tables.roles.contains_key(&role_id) {
                return Err(StoreError::MissingReference { field: "role_id" });
            }
        }

        let stored = tables.users.get_mut(&id).ok_or(StoreError::NotFound)?;
        if let Some(full_name) = patch.full_name {
            stored.user.full_name = full_name;
        }
        if let Some(email) = patch.email {
            stored.user.email = email;
        }
        if let Some(hash) = patch.password_hash {
            stored.password_hash = hash;
        }
        if let Some(role_id) = patch.role_id {
            stored.user.role_id = role_id;
        }
        stored.user.updated_at = now;
        Ok(stored.user.clone())
    }

    async fn delete_user(&self, id: UserId) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        if tables.users.remove(&id).is_none() {
            return Err(StoreError::NotFound);
        }
        tables.tokens.retain(|_hash, token| token.user_id != id);
        Ok(())
    }

    async fn insert_token(&self, token: AccessToken) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        if !tables.users.contains_key(&token.user_id) {
            return Err(StoreError::MissingReference { field: "user_id" });
        }
        if tables.tokens.contains_key(&token.token_hash) {
            return Err(StoreError::Duplicate { field: "token" });
        }
        tables.tokens.insert(token.token_hash.clone(), token);
        Ok(())
    }

    async fn find_token(&self, hash: &TokenHash) -> Result<Option<AccessToken>, StoreError> {
        Ok(self.read()?.tokens.get(hash).cloned())
    }

    async fn touch_token(&self, id: TokenId, now: DateTime<Utc>) -> Result<(), StoreError> {
        let mut tables = self.write()?;
        if let Some(token) = tables.tokens.values_mut().find(|t| t.id == id) {
            token.last_used_at = Some(now);
        }
        Ok(())
    }

    async fn delete_token(&self, hash: &TokenHash) -> Result<bool, StoreError> {
        Ok(self.write()?.tokens.remove(hash).is_some())
    }
}
