//! Postgres-backed credential store.
//!
//! Uniqueness, the user→role reference and the token→user cascade are all
//! enforced by table constraints (see `migrations/0001_init.sql`), so racing
//! writers are serialized by the database rather than by this process.
//!
//! ## Error Mapping
//!
//! | PostgreSQL Error Code | Constraint | StoreError |
//! |-----------------------|------------|------------|
//! | `23505` | `roles_name_unique` | `Duplicate { field: "name" }` |
//! | `23505` | `users_full_name_unique` | `Duplicate { field: "full_name" }` |
//! | `23505` | `users_email_unique` | `Duplicate { field: "email" }` |
//! | `23503` | `users_role_id_fkey` (insert/update) | `MissingReference { field: "role_id" }` |
//! | `23503` | `users_role_id_fkey` (role delete) | `InUse` |
//! | Any other | N/A | `Backend` |

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use warden_auth::{
    AccessToken, NewRole, PasswordHash, Role, RoleChanges, RoleSummary, TokenHash, User, UserWithRole,
};
use warden_core::{RoleId, TokenId, UserId};

use super::r#trait::{CredentialStore, StoreError, StoredUser, UserDraft, UserPatch};

const INIT_SCHEMA: &str = include_str!("../../migrations/0001_init.sql");

const USER_COLUMNS: &str = "id, full_name, email, password, role_id, created_at, updated_at";
const ROLE_COLUMNS: &str = "id, name, description, created_at, updated_at";
const TOKEN_COLUMNS: &str = "id, user_id, token, created_at, last_used_at";

/// Postgres-backed credential store.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct PostgresCredentialStore {
    pool: Arc<PgPool>,
}

impl PostgresCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Open a pool against `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create the tables if they do not exist yet. Idempotent.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(INIT_SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl CredentialStore for PostgresCredentialStore {
    #[instrument(skip(self), err)]
    async fn list_roles(&self) -> Result<Vec<Role>, StoreError> {
        let rows = sqlx::query(&format!("SELECT {ROLE_COLUMNS} FROM roles ORDER BY id ASC"))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_roles", e))?;
        rows.iter().map(role_from_row).collect()
    }

    #[instrument(skip(self), fields(role_id = %id), err)]
    async fn get_role(&self, id: RoleId) -> Result<Option<Role>, StoreError> {
        let row = sqlx::query(&format!("SELECT {ROLE_COLUMNS} FROM roles WHERE id = $1"))
            .bind(id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_role", e))?;
        row.as_ref().map(role_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, StoreError> {
        let row = sqlx::query(&format!("SELECT {ROLE_COLUMNS} FROM roles WHERE name = $1"))
            .bind(name)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_role_by_name", e))?;
        row.as_ref().map(role_from_row).transpose()
    }

    #[instrument(skip(self, role), fields(name = %role.name), err)]
    async fn insert_role(&self, role: NewRole, now: DateTime<Utc>) -> Result<Role, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO roles (name, description, created_at, updated_at)
            VALUES ($1, $2, $3, $3)
            RETURNING {ROLE_COLUMNS}
            "#
        ))
        .bind(&role.name)
        .bind(&role.description)
        .bind(now)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_role", e))?;
        role_from_row(&row)
    }

    #[instrument(skip(self, changes), fields(role_id = %id), err)]
    async fn update_role(
        &self,
        id: RoleId,
        changes: RoleChanges,
        now: DateTime<Utc>,
    ) -> Result<Role, StoreError> {
        let (set_description, description) = match changes.description {
            Some(description) => (true, description),
            None => (false, None),
        };

        let row = sqlx::query(&format!(
            r#"
            UPDATE roles SET
                name = COALESCE($2, name),
                description = CASE WHEN $3 THEN $4 ELSE description END,
                updated_at = $5
            WHERE id = $1
            RETURNING {ROLE_COLUMNS}
            "#
        ))
        .bind(id.get())
        .bind(&changes.name)
        .bind(set_description)
        .bind(&description)
        .bind(now)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_role", e))?;

        match row {
            Some(row) => role_from_row(&row),
            None => Err(StoreError::NotFound),
        }
    }

    #[instrument(skip(self), fields(role_id = %id), err)]
    async fn delete_role(&self, id: RoleId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id.get())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_role", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn list_users(&self) -> Result<Vec<UserWithRole>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT
                u.id, u.full_name, u.email, u.password, u.role_id, u.created_at, u.updated_at,
                r.name AS role_name,
                r.description AS role_description
            FROM users u
            LEFT JOIN roles r ON r.id = u.role_id
            ORDER BY u.id ASC
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_users", e))?;

        let mut users = Vec::with_capacity(rows.len());
        for row in &rows {
            let user = stored_user_from_row(row)?.user;
            let role_name: Option<String> = row.try_get("role_name").map_err(decode_error)?;
            let role = match role_name {
                Some(name) => Some(RoleSummary {
                    id: user.role_id,
                    name,
                    description: row.try_get("role_description").map_err(decode_error)?,
                }),
                None => None,
            };
            users.push(UserWithRole { user, role });
        }
        Ok(users)
    }

    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn get_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_user", e))?;
        Ok(row.as_ref().map(stored_user_from_row).transpose()?.map(|s| s.user))
    }

    #[instrument(skip(self), err)]
    async fn find_user_by_email(&self, email: &str) -> Result<Option<StoredUser>, StoreError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user_by_email", e))?;
        row.as_ref().map(stored_user_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn find_user_by_full_name(&self, full_name: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE full_name = $1"))
            .bind(full_name)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user_by_full_name", e))?;
        Ok(row.as_ref().map(stored_user_from_row).transpose()?.map(|s| s.user))
    }

    #[instrument(skip(self, user), fields(email = %user.email, role_id = %user.role_id), err)]
    async fn insert_user(&self, user: UserDraft, now: DateTime<Utc>) -> Result<User, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO users (full_name, email, password, role_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.full_name)
        .bind(&user.email)
        .bind(user.password_hash.as_str())
        .bind(user.role_id.get())
        .bind(now)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_user", e))?;
        Ok(stored_user_from_row(&row)?.user)
    }

    #[instrument(skip(self, patch), fields(user_id = %id), err)]
    async fn update_user(
        &self,
        id: UserId,
        patch: UserPatch,
        now: DateTime<Utc>,
    ) -> Result<User, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE users SET
                full_name = COALESCE($2, full_name),
                email = COALESCE($3, email),
                password = COALESCE($4, password),
                role_id = COALESCE($5, role_id),
                updated_at = $6
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id.get())
        .bind(&patch.full_name)
        .bind(&patch.email)
        .bind(patch.password_hash.as_ref().map(PasswordHash::as_str))
        .bind(patch.role_id.map(RoleId::get))
        .bind(now)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_user", e))?;

        match row {
            Some(row) => Ok(stored_user_from_row(&row)?.user),
            None => Err(StoreError::NotFound),
        }
    }

    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn delete_user(&self, id: UserId) -> Result<(), StoreError> {
        // personal_access_tokens cascade with the user row.
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.get())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_user", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self, token), fields(user_id = %token.user_id, token_id = %token.id), err)]
    async fn insert_token(&self, token: AccessToken) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO personal_access_tokens (id, user_id, token, created_at, last_used_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(*token.id.as_uuid())
        .bind(token.user_id.get())
        .bind(token.token_hash.as_str())
        .bind(token.created_at)
        .bind(token.last_used_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_token", e))?;
        Ok(())
    }

    #[instrument(skip(self, hash), err)]
    async fn find_token(&self, hash: &TokenHash) -> Result<Option<AccessToken>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {TOKEN_COLUMNS} FROM personal_access_tokens WHERE token = $1"
        ))
        .bind(hash.as_str())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_token", e))?;
        row.as_ref().map(token_from_row).transpose()
    }

    #[instrument(skip(self), fields(token_id = %id), err)]
    async fn touch_token(&self, id: TokenId, now: DateTime<Utc>) -> Result<(), StoreError> {
        sqlx::query("UPDATE personal_access_tokens SET last_used_at = $2 WHERE id = $1")
            .bind(*id.as_uuid())
            .bind(now)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("touch_token", e))?;
        Ok(())
    }

    #[instrument(skip(self, hash), err)]
    async fn delete_token(&self, hash: &TokenHash) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM personal_access_tokens WHERE token = $1")
            .bind(hash.as_str())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_token", e))?;
        Ok(result.rows_affected() > 0)
    }
}

fn decode_error(err: sqlx::Error) -> StoreError {
    StoreError::Backend(format!("failed to decode row: {err}"))
}

fn role_from_row(row: &PgRow) -> Result<Role, StoreError> {
    Ok(Role {
        id: RoleId::new(row.try_get("id").map_err(decode_error)?),
        name: row.try_get("name").map_err(decode_error)?,
        description: row.try_get("description").map_err(decode_error)?,
        created_at: row.try_get("created_at").map_err(decode_error)?,
        updated_at: row.try_get("updated_at").map_err(decode_error)?,
    })
}

fn stored_user_from_row(row: &PgRow) -> Result<StoredUser, StoreError> {
    let password: String = row.try_get("password").map_err(decode_error)?;
    Ok(StoredUser {
        user: User {
            id: UserId::new(row.try_get("id").map_err(decode_error)?),
            full_name: row.try_get("full_name").map_err(decode_error)?,
            email: row.try_get("email").map_err(decode_error)?,
            role_id: RoleId::new(row.try_get("role_id").map_err(decode_error)?),
            created_at: row.try_get("created_at").map_err(decode_error)?,
            updated_at: row.try_get("updated_at").map_err(decode_error)?,
        },
        password_hash: PasswordHash::from_stored(password),
    })
}

fn token_from_row(row: &PgRow) -> Result<AccessToken, StoreError> {
    let id: Uuid = row.try_get("id").map_err(decode_error)?;
    let token: String = row.try_get("token").map_err(decode_error)?;
    Ok(AccessToken {
        id: TokenId::from_uuid(id),
        user_id: UserId::new(row.try_get("user_id").map_err(decode_error)?),
        token_hash: TokenHash::from_stored(token),
        created_at: row.try_get("created_at").map_err(decode_error)?,
        last_used_at: row.try_get("last_used_at").map_err(decode_error)?,
    })
}

fn unique_field(constraint: &str) -> Option<&'static str> {
    match constraint {
        "roles_name_unique" => Some("name"),
        "users_full_name_unique" => Some("full_name"),
        "users_email_unique" => Some("email"),
        "personal_access_tokens_token_unique" => Some("token"),
        _ => None,
    }
}

/// Map SQLx errors to `StoreError`, keeping the field a constraint guards.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            let constraint = db_err.constraint().unwrap_or_default();

            match db_err.code().as_deref() {
                Some("23505") => match unique_field(constraint) {
                    Some(field) => StoreError::Duplicate { field },
                    None => StoreError::Backend(msg),
                },
                Some("23503") => match (operation, constraint) {
                    ("delete_role", _) => StoreError::InUse(msg),
                    (_, "users_role_id_fkey") => StoreError::MissingReference { field: "role_id" },
                    (_, "personal_access_tokens_user_id_fkey") => {
                        StoreError::MissingReference { field: "user_id" }
                    }
                    _ => StoreError::Backend(msg),
                },
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {}", operation))
        }
        other => StoreError::Backend(format!("{} failed: {}", operation, other)),
    }
}
