//! bcrypt off the async runtime.

use warden_auth::PasswordHash;
use warden_core::{DomainError, DomainResult};

/// Hash `plain` on the blocking pool.
pub async fn hash_password(plain: String, cost: u32) -> DomainResult<PasswordHash> {
    tokio::task::spawn_blocking(move || PasswordHash::create(&plain, cost))
        .await
        .map_err(|e| DomainError::internal(format!("hashing task failed: {e}")))?
        .map_err(|e| DomainError::internal(e.to_string()))
}

/// Verify `plain` against `hash` on the blocking pool.
pub async fn verify_password(hash: PasswordHash, plain: String) -> DomainResult<bool> {
    tokio::task::spawn_blocking(move || hash.verify(&plain))
        .await
        .map_err(|e| DomainError::internal(format!("verification task failed: {e}")))
}
