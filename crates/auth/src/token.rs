//! Opaque bearer tokens.
//!
//! The secret handed to the client is 32 random bytes, hex-encoded. Only its
//! SHA-256 digest is persisted.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use warden_core::{TokenId, UserId};

const SECRET_BYTES: usize = 32;

/// Token secret as issued to the client.
#[derive(Clone, PartialEq, Eq)]
pub struct PlainTextToken(String);

impl PlainTextToken {
    /// Mint a new unguessable secret.
    pub fn generate() -> Self {
        let mut bytes = [0u8; SECRET_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Wrap a secret presented by a client.
    pub fn from_presented(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn hash(&self) -> TokenHash {
        TokenHash::of(&self.0)
    }
}

impl core::fmt::Debug for PlainTextToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("PlainTextToken(<redacted>)")
    }
}

/// Hex SHA-256 digest of a token secret; the lookup key in storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenHash(String);

impl TokenHash {
    pub fn of(secret: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(secret.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A persisted access token record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub id: TokenId,
    pub user_id: UserId,
    pub token_hash: TokenHash,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    pub fn new(user_id: UserId, token_hash: TokenHash, now: DateTime<Utc>) -> Self {
        Self {
            id: TokenId::new(),
            user_id,
            token_hash,
            created_at: now,
            last_used_at: None,
        }
    }

    /// Whether the token has outlived `ttl`. Without a TTL tokens never expire.
    pub fn is_expired(&self, ttl: Option<Duration>, now: DateTime<Utc>) -> bool {
        match ttl {
            Some(ttl) => now >= self.created_at + ttl,
            None => false,
        }
    }
}
