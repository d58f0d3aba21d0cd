//! Password policy and one-way hashing.
//!
//! Hashes are bcrypt (per-hash random salt, adaptive cost). Hashing is
//! CPU-bound; callers on an async runtime should run it on a blocking thread.
//!
//! bcrypt only reads the first 72 bytes of its input, so it is fed the hex
//! SHA-256 digest of the password (64 bytes) and never the password itself.

use sha2::{Digest, Sha256};
use thiserror::Error;

/// Characters that satisfy the "special character" rule.
pub const SPECIAL_CHARS: &[char] = &['@', '$', '!', '%', '*', '?', '&', '#'];

pub const MIN_LENGTH: usize = 8;
pub const MAX_LENGTH: usize = 255;

/// A single unmet password rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordRule {
    MinLength,
    MaxLength,
    Uppercase,
    Lowercase,
    Digit,
    Special,
    AllowedChars,
}

impl PasswordRule {
    pub fn message(&self) -> String {
        match self {
            Self::MinLength => format!("The password field must be at least {MIN_LENGTH} characters."),
            Self::MaxLength => {
                format!("The password field must not be greater than {MAX_LENGTH} characters.")
            }
            Self::Uppercase => "The password field must contain at least one uppercase letter.".to_string(),
            Self::Lowercase => "The password field must contain at least one lowercase letter.".to_string(),
            Self::Digit => "The password field must contain at least one number.".to_string(),
            Self::Special => format!(
                "The password field must contain at least one special character ({}).",
                SPECIAL_CHARS.iter().collect::<String>()
            ),
            Self::AllowedChars => format!(
                "The password field may only contain letters, numbers and {}.",
                SPECIAL_CHARS.iter().collect::<String>()
            ),
        }
    }
}

/// Every rule the candidate password breaks (empty when it is acceptable).
pub fn violations(password: &str) -> Vec<PasswordRule> {
    let mut unmet = Vec::new();
    let len = password.chars().count();

    if len < MIN_LENGTH {
        unmet.push(PasswordRule::MinLength);
    }
    if len > MAX_LENGTH {
        unmet.push(PasswordRule::MaxLength);
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        unmet.push(PasswordRule::Uppercase);
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        unmet.push(PasswordRule::Lowercase);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        unmet.push(PasswordRule::Digit);
    }
    if !password.chars().any(|c| SPECIAL_CHARS.contains(&c)) {
        unmet.push(PasswordRule::Special);
    }
    if !password
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || SPECIAL_CHARS.contains(&c))
    {
        unmet.push(PasswordRule::AllowedChars);
    }

    unmet
}

#[derive(Debug, Error)]
#[error("password hashing failed: {0}")]
pub struct HashError(String);

/// A stored bcrypt hash. The plaintext is never kept.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Hash `plain` with a fresh random salt.
    pub fn create(plain: &str, cost: u32) -> Result<Self, HashError> {
        bcrypt::hash(bcrypt_input(plain), cost)
            .map(Self)
            .map_err(|e| HashError(e.to_string()))
    }

    /// Wrap a hash loaded from storage.
    pub fn from_stored(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Constant-time check of `plain` against this hash. A malformed stored
    /// hash never verifies.
    pub fn verify(&self, plain: &str) -> bool {
        match bcrypt::verify(bcrypt_input(plain), &self.0) {
            Ok(ok) => ok,
            Err(e) => {
                tracing::warn!(error = %e, "stored password hash is unreadable");
                false
            }
        }
    }
}

fn bcrypt_input(plain: &str) -> String {
    hex::encode(Sha256::digest(plain.as_bytes()))
}

impl core::fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("PasswordHash(<redacted>)")
    }
}
