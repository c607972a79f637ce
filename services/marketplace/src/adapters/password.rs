//! services/marketplace/src/adapters/password.rs
//!
//! Salted one-way password hashing with Argon2.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use course_market_core::ports::{PortError, PortResult};
use std::sync::OnceLock;
use tracing::error;

/// Hashes `password` with a fresh random salt, returning the PHC string.
pub fn hash_password(password: &str) -> PortResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PortError::Unexpected(format!("Failed to hash password: {}", e)))
}

/// Returns true only when `stored_hash` is a valid PHC string matching `password`.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(stored_hash) {
        Ok(hash) => hash,
        Err(e) => {
            error!("Failed to parse password hash: {:?}", e);
            return false;
        }
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

static DECOY_HASH: OnceLock<Option<String>> = OnceLock::new();

/// Runs a full verification against a throwaway hash and always fails.
///
/// Used when no account matches the login, so that path costs as much as a
/// wrong password.
pub fn verify_unknown_user(password: &str) -> bool {
    let decoy = DECOY_HASH.get_or_init(|| hash_password("decoy-password").ok());
    if let Some(hash) = decoy {
        verify_password(password, hash);
    }
    false
}
