//! Argon2id password hashing. Hashes are stored as PHC strings.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::RngCore;

use crate::error::ServerError;

const SALT_LENGTH: usize = 16;

pub fn hash_password(password: &str) -> Result<String, ServerError> {
    let mut salt_bytes = [0u8; SALT_LENGTH];
    rand::rngs::OsRng.fill_bytes(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| ServerError::Internal(format!("password salt: {e}")))?;

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ServerError::Internal(format!("password hash: {e}")))?;
    Ok(hash.to_string())
}

/// `Ok(false)` for a wrong password; `Err` only if the stored hash is
/// unreadable.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, ServerError> {
    let parsed = PasswordHash::new(stored)
        .map_err(|e| ServerError::Internal(format!("stored password hash: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
