use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use log::*;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum PasswordError {
    #[error("Password cannot be empty")]
    EmptyPassword,
    #[error("Could not hash password. {0}")]
    HashError(String),
    #[error("The stored password hash is invalid. {0}")]
    InvalidHash(String),
}

/// Hashes a password with Argon2 using the default parameters and a random salt. The result is a PHC string that
/// carries its own salt and parameters.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    if password.is_empty() {
        return Err(PasswordError::EmptyPassword);
    }
    let salt = SaltString::generate(&mut rand::thread_rng());
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| PasswordError::HashError(e.to_string()))
}

/// Checks a password against a stored PHC hash string. A mismatch is `Ok(false)`, not an error.
pub fn verify_password(hash: &str, password: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(|e| PasswordError::InvalidHash(e.to_string()))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => {
            error!("🔐️ Password verification failed unexpectedly. {e}");
            Err(PasswordError::InvalidHash(e.to_string()))
        },
    }
}
