//! Authentication primitives: argon2 password hashing and opaque session
//! tokens stored as sha256 digests. The raw token leaves the server exactly
//! once, in the register/login response.

pub mod extractor;
pub mod handlers;

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::Session;
use crate::models::to_document;
use crate::store::{collections, DocumentStore};

pub use extractor::AuthUser;

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("password hashing failed: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Opaque bearer token. Two v4 UUIDs of OS randomness, hex-concatenated.
pub fn generate_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

/// What we persist instead of the token itself.
pub fn token_digest(token: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(token.as_bytes()))
}

/// Creates a session for `user_id` and returns the raw token.
pub async fn issue_session(
    store: &dyn DocumentStore,
    user_id: Uuid,
    ttl_hours: i64,
) -> Result<String, AppError> {
    let token = generate_token();
    let now = Utc::now();
    let session = Session {
        id: Uuid::new_v4(),
        user_id,
        token_digest: token_digest(&token),
        created_at: now,
        expires_at: now + Duration::hours(ttl_hours),
    };
    store
        .insert(collections::SESSIONS, to_document(&session)?)
        .await?;
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_verifies_and_rejects() {
        let hash = hash_password("hunter2hunter2").unwrap();
        assert!(verify_password("hunter2hunter2", &hash));
        assert!(!verify_password("wrong-password", &hash));
    }

    #[test]
    fn test_garbage_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn test_token_digest_is_deterministic_and_token_specific() {
        let token = generate_token();
        assert_eq!(token_digest(&token), token_digest(&token));
        assert_ne!(token_digest(&token), token_digest(&generate_token()));
        // The digest must never leak the token.
        assert_ne!(token_digest(&token), token);
    }
}
