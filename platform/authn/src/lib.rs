//! Platform authentication helpers.
//!
//! Passwords are stored as argon2 PHC strings. Sessions are opaque uuids kept in
//! the `sessions` table; this crate only decides how long they live.

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AuthnError {
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("session ttl must be positive, got {0} hours")]
    InvalidTtl(i64),
}

/// Login form payload.
#[derive(Clone, Debug, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Hash a plain password into a PHC string with a fresh salt.
pub fn hash_password(plain: &str) -> Result<String, AuthnError> {
    let salt = SaltString::generate(&mut rand::rngs::OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AuthnError::Hash(err.to_string()))
}

/// A malformed stored hash never authenticates.
pub fn verify_password(plain: &str, stored: &str) -> bool {
    let parsed = match PasswordHash::new(stored) {
        Ok(parsed) => parsed,
        Err(err) => {
            tracing::warn!(error = %err, "stored password hash is not a PHC string");
            return false;
        }
    };
    Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok()
}

#[derive(Clone, Copy, Debug)]
pub struct SessionPolicy {
    ttl: Duration,
}

impl SessionPolicy {
    pub fn from_hours(hours: i64) -> Result<Self, AuthnError> {
        if hours <= 0 {
            return Err(AuthnError::InvalidTtl(hours));
        }
        Ok(Self {
            ttl: Duration::hours(hours),
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn new_session_id(&self) -> Uuid {
        Uuid::new_v4()
    }

    pub fn expires_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.ttl
    }

    pub fn is_expired<Tz: chrono::TimeZone>(expires_at: &DateTime<Tz>, now: DateTime<Utc>) -> bool {
        expires_at.with_timezone(&Utc) <= now
    }
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::hours(8),
        }
    }
}
