//! User account entity.

use chrono::{DateTime, Utc};

use super::ids::UserId;

/// A registered account. The password is stored as an argon2 hash.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// Unique identifier.
    pub id: UserId,
    /// Unique login email.
    pub email: String,
    /// Argon2 password hash.
    pub password_hash: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Creates a new account with an already-hashed password.
    #[must_use]
    pub fn new(email: String, password_hash: String) -> Self {
        Self {
            id: UserId::new(),
            email,
            password_hash,
            created_at: Utc::now(),
        }
    }
}
