//! Bearer-token authentication: JWT mint/verify, password hashing, and
//! the [`AuthUser`] extractor.
//!
//! Expired and otherwise-invalid tokens are rejected with distinct
//! error codes so clients can force a re-authentication flow instead of
//! blindly retrying.

use std::fmt;

use argon2::Argon2;
use argon2::password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
};
use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::app_state::AppState;
use crate::domain::UserId;
use crate::error::GatewayError;

/// JWT claims carried by an access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id the token was minted for.
    pub sub: uuid::Uuid,
    /// Email at mint time.
    pub email: String,
    /// Expiry timestamp (seconds since epoch).
    pub exp: i64,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
}

/// Signing and verification keys plus token lifetime.
pub struct AuthKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_hours: i64,
}

impl fmt::Debug for AuthKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthKeys")
            .field("ttl_hours", &self.ttl_hours)
            .finish_non_exhaustive()
    }
}

impl AuthKeys {
    /// Derives both keys from a shared secret.
    #[must_use]
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_hours,
        }
    }

    /// Mints an access token for the given user.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Internal`] if token encoding fails.
    pub fn mint(&self, user_id: UserId, email: &str) -> Result<String, GatewayError> {
        let now = Utc::now();
        let claims = Claims {
            sub: *user_id.as_uuid(),
            email: email.to_string(),
            exp: (now + Duration::hours(self.ttl_hours)).timestamp(),
            iat: now.timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| GatewayError::Internal(format!("token encoding failed: {e}")))
    }

    /// Verifies a token and returns its claims.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::TokenExpired`] for expired tokens and
    /// [`GatewayError::InvalidToken`] for any other validation failure.
    pub fn verify(&self, token: &str) -> Result<Claims, GatewayError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => GatewayError::TokenExpired,
                _ => GatewayError::InvalidToken,
            })
    }
}

/// Authenticated user resolved from the `Authorization: Bearer` header.
///
/// Handlers that require authentication take this as an extractor; the
/// rejection is a [`GatewayError`] with the matching 401 code.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The authenticated user's id.
    pub user_id: UserId,
    /// Email from the token claims.
    pub email: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = GatewayError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(GatewayError::MissingCredentials)?;

        let token = header_value
            .strip_prefix("Bearer ")
            .ok_or(GatewayError::MissingCredentials)?;

        let claims = state.auth.verify(token)?;
        Ok(Self {
            user_id: UserId::from_uuid(claims.sub),
            email: claims.email,
        })
    }
}

/// Hashes a password with argon2 and a fresh random salt.
///
/// # Errors
///
/// Returns [`GatewayError::Internal`] if hashing fails.
pub fn hash_password(password: &str) -> Result<String, GatewayError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| GatewayError::Internal(format!("password hashing failed: {e}")))
}

/// Verifies a password against a stored argon2 hash.
///
/// # Errors
///
/// Returns [`GatewayError::Internal`] if the stored hash is malformed.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, GatewayError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| GatewayError::Internal(format!("stored password hash invalid: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_round_trip() {
        let Ok(hash) = hash_password("demo123") else {
            panic!("hashing failed");
        };
        let Ok(matches) = verify_password("demo123", &hash) else {
            panic!("verification errored");
        };
        assert!(matches);

        let Ok(matches) = verify_password("wrong", &hash) else {
            panic!("verification errored");
        };
        assert!(!matches);
    }

    #[test]
    fn token_mint_and_verify() {
        let keys = AuthKeys::new("test-secret", 1);
        let user_id = UserId::new();
        let Ok(token) = keys.mint(user_id, "dev@metaforge.dev") else {
            panic!("mint failed");
        };

        let Ok(claims) = keys.verify(&token) else {
            panic!("verify failed");
        };
        assert_eq!(claims.sub, *user_id.as_uuid());
        assert_eq!(claims.email, "dev@metaforge.dev");
    }

    #[test]
    fn expired_token_gets_a_distinct_error() {
        let keys = AuthKeys::new("test-secret", -2);
        let Ok(token) = keys.mint(UserId::new(), "dev@metaforge.dev") else {
            panic!("mint failed");
        };

        let result = keys.verify(&token);
        assert!(matches!(result, Err(GatewayError::TokenExpired)));
    }

    #[test]
    fn garbage_token_is_invalid() {
        let keys = AuthKeys::new("test-secret", 1);
        let result = keys.verify("not-a-token");
        assert!(matches!(result, Err(GatewayError::InvalidToken)));
    }

    #[test]
    fn token_signed_with_other_secret_is_invalid() {
        let minting = AuthKeys::new("secret-a", 1);
        let verifying = AuthKeys::new("secret-b", 1);
        let Ok(token) = minting.mint(UserId::new(), "dev@metaforge.dev") else {
            panic!("mint failed");
        };

        let result = verifying.verify(&token);
        assert!(matches!(result, Err(GatewayError::InvalidToken)));
    }
}
