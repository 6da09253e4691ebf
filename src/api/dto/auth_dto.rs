//! Authentication DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{User, UserId};

/// Request body for `POST /api/auth/signup` and `POST /api/auth/login`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CredentialsRequest {
    /// Login email.
    pub email: String,
    /// Plain-text password; hashed server-side, minimum 6 characters.
    pub password: String,
}

/// Public user representation.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserDto {
    /// Unique identifier.
    pub id: UserId,
    /// Login email.
    pub email: String,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
        }
    }
}

/// Response body for successful signup and login.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    /// Bearer token for subsequent requests.
    pub token: String,
    /// The authenticated user.
    pub user: UserDto,
}
