//! Authentication endpoint handlers: signup, login, current user.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::auth::{self, AuthUser};
use crate::api::dto::{AuthResponse, CredentialsRequest, UserDto};
use crate::app_state::AppState;
use crate::domain::{Subscription, User};
use crate::error::{ErrorResponse, GatewayError};

fn validate_credentials(req: &CredentialsRequest) -> Result<(), GatewayError> {
    if !req.email.contains('@') {
        return Err(GatewayError::Validation(
            "a valid email is required".to_string(),
        ));
    }
    if req.password.len() < 6 {
        return Err(GatewayError::Validation(
            "password must be at least 6 characters long".to_string(),
        ));
    }
    Ok(())
}

/// `POST /api/auth/signup` — Register an account.
///
/// Also provisions the 1:1 INDIE subscription with its default
/// allowance.
///
/// # Errors
///
/// Returns [`GatewayError::EmailTaken`] for an already-registered
/// email, or [`GatewayError::Validation`] for malformed credentials.
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    tag = "Auth",
    summary = "Register an account",
    request_body = CredentialsRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Malformed credentials", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    validate_credentials(&req)?;

    if state.store.user_by_email(&req.email).await?.is_some() {
        return Err(GatewayError::EmailTaken);
    }

    let password_hash = auth::hash_password(&req.password)?;
    let user = User::new(req.email, password_hash);
    state.store.insert_user(&user).await?;

    let subscription = Subscription::new(user.id);
    state.store.insert_subscription(&subscription).await?;

    let token = state.auth.mint(user.id, &user.email)?;
    tracing::info!(user_id = %user.id, "account created");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: UserDto::from(user),
        }),
    ))
}

/// `POST /api/auth/login` — Exchange credentials for a bearer token.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidCredentials`] when the email is
/// unknown or the password does not match.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    summary = "Log in",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Authenticated", body = AuthResponse),
        (status = 401, description = "Invalid email or password", body = ErrorResponse),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let user = state
        .store
        .user_by_email(&req.email)
        .await?
        .ok_or(GatewayError::InvalidCredentials)?;

    if !auth::verify_password(&req.password, &user.password_hash)? {
        return Err(GatewayError::InvalidCredentials);
    }

    let token = state.auth.mint(user.id, &user.email)?;
    Ok(Json(AuthResponse {
        token,
        user: UserDto::from(user),
    }))
}

/// `GET /api/auth/me` — The authenticated user.
///
/// # Errors
///
/// Returns [`GatewayError::NotFound`] if the token's user no longer
/// exists.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    summary = "Current user",
    responses(
        (status = 200, description = "The authenticated user", body = UserDto),
        (status = 401, description = "Missing or invalid credentials", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
    )
)]
pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, GatewayError> {
    let user = state
        .store
        .user_by_id(user.user_id)
        .await?
        .ok_or(GatewayError::NotFound("user"))?;
    Ok(Json(UserDto::from(user)))
}

/// Auth routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
}
