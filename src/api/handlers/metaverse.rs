//! Metaverse endpoint handlers: CRUD plus lifecycle actions.
//!
//! All endpoints here require a bearer-token-identified user; rows are
//! always scoped to the authenticated owner.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};

use crate::api::auth::AuthUser;
use crate::api::dto::{CreateMetaverseRequest, MetaverseDto};
use crate::app_state::AppState;
use crate::domain::MetaverseId;
use crate::error::{ErrorResponse, GatewayError};

/// `POST /api/metaverses` — Create a metaverse in the STOPPED state.
///
/// # Errors
///
/// Returns [`GatewayError`] on a blank name or store failure.
#[utoipa::path(
    post,
    path = "/api/metaverses",
    tag = "Metaverses",
    summary = "Create a metaverse",
    description = "Creates a new instance owned by the authenticated user. Region defaults to ASIA. The instance starts STOPPED with zeroed counters.",
    request_body = CreateMetaverseRequest,
    responses(
        (status = 201, description = "Metaverse created", body = MetaverseDto),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Missing or invalid credentials", body = ErrorResponse),
    )
)]
pub async fn create_metaverse(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateMetaverseRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let metaverse = state
        .lifecycle
        .create(user.user_id, &req.name, req.kind, req.region)
        .await?;
    Ok((StatusCode::CREATED, Json(MetaverseDto::from(metaverse))))
}

/// `GET /api/metaverses` — List the caller's metaverses, newest first.
///
/// # Errors
///
/// Returns [`GatewayError`] on store failure.
#[utoipa::path(
    get,
    path = "/api/metaverses",
    tag = "Metaverses",
    summary = "List metaverses",
    description = "Returns every instance owned by the authenticated user, newest first.",
    responses(
        (status = 200, description = "Instance list", body = Vec<MetaverseDto>),
        (status = 401, description = "Missing or invalid credentials", body = ErrorResponse),
    )
)]
pub async fn list_metaverses(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, GatewayError> {
    let metaverses = state.store.metaverses_by_user(user.user_id).await?;
    let dtos: Vec<MetaverseDto> = metaverses.into_iter().map(MetaverseDto::from).collect();
    Ok(Json(dtos))
}

/// `GET /api/metaverses/:id` — Get one metaverse.
///
/// # Errors
///
/// Returns [`GatewayError::NotFound`] if the instance does not exist or
/// belongs to someone else.
#[utoipa::path(
    get,
    path = "/api/metaverses/{id}",
    tag = "Metaverses",
    summary = "Get a metaverse",
    params(("id" = uuid::Uuid, Path, description = "Metaverse UUID")),
    responses(
        (status = 200, description = "Instance details", body = MetaverseDto),
        (status = 404, description = "Metaverse not found", body = ErrorResponse),
        (status = 401, description = "Missing or invalid credentials", body = ErrorResponse),
    )
)]
pub async fn get_metaverse(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let metaverse = state
        .store
        .metaverse_owned(MetaverseId::from_uuid(id), user.user_id)
        .await?
        .ok_or(GatewayError::NotFound("metaverse"))?;
    Ok(Json(MetaverseDto::from(metaverse)))
}

/// `POST /api/metaverses/start/:id` — Start a STOPPED or ERROR instance.
///
/// The response carries the immediate STARTING status; the resolved
/// RUNNING/ERROR status arrives only via a subsequent GET.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidTransition`] if the instance is not
/// startable, or [`GatewayError::NotFound`] if it does not exist.
#[utoipa::path(
    post,
    path = "/api/metaverses/start/{id}",
    tag = "Metaverses",
    summary = "Start a metaverse",
    params(("id" = uuid::Uuid, Path, description = "Metaverse UUID")),
    responses(
        (status = 200, description = "Instance is STARTING", body = MetaverseDto),
        (status = 400, description = "Not startable from the current status", body = ErrorResponse),
        (status = 404, description = "Metaverse not found", body = ErrorResponse),
    )
)]
pub async fn start_metaverse(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let metaverse = state
        .lifecycle
        .start(MetaverseId::from_uuid(id), user.user_id)
        .await?;
    Ok(Json(MetaverseDto::from(metaverse)))
}

/// `POST /api/metaverses/stop/:id` — Stop a RUNNING or ERROR instance.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidTransition`] if the instance is not
/// stoppable, or [`GatewayError::NotFound`] if it does not exist.
#[utoipa::path(
    post,
    path = "/api/metaverses/stop/{id}",
    tag = "Metaverses",
    summary = "Stop a metaverse",
    params(("id" = uuid::Uuid, Path, description = "Metaverse UUID")),
    responses(
        (status = 200, description = "Instance is STOPPING", body = MetaverseDto),
        (status = 400, description = "Not stoppable from the current status", body = ErrorResponse),
        (status = 404, description = "Metaverse not found", body = ErrorResponse),
    )
)]
pub async fn stop_metaverse(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let metaverse = state
        .lifecycle
        .stop(MetaverseId::from_uuid(id), user.user_id)
        .await?;
    Ok(Json(MetaverseDto::from(metaverse)))
}

/// `POST /api/metaverses/restart/:id` — Restart a RUNNING instance.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidTransition`] if the instance is not
/// RUNNING, or [`GatewayError::NotFound`] if it does not exist.
#[utoipa::path(
    post,
    path = "/api/metaverses/restart/{id}",
    tag = "Metaverses",
    summary = "Restart a metaverse",
    params(("id" = uuid::Uuid, Path, description = "Metaverse UUID")),
    responses(
        (status = 200, description = "Instance is STOPPING on its way back up", body = MetaverseDto),
        (status = 400, description = "Instance is not RUNNING", body = ErrorResponse),
        (status = 404, description = "Metaverse not found", body = ErrorResponse),
    )
)]
pub async fn restart_metaverse(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let metaverse = state
        .lifecycle
        .restart(MetaverseId::from_uuid(id), user.user_id)
        .await?;
    Ok(Json(MetaverseDto::from(metaverse)))
}

/// `DELETE /api/metaverses/delete/:id` — Delete an instance from any
/// status.
///
/// # Errors
///
/// Returns [`GatewayError::NotFound`] if the instance does not exist.
#[utoipa::path(
    delete,
    path = "/api/metaverses/delete/{id}",
    tag = "Metaverses",
    summary = "Delete a metaverse",
    params(("id" = uuid::Uuid, Path, description = "Metaverse UUID")),
    responses(
        (status = 204, description = "Metaverse deleted"),
        (status = 404, description = "Metaverse not found", body = ErrorResponse),
    )
)]
pub async fn delete_metaverse(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    state
        .lifecycle
        .delete(MetaverseId::from_uuid(id), user.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Metaverse routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/metaverses", post(create_metaverse).get(list_metaverses))
        .route("/metaverses/{id}", get(get_metaverse))
        .route("/metaverses/start/{id}", post(start_metaverse))
        .route("/metaverses/stop/{id}", post(stop_metaverse))
        .route("/metaverses/restart/{id}", post(restart_metaverse))
        .route("/metaverses/delete/{id}", delete(delete_metaverse))
}
