//! Build pipeline endpoint handlers.
//!
//! Build creation is fire-and-forget: the response returns the job id
//! immediately and clients poll for the stage. Polling exhaustion is a
//! client-side UX fallback, not a server-side failure.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{BuildStatusResponse, CreateBuildRequest, CreateBuildResponse};
use crate::app_state::AppState;
use crate::domain::BuildJobId;
use crate::error::{ErrorResponse, GatewayError};

/// `POST /api/build` — Queue a build for a project.
///
/// # Errors
///
/// Returns [`GatewayError::NotFound`] if the project does not exist; no
/// job row is created in that case.
#[utoipa::path(
    post,
    path = "/api/build",
    tag = "Builds",
    summary = "Queue a build",
    description = "Creates a QUEUED build job for the project and schedules the simulated pipeline. Returns the job id immediately.",
    request_body = CreateBuildRequest,
    responses(
        (status = 201, description = "Build queued", body = CreateBuildResponse),
        (status = 404, description = "Project not found", body = ErrorResponse),
    )
)]
pub async fn create_build(
    State(state): State<AppState>,
    Json(req): Json<CreateBuildRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let job_id = state.builds.create_build(req.project_id).await?;
    Ok((StatusCode::CREATED, Json(CreateBuildResponse { job_id })))
}

/// `GET /api/build/:jobId` — Poll a build job's stage and logs.
///
/// # Errors
///
/// Returns [`GatewayError::NotFound`] if the job does not exist.
#[utoipa::path(
    get,
    path = "/api/build/{jobId}",
    tag = "Builds",
    summary = "Poll a build job",
    params(("jobId" = uuid::Uuid, Path, description = "Build job UUID")),
    responses(
        (status = 200, description = "Current stage and logs", body = BuildStatusResponse),
        (status = 404, description = "Build job not found", body = ErrorResponse),
    )
)]
pub async fn get_build(
    State(state): State<AppState>,
    Path(job_id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let job = state.builds.get_build(BuildJobId::from_uuid(job_id)).await?;
    Ok(Json(BuildStatusResponse::from(job)))
}

/// Build routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/build", post(create_build))
        .route("/build/{jobId}", get(get_build))
}
