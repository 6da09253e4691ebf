//! Project endpoint handler.
//!
//! The builder surface maintains a single well-known project, upserted
//! by name: saving replaces all three asset slots wholesale.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;

use crate::api::dto::{ProjectDto, ProjectResponse, SaveProjectRequest};
use crate::app_state::AppState;
use crate::domain::Project;
use crate::error::{ErrorResponse, GatewayError};

/// Name of the single project the builder surface works against.
pub const DEFAULT_PROJECT_NAME: &str = "builder default";

/// `POST /api/project` — Create or update the default project.
///
/// # Errors
///
/// Returns [`GatewayError::Persistence`] on store failure.
#[utoipa::path(
    post,
    path = "/api/project",
    tag = "Projects",
    summary = "Save the default project",
    description = "Upserts the well-known builder project, replacing all three asset slots with the given ids (omitted slots are cleared).",
    request_body = SaveProjectRequest,
    responses(
        (status = 200, description = "Saved project", body = ProjectResponse),
        (status = 400, description = "Invalid payload", body = ErrorResponse),
    )
)]
pub async fn save_project(
    State(state): State<AppState>,
    Json(req): Json<SaveProjectRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let project = match state.store.project_by_name(DEFAULT_PROJECT_NAME).await? {
        Some(mut existing) => {
            existing.character_id = req.character_id;
            existing.model_id = req.model_id;
            existing.world_map_id = req.world_map_id;
            existing.updated_at = Utc::now();
            state.store.update_project(&existing).await?;
            existing
        }
        None => {
            let mut project = Project::new(DEFAULT_PROJECT_NAME.to_string());
            project.character_id = req.character_id;
            project.model_id = req.model_id;
            project.world_map_id = req.world_map_id;
            state.store.insert_project(&project).await?;
            project
        }
    };

    Ok(Json(ProjectResponse {
        project: ProjectDto::from(project),
    }))
}

/// Project routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/project", post(save_project))
}
