//! Build pipeline DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{BuildJob, BuildJobId, BuildStatus, ProjectId};

/// Request body for `POST /api/build`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBuildRequest {
    /// Project to build.
    pub project_id: ProjectId,
}

/// Response body for `POST /api/build` (201 Created).
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBuildResponse {
    /// Identifier to poll via `GET /api/build/{jobId}`.
    pub job_id: BuildJobId,
}

/// Response body for `GET /api/build/{jobId}`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BuildStatusResponse {
    /// Current pipeline stage.
    pub status: BuildStatus,
    /// Human-readable log text for the current stage.
    pub logs: String,
}

impl From<BuildJob> for BuildStatusResponse {
    fn from(job: BuildJob) -> Self {
        Self {
            status: job.status,
            logs: job.logs,
        }
    }
}
