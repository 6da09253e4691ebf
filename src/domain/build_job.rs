//! Build job entity for the simulated asset-bundling pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ids::{BuildJobId, ProjectId};

/// Pipeline stage of a build job.
///
/// Jobs move QUEUED → PROCESSING → DONE and never skip a stage. `Error`
/// is the status a job stuck by an external failure would carry; the
/// simulator itself never produces it, but polling clients consume it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildStatus {
    /// Created, waiting for the pipeline to pick it up.
    Queued,
    /// Assets are being bundled.
    Processing,
    /// Terminal success.
    Done,
    /// Terminal failure.
    Error,
}

impl BuildStatus {
    /// Stable string form used for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "QUEUED",
            Self::Processing => "PROCESSING",
            Self::Done => "DONE",
            Self::Error => "ERROR",
        }
    }

    /// Parses the storage string form.
    #[must_use]
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "QUEUED" => Some(Self::Queued),
            "PROCESSING" => Some(Self::Processing),
            "DONE" => Some(Self::Done),
            "ERROR" => Some(Self::Error),
            _ => None,
        }
    }
}

/// A simulated asynchronous pipeline run attached to a project.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildJob {
    /// Unique identifier.
    pub id: BuildJobId,
    /// Project this build belongs to.
    pub project_id: ProjectId,
    /// Current pipeline stage.
    pub status: BuildStatus,
    /// Human-readable log text for the current stage.
    pub logs: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl BuildJob {
    /// Creates a new QUEUED job with the initial log line.
    #[must_use]
    pub fn new(project_id: ProjectId) -> Self {
        Self {
            id: BuildJobId::new(),
            project_id,
            status: BuildStatus::Queued,
            logs: "Build request queued.".to_string(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn new_job_is_queued() {
        let job = BuildJob::new(ProjectId::new());
        assert_eq!(job.status, BuildStatus::Queued);
        assert_eq!(job.logs, "Build request queued.");
    }

    #[test]
    fn status_storage_round_trip() {
        for status in [
            BuildStatus::Queued,
            BuildStatus::Processing,
            BuildStatus::Done,
            BuildStatus::Error,
        ] {
            assert_eq!(BuildStatus::from_str_opt(status.as_str()), Some(status));
        }
        assert_eq!(BuildStatus::from_str_opt("RUNNING"), None);
    }
}
