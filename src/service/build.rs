//! Build pipeline simulator.
//!
//! Simulates a multi-stage asset-bundling pipeline for a project
//! without doing real work: a job row is created QUEUED and two
//! fire-and-forget timers advance it to PROCESSING and DONE. There is
//! no cancellation and no retry; if the process restarts mid-build the
//! job stays at whatever stage it last reached. Clients poll
//! [`BuildService::get_build`].

use std::sync::Arc;
use std::time::Duration;

use crate::config::SimulationConfig;
use crate::domain::{BuildJob, BuildJobId, BuildStatus, ProjectId};
use crate::error::GatewayError;
use crate::persistence::GatewayStore;

/// Creates build jobs and schedules their simulated stage transitions.
#[derive(Debug)]
pub struct BuildService {
    store: Arc<dyn GatewayStore>,
    processing_delay: Duration,
    completion_delay: Duration,
}

impl BuildService {
    /// Creates the simulator with the configured stage delays.
    #[must_use]
    pub fn new(store: Arc<dyn GatewayStore>, sim: &SimulationConfig) -> Self {
        Self {
            store,
            processing_delay: sim.build_processing_delay,
            completion_delay: sim.build_completion_delay,
        }
    }

    /// Creates a QUEUED build job for `project_id` and schedules its
    /// stage transitions. Returns the job id immediately; the pipeline
    /// runs behind the response.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] if the project does not
    /// exist (no job row is created), or [`GatewayError::Persistence`]
    /// on store failure.
    pub async fn create_build(&self, project_id: ProjectId) -> Result<BuildJobId, GatewayError> {
        if self.store.project_by_id(project_id).await?.is_none() {
            return Err(GatewayError::NotFound("project"));
        }

        let job = BuildJob::new(project_id);
        self.store.insert_build_job(&job).await?;
        self.schedule(job.id);

        tracing::info!(job_id = %job.id, project_id = %project_id, "build queued");
        Ok(job.id)
    }

    /// Returns the current stage and log text of a job.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] if the job does not exist.
    pub async fn get_build(&self, id: BuildJobId) -> Result<BuildJob, GatewayError> {
        self.store
            .build_job_by_id(id)
            .await?
            .ok_or(GatewayError::NotFound("build job"))
    }

    /// Schedules both stage timers for a freshly created job. The DONE
    /// timer is measured from creation, not from the PROCESSING edge.
    fn schedule(&self, id: BuildJobId) {
        let store = Arc::clone(&self.store);
        let delay = self.processing_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(err) = store
                .set_build_job_stage(id, BuildStatus::Processing, "Processing assets…")
                .await
            {
                tracing::warn!(job_id = %id, error = %err, "failed to advance build to PROCESSING");
            }
        });

        let store = Arc::clone(&self.store);
        let delay = self.completion_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(err) = store
                .set_build_job_stage(id, BuildStatus::Done, "Build completed successfully.")
                .await
            {
                tracing::warn!(job_id = %id, error = %err, "failed to advance build to DONE");
            }
        });
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::Project;
    use crate::persistence::MemoryStore;
    use tokio_test::assert_ok;

    fn make_service(store: &Arc<MemoryStore>) -> BuildService {
        BuildService::new(
            Arc::clone(store) as Arc<dyn GatewayStore>,
            &SimulationConfig::default(),
        )
    }

    async fn seeded_project(store: &MemoryStore) -> ProjectId {
        let project = Project::new("starter".to_string());
        let id = project.id;
        let Ok(()) = store.insert_project(&project).await else {
            panic!("insert failed");
        };
        id
    }

    #[tokio::test(start_paused = true)]
    async fn missing_project_creates_no_job() {
        let store = Arc::new(MemoryStore::new());
        let service = make_service(&store);

        let result = service.create_build(ProjectId::new()).await;
        assert!(matches!(result, Err(GatewayError::NotFound(_))));
        assert_eq!(store.build_job_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn job_advances_queued_processing_done_in_order() {
        let store = Arc::new(MemoryStore::new());
        let service = make_service(&store);
        let project_id = seeded_project(&store).await;

        let Ok(job_id) = service.create_build(project_id).await else {
            panic!("create failed");
        };

        let Ok(job) = service.get_build(job_id).await else {
            panic!("job missing");
        };
        assert_eq!(job.status, BuildStatus::Queued);
        assert_eq!(job.logs, "Build request queued.");

        // Past the first stage delay but well before completion: the
        // job must be PROCESSING, never skipping ahead.
        tokio::time::sleep(Duration::from_millis(3100)).await;
        let Ok(job) = service.get_build(job_id).await else {
            panic!("job missing");
        };
        assert_eq!(job.status, BuildStatus::Processing);
        assert_eq!(job.logs, "Processing assets…");

        tokio::time::sleep(Duration::from_millis(7100)).await;
        let Ok(job) = service.get_build(job_id).await else {
            panic!("job missing");
        };
        assert_eq!(job.status, BuildStatus::Done);
        assert_eq!(job.logs, "Build completed successfully.");
    }

    #[tokio::test(start_paused = true)]
    async fn get_build_for_unknown_job_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let service = make_service(&store);

        let result = service.get_build(BuildJobId::new()).await;
        assert!(matches!(result, Err(GatewayError::NotFound(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn two_jobs_progress_independently() {
        let store = Arc::new(MemoryStore::new());
        let service = make_service(&store);
        let project_id = seeded_project(&store).await;

        let first = assert_ok!(service.create_build(project_id).await);
        tokio::time::sleep(Duration::from_millis(5000)).await;
        let second = assert_ok!(service.create_build(project_id).await);

        tokio::time::sleep(Duration::from_millis(5100)).await;
        // First job is past its completion delay; second is mid-flight.
        let Ok(first_job) = service.get_build(first).await else {
            panic!("job missing");
        };
        let Ok(second_job) = service.get_build(second).await else {
            panic!("job missing");
        };
        assert_eq!(first_job.status, BuildStatus::Done);
        assert_eq!(second_job.status, BuildStatus::Processing);
    }
}
