//! Metaverse lifecycle manager.
//!
//! Enforces legal status transitions and simulates provisioning and
//! deprovisioning latency. Every action has an immediate half (validated
//! against the current status, then written) and a delayed half that
//! commits through [`GatewayStore::compare_and_set_status`]: the delayed
//! effect names the status it assumes and silently no-ops when the row
//! was changed or deleted underneath. That re-validation is the one
//! ordering guarantee this system provides and must hold for every
//! delayed transition.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::SimulationConfig;
use crate::domain::{Metaverse, MetaverseId, MetaverseKind, MetaverseStatus, Region, UserId};
use crate::error::GatewayError;
use crate::persistence::GatewayStore;
use crate::service::UsageTracker;

/// Inclusive range of simulated concurrent players on a fresh RUNNING
/// instance.
const PLAYERS_RANGE: std::ops::RangeInclusive<i32> = 5..=24;

/// Drives the STOPPED/STARTING/RUNNING/STOPPING/ERROR state machine.
///
/// Holds no durable state of its own: the store owns the rows, the
/// [`UsageTracker`] owns the per-id tick registrations, and the delayed
/// transitions live in spawned tasks that re-validate before writing.
/// Spawned transitions are not cancellable; the state re-check is what
/// keeps a stale timer from clobbering a row.
#[derive(Debug)]
pub struct LifecycleService {
    store: Arc<dyn GatewayStore>,
    tracker: Arc<UsageTracker>,
    sim: SimulationConfig,
    rng: Arc<Mutex<StdRng>>,
}

fn lock_rng(rng: &Mutex<StdRng>) -> MutexGuard<'_, StdRng> {
    rng.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Samples the outcome of a start resolution: ERROR with probability
/// `error_rate`, otherwise RUNNING with a fresh player count.
fn sample_start_outcome(rng: &Mutex<StdRng>, error_rate: f64) -> (MetaverseStatus, i32) {
    let mut rng = lock_rng(rng);
    if rng.gen_bool(error_rate) {
        (MetaverseStatus::Error, 0)
    } else {
        (MetaverseStatus::Running, rng.gen_range(PLAYERS_RANGE))
    }
}

impl LifecycleService {
    /// Creates the lifecycle manager. The outcome RNG is seeded from
    /// `sim.rng_seed` when set, from OS entropy otherwise.
    #[must_use]
    pub fn new(store: Arc<dyn GatewayStore>, tracker: Arc<UsageTracker>, sim: SimulationConfig) -> Self {
        let rng = match sim.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            store,
            tracker,
            sim,
            rng: Arc::new(Mutex::new(rng)),
        }
    }

    /// Returns the usage tracker this manager arms and disarms.
    #[must_use]
    pub fn tracker(&self) -> &Arc<UsageTracker> {
        &self.tracker
    }

    /// Creates a new metaverse in the STOPPED state.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Validation`] on an empty name, or
    /// [`GatewayError::Persistence`] on store failure.
    pub async fn create(
        &self,
        user_id: UserId,
        name: &str,
        kind: MetaverseKind,
        region: Option<Region>,
    ) -> Result<Metaverse, GatewayError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GatewayError::Validation("name is required".to_string()));
        }

        let metaverse = Metaverse::new(
            user_id,
            name.to_string(),
            kind,
            region.unwrap_or(Region::Asia),
        );
        self.store.insert_metaverse(&metaverse).await?;
        tracing::info!(metaverse_id = %metaverse.id, name, "metaverse created");
        Ok(metaverse)
    }

    /// Starts a metaverse: STOPPED/ERROR → STARTING now, then RUNNING
    /// (with a fresh player count) or ERROR after the provisioning
    /// delay. Usage tracking begins if the instance reaches RUNNING.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] if the instance does not
    /// exist or belongs to someone else, or
    /// [`GatewayError::InvalidTransition`] if the current status does
    /// not allow starting.
    pub async fn start(
        &self,
        id: MetaverseId,
        user_id: UserId,
    ) -> Result<Metaverse, GatewayError> {
        let metaverse = self
            .store
            .metaverse_owned(id, user_id)
            .await?
            .ok_or(GatewayError::NotFound("metaverse"))?;

        if !metaverse.status.can_start() {
            return Err(GatewayError::InvalidTransition {
                action: "start",
                required: "STOPPED or ERROR",
            });
        }

        self.store
            .set_metaverse_status(id, MetaverseStatus::Starting)
            .await?;
        self.spawn_start_resolution(id);

        tracing::info!(metaverse_id = %id, "metaverse starting");
        self.reload(id).await
    }

    /// Stops a metaverse: RUNNING/ERROR → STOPPING now, then STOPPED
    /// (players reset to zero) after the deprovisioning delay. Usage
    /// tracking is torn down immediately.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] if the instance does not
    /// exist or belongs to someone else, or
    /// [`GatewayError::InvalidTransition`] if the current status does
    /// not allow stopping.
    pub async fn stop(&self, id: MetaverseId, user_id: UserId) -> Result<Metaverse, GatewayError> {
        let metaverse = self
            .store
            .metaverse_owned(id, user_id)
            .await?
            .ok_or(GatewayError::NotFound("metaverse"))?;

        if !metaverse.status.can_stop() {
            return Err(GatewayError::InvalidTransition {
                action: "stop",
                required: "RUNNING or ERROR",
            });
        }

        self.tracker.stop_tracking(id);
        self.store
            .set_metaverse_status(id, MetaverseStatus::Stopping)
            .await?;

        let store = Arc::clone(&self.store);
        let delay = self.sim.stop_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match store
                .compare_and_set_status(
                    id,
                    MetaverseStatus::Stopping,
                    MetaverseStatus::Stopped,
                    Some(0),
                )
                .await
            {
                Ok(true) => {}
                Ok(false) => {
                    tracing::debug!(metaverse_id = %id, "stop resolution skipped; state changed");
                }
                Err(err) => {
                    tracing::warn!(metaverse_id = %id, error = %err, "stop resolution failed");
                }
            }
        });

        tracing::info!(metaverse_id = %id, "metaverse stopping");
        self.reload(id).await
    }

    /// Restarts a RUNNING metaverse: STOPPING now, then STARTING after
    /// one phase delay, then RUNNING (fresh player count) after another.
    /// Restart resolutions never fail; only `start` simulates flaky
    /// provisioning.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] if the instance does not
    /// exist or belongs to someone else, or
    /// [`GatewayError::InvalidTransition`] if it is not RUNNING.
    pub async fn restart(
        &self,
        id: MetaverseId,
        user_id: UserId,
    ) -> Result<Metaverse, GatewayError> {
        let metaverse = self
            .store
            .metaverse_owned(id, user_id)
            .await?
            .ok_or(GatewayError::NotFound("metaverse"))?;

        if !metaverse.status.can_restart() {
            return Err(GatewayError::InvalidTransition {
                action: "restart",
                required: "RUNNING",
            });
        }

        self.tracker.stop_tracking(id);
        self.store
            .set_metaverse_status(id, MetaverseStatus::Stopping)
            .await?;

        let store = Arc::clone(&self.store);
        let tracker = Arc::clone(&self.tracker);
        let rng = Arc::clone(&self.rng);
        let phase = self.sim.restart_phase_delay;
        tokio::spawn(async move {
            tokio::time::sleep(phase).await;
            let advanced = match store
                .compare_and_set_status(
                    id,
                    MetaverseStatus::Stopping,
                    MetaverseStatus::Starting,
                    None,
                )
                .await
            {
                Ok(applied) => applied,
                Err(err) => {
                    tracing::warn!(metaverse_id = %id, error = %err, "restart phase failed");
                    return;
                }
            };
            if !advanced {
                tracing::debug!(metaverse_id = %id, "restart aborted; state changed while stopping");
                return;
            }

            tokio::time::sleep(phase).await;
            let players = lock_rng(&rng).gen_range(PLAYERS_RANGE);
            match store
                .compare_and_set_status(
                    id,
                    MetaverseStatus::Starting,
                    MetaverseStatus::Running,
                    Some(players),
                )
                .await
            {
                Ok(true) => tracker.start_tracking(id),
                Ok(false) => {
                    tracing::debug!(metaverse_id = %id, "restart aborted; state changed while starting");
                }
                Err(err) => {
                    tracing::warn!(metaverse_id = %id, error = %err, "restart resolution failed");
                }
            }
        });

        tracing::info!(metaverse_id = %id, "metaverse restarting");
        self.reload(id).await
    }

    /// Deletes a metaverse from any status. Tracking is torn down
    /// unconditionally; any in-flight delayed transition will find the
    /// row gone and no-op.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] if the instance does not
    /// exist or belongs to someone else.
    pub async fn delete(&self, id: MetaverseId, user_id: UserId) -> Result<(), GatewayError> {
        self.store
            .metaverse_owned(id, user_id)
            .await?
            .ok_or(GatewayError::NotFound("metaverse"))?;

        self.tracker.stop_tracking(id);
        self.store.delete_metaverse(id).await?;
        tracing::info!(metaverse_id = %id, "metaverse deleted");
        Ok(())
    }

    fn spawn_start_resolution(&self, id: MetaverseId) {
        let store = Arc::clone(&self.store);
        let tracker = Arc::clone(&self.tracker);
        let rng = Arc::clone(&self.rng);
        let delay = self.sim.start_delay;
        let error_rate = self.sim.start_error_rate;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let (next, players) = sample_start_outcome(&rng, error_rate);
            match store
                .compare_and_set_status(id, MetaverseStatus::Starting, next, Some(players))
                .await
            {
                Ok(true) => {
                    if next == MetaverseStatus::Running {
                        tracker.start_tracking(id);
                    }
                }
                Ok(false) => {
                    tracing::debug!(metaverse_id = %id, "start resolution skipped; state changed");
                }
                Err(err) => {
                    tracing::warn!(metaverse_id = %id, error = %err, "start resolution failed");
                }
            }
        });
    }

    async fn reload(&self, id: MetaverseId) -> Result<Metaverse, GatewayError> {
        self.store
            .metaverse_by_id(id)
            .await?
            .ok_or(GatewayError::NotFound("metaverse"))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::persistence::MemoryStore;

    fn make_service(store: &Arc<MemoryStore>, error_rate: f64) -> LifecycleService {
        let sim = SimulationConfig {
            start_error_rate: error_rate,
            rng_seed: Some(42),
            ..SimulationConfig::default()
        };
        let tracker = Arc::new(UsageTracker::new(
            Arc::clone(store) as Arc<dyn GatewayStore>,
            sim.usage_tick_period,
        ));
        LifecycleService::new(Arc::clone(store) as Arc<dyn GatewayStore>, tracker, sim)
    }

    async fn insert_with_status(
        store: &MemoryStore,
        user_id: UserId,
        status: MetaverseStatus,
        players: i32,
    ) -> MetaverseId {
        let mut m = Metaverse::new(
            user_id,
            "Test".to_string(),
            MetaverseKind::ThreeD,
            Region::Asia,
        );
        m.status = status;
        m.players_online = players;
        let id = m.id;
        let Ok(()) = store.insert_metaverse(&m).await else {
            panic!("insert failed");
        };
        id
    }

    /// Past the configured resolution delay, with a little slack.
    const AFTER_START: Duration = Duration::from_millis(2100);
    const AFTER_STOP: Duration = Duration::from_millis(2100);
    const AFTER_RESTART_PHASE: Duration = Duration::from_millis(1100);

    #[tokio::test(start_paused = true)]
    async fn create_defaults_to_stopped_in_asia() {
        let store = Arc::new(MemoryStore::new());
        let service = make_service(&store, 0.0);
        let user = UserId::new();

        let result = service
            .create(user, "Test", MetaverseKind::ThreeD, None)
            .await;
        let Ok(m) = result else {
            panic!("create failed");
        };
        assert_eq!(m.status, MetaverseStatus::Stopped);
        assert_eq!(m.region, Region::Asia);
        assert_eq!(m.players_online, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn create_rejects_blank_name() {
        let store = Arc::new(MemoryStore::new());
        let service = make_service(&store, 0.0);

        let result = service
            .create(UserId::new(), "   ", MetaverseKind::TwoD, None)
            .await;
        assert!(matches!(result, Err(GatewayError::Validation(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn start_moves_to_starting_then_running() {
        let store = Arc::new(MemoryStore::new());
        let service = make_service(&store, 0.0);
        let user = UserId::new();
        let id = insert_with_status(&store, user, MetaverseStatus::Stopped, 0).await;

        let Ok(m) = service.start(id, user).await else {
            panic!("start failed");
        };
        assert_eq!(m.status, MetaverseStatus::Starting);

        tokio::time::sleep(AFTER_START).await;
        let Ok(Some(m)) = store.metaverse_by_id(id).await else {
            panic!("row vanished");
        };
        assert_eq!(m.status, MetaverseStatus::Running);
        assert!((5..=24).contains(&m.players_online));
        assert!(service.tracker().is_tracking(id));
    }

    #[tokio::test(start_paused = true)]
    async fn start_can_resolve_to_error() {
        let store = Arc::new(MemoryStore::new());
        let service = make_service(&store, 1.0);
        let user = UserId::new();
        let id = insert_with_status(&store, user, MetaverseStatus::Error, 0).await;

        let Ok(m) = service.start(id, user).await else {
            panic!("start failed");
        };
        assert_eq!(m.status, MetaverseStatus::Starting);

        tokio::time::sleep(AFTER_START).await;
        let Ok(Some(m)) = store.metaverse_by_id(id).await else {
            panic!("row vanished");
        };
        assert_eq!(m.status, MetaverseStatus::Error);
        assert_eq!(m.players_online, 0);
        assert!(!service.tracker().is_tracking(id));
    }

    #[tokio::test(start_paused = true)]
    async fn start_rejected_outside_stopped_or_error() {
        let store = Arc::new(MemoryStore::new());
        let service = make_service(&store, 0.0);
        let user = UserId::new();

        for status in [
            MetaverseStatus::Starting,
            MetaverseStatus::Running,
            MetaverseStatus::Stopping,
        ] {
            let id = insert_with_status(&store, user, status, 0).await;
            let result = service.start(id, user).await;
            assert!(
                matches!(result, Err(GatewayError::InvalidTransition { .. })),
                "start from {status} must be rejected"
            );
            let Ok(Some(m)) = store.metaverse_by_id(id).await else {
                panic!("row vanished");
            };
            assert_eq!(m.status, status, "rejected start must not mutate");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn start_on_foreign_instance_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let service = make_service(&store, 0.0);
        let id = insert_with_status(&store, UserId::new(), MetaverseStatus::Stopped, 0).await;

        let result = service.start(id, UserId::new()).await;
        assert!(matches!(result, Err(GatewayError::NotFound(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn delete_while_starting_does_not_resurrect_the_row() {
        let store = Arc::new(MemoryStore::new());
        let service = make_service(&store, 0.0);
        let user = UserId::new();
        let id = insert_with_status(&store, user, MetaverseStatus::Stopped, 0).await;

        let Ok(_) = service.start(id, user).await else {
            panic!("start failed");
        };
        let Ok(()) = service.delete(id, user).await else {
            panic!("delete failed");
        };
        assert!(!service.tracker().is_tracking(id));

        // The in-flight resolution fires, finds no STARTING row, and
        // must leave nothing behind.
        tokio::time::sleep(AFTER_START).await;
        let Ok(row) = store.metaverse_by_id(id).await else {
            panic!("store error");
        };
        assert!(row.is_none());
        assert!(!service.tracker().is_tracking(id));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_moves_to_stopping_then_stopped() {
        let store = Arc::new(MemoryStore::new());
        let service = make_service(&store, 0.0);
        let user = UserId::new();
        let id = insert_with_status(&store, user, MetaverseStatus::Running, 12).await;
        service.tracker().start_tracking(id);

        let Ok(m) = service.stop(id, user).await else {
            panic!("stop failed");
        };
        assert_eq!(m.status, MetaverseStatus::Stopping);
        assert!(!service.tracker().is_tracking(id));

        tokio::time::sleep(AFTER_STOP).await;
        let Ok(Some(m)) = store.metaverse_by_id(id).await else {
            panic!("row vanished");
        };
        assert_eq!(m.status, MetaverseStatus::Stopped);
        assert_eq!(m.players_online, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_resolution_yields_to_concurrent_changes() {
        let store = Arc::new(MemoryStore::new());
        let service = make_service(&store, 0.0);
        let user = UserId::new();
        let id = insert_with_status(&store, user, MetaverseStatus::Running, 8).await;

        let Ok(_) = service.stop(id, user).await else {
            panic!("stop failed");
        };
        // Something else moves the row before the timer fires.
        let Ok(()) = store
            .set_metaverse_status(id, MetaverseStatus::Running)
            .await
        else {
            panic!("status update failed");
        };

        tokio::time::sleep(AFTER_STOP).await;
        let Ok(Some(m)) = store.metaverse_by_id(id).await else {
            panic!("row vanished");
        };
        assert_eq!(m.status, MetaverseStatus::Running, "stale timer must no-op");
        assert_eq!(m.players_online, 8);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_cycles_through_both_phases() {
        let store = Arc::new(MemoryStore::new());
        let service = make_service(&store, 0.0);
        let user = UserId::new();
        let id = insert_with_status(&store, user, MetaverseStatus::Running, 7).await;
        service.tracker().start_tracking(id);

        let Ok(m) = service.restart(id, user).await else {
            panic!("restart failed");
        };
        assert_eq!(m.status, MetaverseStatus::Stopping);
        assert!(!service.tracker().is_tracking(id));

        tokio::time::sleep(AFTER_RESTART_PHASE).await;
        let Ok(Some(m)) = store.metaverse_by_id(id).await else {
            panic!("row vanished");
        };
        assert_eq!(m.status, MetaverseStatus::Starting);

        tokio::time::sleep(AFTER_RESTART_PHASE).await;
        let Ok(Some(m)) = store.metaverse_by_id(id).await else {
            panic!("row vanished");
        };
        assert_eq!(m.status, MetaverseStatus::Running);
        assert!((5..=24).contains(&m.players_online));
        assert!(service.tracker().is_tracking(id));
    }

    #[tokio::test(start_paused = true)]
    async fn restart_requires_running() {
        let store = Arc::new(MemoryStore::new());
        let service = make_service(&store, 0.0);
        let user = UserId::new();
        let id = insert_with_status(&store, user, MetaverseStatus::Stopped, 0).await;

        let result = service.restart(id, user).await;
        assert!(matches!(result, Err(GatewayError::InvalidTransition { .. })));
    }
}
