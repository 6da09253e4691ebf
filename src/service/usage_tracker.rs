//! Background usage metering for RUNNING metaverse instances.
//!
//! While an instance is RUNNING, one periodic task per instance accrues
//! uptime and converts online-player-minutes into whole hours used.
//! Registrations are purely in-process: they are torn down on
//! stop/delete/shutdown and are NOT persisted, so after a process
//! restart a RUNNING row stops accruing usage until a lifecycle action
//! re-arms tracking.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};

use crate::domain::{MetaverseId, MetaverseStatus};
use crate::persistence::GatewayStore;

/// An active tracking registration. The sequence number lets a tick task
/// deregister itself without racing a newer registration for the same id.
#[derive(Debug)]
struct Registration {
    seq: u64,
    handle: JoinHandle<()>,
}

/// Accrues usage counters for RUNNING instances on a fixed tick.
///
/// One registration per metaverse id, owned by this table — not a
/// process-wide singleton. Arming an id that is already tracked first
/// cancels the existing registration (idempotent re-arm).
///
/// Each tick re-fetches the instance; if it is no longer RUNNING the
/// task deregisters itself and stops. That self-check is the tracker's
/// only failure-recovery mechanism.
#[derive(Debug)]
pub struct UsageTracker {
    store: Arc<dyn GatewayStore>,
    period: Duration,
    registrations: Arc<Mutex<HashMap<MetaverseId, Registration>>>,
    next_seq: AtomicU64,
}

fn lock_registrations(
    registrations: &Mutex<HashMap<MetaverseId, Registration>>,
) -> MutexGuard<'_, HashMap<MetaverseId, Registration>> {
    registrations.lock().unwrap_or_else(PoisonError::into_inner)
}

impl UsageTracker {
    /// Creates a tracker with the given tick period. Each tick accounts
    /// for one minute of uptime regardless of the configured period.
    #[must_use]
    pub fn new(store: Arc<dyn GatewayStore>, period: Duration) -> Self {
        Self {
            store,
            period,
            registrations: Arc::new(Mutex::new(HashMap::new())),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Arms usage tracking for `id`. Cancels any existing registration
    /// for the same id first, so exactly one periodic task is active
    /// per instance.
    pub fn start_tracking(&self, id: MetaverseId) {
        self.stop_tracking(id);

        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let store = Arc::clone(&self.store);
        let registrations = Arc::clone(&self.registrations);
        let period = self.period;

        let handle = tokio::spawn(async move {
            // First tick one full period after arming.
            let mut ticks = interval_at(Instant::now() + period, period);
            loop {
                ticks.tick().await;
                match store.metaverse_by_id(id).await {
                    Ok(Some(m)) if m.status == MetaverseStatus::Running => {
                        // One minute of uptime per tick. Whole player-hours
                        // only: 60 concurrent players for one minute buy one
                        // hour; anything below 60 contributes nothing this
                        // tick and the remainder is not carried forward.
                        let hours = m.players_online / 60;
                        if let Err(err) = store.add_metaverse_usage(id, 1, hours).await {
                            tracing::warn!(metaverse_id = %id, error = %err, "usage update failed; detaching tracker");
                            deregister(&registrations, id, seq);
                            break;
                        }
                    }
                    Ok(_) => {
                        tracing::debug!(metaverse_id = %id, "instance no longer running; detaching tracker");
                        deregister(&registrations, id, seq);
                        break;
                    }
                    Err(err) => {
                        tracing::warn!(metaverse_id = %id, error = %err, "usage probe failed; detaching tracker");
                        deregister(&registrations, id, seq);
                        break;
                    }
                }
            }
        });

        lock_registrations(&self.registrations).insert(id, Registration { seq, handle });
    }

    /// Cancels the registration for `id`, if any. Idempotent.
    pub fn stop_tracking(&self, id: MetaverseId) {
        if let Some(registration) = lock_registrations(&self.registrations).remove(&id) {
            registration.handle.abort();
        }
    }

    /// Whether a registration is currently active for `id`.
    #[must_use]
    pub fn is_tracking(&self, id: MetaverseId) -> bool {
        lock_registrations(&self.registrations).contains_key(&id)
    }

    /// Number of active registrations.
    #[must_use]
    pub fn active_count(&self) -> usize {
        lock_registrations(&self.registrations).len()
    }

    /// Cancels every registration. Called on process shutdown.
    pub fn shutdown(&self) {
        let mut map = lock_registrations(&self.registrations);
        for (_, registration) in map.drain() {
            registration.handle.abort();
        }
    }
}

/// Removes the registration for `id` only if it still belongs to the
/// task identified by `seq`; a newer re-arm owns the slot otherwise.
fn deregister(
    registrations: &Mutex<HashMap<MetaverseId, Registration>>,
    id: MetaverseId,
    seq: u64,
) {
    let mut map = lock_registrations(registrations);
    if map.get(&id).is_some_and(|r| r.seq == seq) {
        map.remove(&id);
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{Metaverse, MetaverseKind, Region, UserId};
    use crate::persistence::MemoryStore;

    const TICK: Duration = Duration::from_secs(60);

    async fn running_instance(store: &MemoryStore, players: i32) -> MetaverseId {
        let mut m = Metaverse::new(
            UserId::new(),
            "Tracked".to_string(),
            MetaverseKind::ThreeD,
            Region::Eu,
        );
        m.status = MetaverseStatus::Running;
        m.players_online = players;
        let id = m.id;
        let Ok(()) = store.insert_metaverse(&m).await else {
            panic!("insert failed");
        };
        id
    }

    fn make_tracker(store: &Arc<MemoryStore>) -> UsageTracker {
        UsageTracker::new(Arc::clone(store) as Arc<dyn GatewayStore>, TICK)
    }

    #[tokio::test(start_paused = true)]
    async fn tick_accrues_uptime_and_whole_player_hours() {
        let store = Arc::new(MemoryStore::new());
        let tracker = make_tracker(&store);
        let id = running_instance(&store, 120).await;

        tracker.start_tracking(id);
        tokio::time::sleep(TICK + Duration::from_secs(1)).await;

        let Ok(Some(m)) = store.metaverse_by_id(id).await else {
            panic!("row vanished");
        };
        assert_eq!(m.uptime_minutes, 1);
        assert_eq!(m.hours_used, 2); // 120 players / 60

        tokio::time::sleep(TICK).await;
        let Ok(Some(m)) = store.metaverse_by_id(id).await else {
            panic!("row vanished");
        };
        assert_eq!(m.uptime_minutes, 2);
        assert_eq!(m.hours_used, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn sub_sixty_player_minutes_are_dropped_per_tick() {
        let store = Arc::new(MemoryStore::new());
        let tracker = make_tracker(&store);
        let id = running_instance(&store, 59).await;

        tracker.start_tracking(id);
        tokio::time::sleep(TICK * 3 + Duration::from_secs(1)).await;

        let Ok(Some(m)) = store.metaverse_by_id(id).await else {
            panic!("row vanished");
        };
        // 59 player-minutes per tick never floor to a whole hour, and no
        // remainder carries across ticks.
        assert_eq!(m.uptime_minutes, 3);
        assert_eq!(m.hours_used, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn rearm_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let tracker = make_tracker(&store);
        let id = running_instance(&store, 10).await;

        tracker.start_tracking(id);
        tracker.start_tracking(id);
        assert_eq!(tracker.active_count(), 1);

        // Exactly one task must be ticking: one minute per period.
        tokio::time::sleep(TICK + Duration::from_secs(1)).await;
        let Ok(Some(m)) = store.metaverse_by_id(id).await else {
            panic!("row vanished");
        };
        assert_eq!(m.uptime_minutes, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn detaches_when_instance_stops_running() {
        let store = Arc::new(MemoryStore::new());
        let tracker = make_tracker(&store);
        let id = running_instance(&store, 10).await;

        tracker.start_tracking(id);
        let Ok(()) = store
            .set_metaverse_status(id, MetaverseStatus::Stopped)
            .await
        else {
            panic!("status update failed");
        };

        tokio::time::sleep(TICK + Duration::from_secs(1)).await;
        assert!(!tracker.is_tracking(id));

        let Ok(Some(m)) = store.metaverse_by_id(id).await else {
            panic!("row vanished");
        };
        assert_eq!(m.uptime_minutes, 0);
        assert_eq!(m.hours_used, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_tracking_cancels_accrual() {
        let store = Arc::new(MemoryStore::new());
        let tracker = make_tracker(&store);
        let id = running_instance(&store, 90).await;

        tracker.start_tracking(id);
        tracker.stop_tracking(id);
        assert_eq!(tracker.active_count(), 0);

        tokio::time::sleep(TICK * 2).await;
        let Ok(Some(m)) = store.metaverse_by_id(id).await else {
            panic!("row vanished");
        };
        assert_eq!(m.uptime_minutes, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_everything() {
        let store = Arc::new(MemoryStore::new());
        let tracker = make_tracker(&store);
        let a = running_instance(&store, 10).await;
        let b = running_instance(&store, 10).await;

        tracker.start_tracking(a);
        tracker.start_tracking(b);
        assert_eq!(tracker.active_count(), 2);

        tracker.shutdown();
        assert_eq!(tracker.active_count(), 0);

        tokio::time::sleep(TICK * 2).await;
        let Ok(Some(m)) = store.metaverse_by_id(a).await else {
            panic!("row vanished");
        };
        assert_eq!(m.uptime_minutes, 0);
    }
}
