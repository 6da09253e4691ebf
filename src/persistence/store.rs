//! Row-level store interface consumed by the service and route layers.
//!
//! The simulators only ever need create/read/update/delete of single
//! rows plus one conditional update: [`GatewayStore::compare_and_set_status`],
//! the commit primitive for every delayed lifecycle effect. A delayed
//! effect names the exact status it assumes; if the row changed (or was
//! deleted) underneath, the swap reports `false` and the effect is
//! silently dropped.

use async_trait::async_trait;

use crate::domain::{
    Asset, AssetId, BuildJob, BuildJobId, BuildStatus, Metaverse, MetaverseId, MetaverseStatus,
    Project, ProjectId, Subscription, User, UserId,
};
use crate::error::GatewayError;

/// Row-level CRUD over the six persisted entities.
///
/// Implemented by [`PgStore`](super::PgStore) (durable) and
/// [`MemoryStore`](super::MemoryStore) (demo mode and tests).
#[async_trait]
pub trait GatewayStore: Send + Sync + std::fmt::Debug {
    // ── Users ───────────────────────────────────────────────────────────

    /// Inserts a new user row.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Persistence`] on store failure.
    async fn insert_user(&self, user: &User) -> Result<(), GatewayError>;

    /// Looks a user up by unique email.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Persistence`] on store failure.
    async fn user_by_email(&self, email: &str) -> Result<Option<User>, GatewayError>;

    /// Looks a user up by id.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Persistence`] on store failure.
    async fn user_by_id(&self, id: UserId) -> Result<Option<User>, GatewayError>;

    // ── Subscriptions ───────────────────────────────────────────────────

    /// Inserts a new subscription row.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Persistence`] on store failure.
    async fn insert_subscription(&self, sub: &Subscription) -> Result<(), GatewayError>;

    /// Returns the subscription owned by `user_id`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Persistence`] on store failure.
    async fn subscription_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<Subscription>, GatewayError>;

    /// Overwrites a subscription row with the given state.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Persistence`] on store failure.
    async fn update_subscription(&self, sub: &Subscription) -> Result<(), GatewayError>;

    // ── Metaverses ──────────────────────────────────────────────────────

    /// Inserts a new metaverse row.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Persistence`] on store failure.
    async fn insert_metaverse(&self, metaverse: &Metaverse) -> Result<(), GatewayError>;

    /// Returns all metaverses owned by `user_id`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Persistence`] on store failure.
    async fn metaverses_by_user(&self, user_id: UserId) -> Result<Vec<Metaverse>, GatewayError>;

    /// Looks a metaverse up by id, regardless of owner. Used by delayed
    /// effects and the usage tracker, which run without a request
    /// context.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Persistence`] on store failure.
    async fn metaverse_by_id(&self, id: MetaverseId) -> Result<Option<Metaverse>, GatewayError>;

    /// Looks a metaverse up by id scoped to its owner. Used by request
    /// handlers so users cannot act on foreign instances.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Persistence`] on store failure.
    async fn metaverse_owned(
        &self,
        id: MetaverseId,
        user_id: UserId,
    ) -> Result<Option<Metaverse>, GatewayError>;

    /// Unconditionally sets the status of a metaverse. Used for the
    /// immediate half of a lifecycle action, after its precondition
    /// check.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Persistence`] on store failure.
    async fn set_metaverse_status(
        &self,
        id: MetaverseId,
        status: MetaverseStatus,
    ) -> Result<(), GatewayError>;

    /// Commits a delayed transition: sets `next` (and `players_online`,
    /// when given) only if the row still exists and its status equals
    /// `expected`. Returns whether the swap applied.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Persistence`] on store failure.
    async fn compare_and_set_status(
        &self,
        id: MetaverseId,
        expected: MetaverseStatus,
        next: MetaverseStatus,
        players_online: Option<i32>,
    ) -> Result<bool, GatewayError>;

    /// Adds usage counters to a metaverse: `minutes` of uptime and
    /// `hours` of consumed player-hours.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Persistence`] on store failure.
    async fn add_metaverse_usage(
        &self,
        id: MetaverseId,
        minutes: i32,
        hours: i32,
    ) -> Result<(), GatewayError>;

    /// Removes a metaverse row. Removing an absent row is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Persistence`] on store failure.
    async fn delete_metaverse(&self, id: MetaverseId) -> Result<(), GatewayError>;

    // ── Projects ────────────────────────────────────────────────────────

    /// Inserts a new project row.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Persistence`] on store failure.
    async fn insert_project(&self, project: &Project) -> Result<(), GatewayError>;

    /// Overwrites a project row with the given state.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Persistence`] on store failure.
    async fn update_project(&self, project: &Project) -> Result<(), GatewayError>;

    /// Looks a project up by id.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Persistence`] on store failure.
    async fn project_by_id(&self, id: ProjectId) -> Result<Option<Project>, GatewayError>;

    /// Looks a project up by its (well-known) name.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Persistence`] on store failure.
    async fn project_by_name(&self, name: &str) -> Result<Option<Project>, GatewayError>;

    // ── Assets ──────────────────────────────────────────────────────────

    /// Inserts a new asset row.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Persistence`] on store failure.
    async fn insert_asset(&self, asset: &Asset) -> Result<(), GatewayError>;

    /// Looks an asset up by id.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Persistence`] on store failure.
    async fn asset_by_id(&self, id: AssetId) -> Result<Option<Asset>, GatewayError>;

    // ── Build jobs ──────────────────────────────────────────────────────

    /// Inserts a new build job row.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Persistence`] on store failure.
    async fn insert_build_job(&self, job: &BuildJob) -> Result<(), GatewayError>;

    /// Looks a build job up by id.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Persistence`] on store failure.
    async fn build_job_by_id(&self, id: BuildJobId) -> Result<Option<BuildJob>, GatewayError>;

    /// Advances a build job to `status` with fresh log text. Updating an
    /// absent row is a no-op; stage timers fire unconditionally and the
    /// job may have been removed out-of-band.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Persistence`] on store failure.
    async fn set_build_job_stage(
        &self,
        id: BuildJobId,
        status: BuildStatus,
        logs: &str,
    ) -> Result<(), GatewayError>;
}
