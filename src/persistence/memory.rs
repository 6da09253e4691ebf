//! In-memory implementation of the store.
//!
//! Each entity lives in its own `RwLock<HashMap>` table. Backs the
//! `PERSISTENCE_ENABLED=false` demo mode (state dies with the process)
//! and the test suites for the service layer.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::store::GatewayStore;
use crate::domain::{
    Asset, AssetId, BuildJob, BuildJobId, BuildStatus, Metaverse, MetaverseId, MetaverseStatus,
    Project, ProjectId, Subscription, SubscriptionId, User, UserId,
};
use crate::error::GatewayError;

/// Volatile store over per-entity locked maps.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<UserId, User>>,
    subscriptions: RwLock<HashMap<SubscriptionId, Subscription>>,
    metaverses: RwLock<HashMap<MetaverseId, Metaverse>>,
    projects: RwLock<HashMap<ProjectId, Project>>,
    assets: RwLock<HashMap<AssetId, Asset>>,
    build_jobs: RwLock<HashMap<BuildJobId, BuildJob>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of build job rows currently held. Test visibility helper.
    pub async fn build_job_count(&self) -> usize {
        self.build_jobs.read().await.len()
    }
}

#[async_trait]
impl GatewayStore for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<(), GatewayError> {
        self.users.write().await.insert(user.id, user.clone());
        Ok(())
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, GatewayError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn user_by_id(&self, id: UserId) -> Result<Option<User>, GatewayError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn insert_subscription(&self, sub: &Subscription) -> Result<(), GatewayError> {
        self.subscriptions.write().await.insert(sub.id, sub.clone());
        Ok(())
    }

    async fn subscription_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<Subscription>, GatewayError> {
        Ok(self
            .subscriptions
            .read()
            .await
            .values()
            .find(|s| s.user_id == user_id)
            .cloned())
    }

    async fn update_subscription(&self, sub: &Subscription) -> Result<(), GatewayError> {
        self.subscriptions.write().await.insert(sub.id, sub.clone());
        Ok(())
    }

    async fn insert_metaverse(&self, metaverse: &Metaverse) -> Result<(), GatewayError> {
        self.metaverses
            .write()
            .await
            .insert(metaverse.id, metaverse.clone());
        Ok(())
    }

    async fn metaverses_by_user(&self, user_id: UserId) -> Result<Vec<Metaverse>, GatewayError> {
        let mut rows: Vec<Metaverse> = self
            .metaverses
            .read()
            .await
            .values()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn metaverse_by_id(&self, id: MetaverseId) -> Result<Option<Metaverse>, GatewayError> {
        Ok(self.metaverses.read().await.get(&id).cloned())
    }

    async fn metaverse_owned(
        &self,
        id: MetaverseId,
        user_id: UserId,
    ) -> Result<Option<Metaverse>, GatewayError> {
        Ok(self
            .metaverses
            .read()
            .await
            .get(&id)
            .filter(|m| m.user_id == user_id)
            .cloned())
    }

    async fn set_metaverse_status(
        &self,
        id: MetaverseId,
        status: MetaverseStatus,
    ) -> Result<(), GatewayError> {
        if let Some(m) = self.metaverses.write().await.get_mut(&id) {
            m.status = status;
            m.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn compare_and_set_status(
        &self,
        id: MetaverseId,
        expected: MetaverseStatus,
        next: MetaverseStatus,
        players_online: Option<i32>,
    ) -> Result<bool, GatewayError> {
        let mut map = self.metaverses.write().await;
        match map.get_mut(&id) {
            Some(m) if m.status == expected => {
                m.status = next;
                if let Some(players) = players_online {
                    m.players_online = players;
                }
                m.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn add_metaverse_usage(
        &self,
        id: MetaverseId,
        minutes: i32,
        hours: i32,
    ) -> Result<(), GatewayError> {
        if let Some(m) = self.metaverses.write().await.get_mut(&id) {
            m.uptime_minutes = m.uptime_minutes.saturating_add(minutes);
            m.hours_used = m.hours_used.saturating_add(hours);
            m.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn delete_metaverse(&self, id: MetaverseId) -> Result<(), GatewayError> {
        self.metaverses.write().await.remove(&id);
        Ok(())
    }

    async fn insert_project(&self, project: &Project) -> Result<(), GatewayError> {
        self.projects
            .write()
            .await
            .insert(project.id, project.clone());
        Ok(())
    }

    async fn update_project(&self, project: &Project) -> Result<(), GatewayError> {
        self.projects
            .write()
            .await
            .insert(project.id, project.clone());
        Ok(())
    }

    async fn project_by_id(&self, id: ProjectId) -> Result<Option<Project>, GatewayError> {
        Ok(self.projects.read().await.get(&id).cloned())
    }

    async fn project_by_name(&self, name: &str) -> Result<Option<Project>, GatewayError> {
        Ok(self
            .projects
            .read()
            .await
            .values()
            .find(|p| p.name == name)
            .cloned())
    }

    async fn insert_asset(&self, asset: &Asset) -> Result<(), GatewayError> {
        self.assets.write().await.insert(asset.id, asset.clone());
        Ok(())
    }

    async fn asset_by_id(&self, id: AssetId) -> Result<Option<Asset>, GatewayError> {
        Ok(self.assets.read().await.get(&id).cloned())
    }

    async fn insert_build_job(&self, job: &BuildJob) -> Result<(), GatewayError> {
        self.build_jobs.write().await.insert(job.id, job.clone());
        Ok(())
    }

    async fn build_job_by_id(&self, id: BuildJobId) -> Result<Option<BuildJob>, GatewayError> {
        Ok(self.build_jobs.read().await.get(&id).cloned())
    }

    async fn set_build_job_stage(
        &self,
        id: BuildJobId,
        status: BuildStatus,
        logs: &str,
    ) -> Result<(), GatewayError> {
        if let Some(job) = self.build_jobs.write().await.get_mut(&id) {
            job.status = status;
            job.logs = logs.to_string();
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{MetaverseKind, Region};

    fn make_metaverse(user_id: UserId) -> Metaverse {
        Metaverse::new(
            user_id,
            "Test".to_string(),
            MetaverseKind::ThreeD,
            Region::Asia,
        )
    }

    #[tokio::test]
    async fn insert_and_get() {
        let store = MemoryStore::new();
        let m = make_metaverse(UserId::new());
        let id = m.id;

        let result = store.insert_metaverse(&m).await;
        assert!(result.is_ok());

        let fetched = store.metaverse_by_id(id).await;
        let Ok(Some(fetched)) = fetched else {
            panic!("expected row");
        };
        assert_eq!(fetched.name, "Test");
    }

    #[tokio::test]
    async fn get_nonexistent_returns_none() {
        let store = MemoryStore::new();
        let result = store.metaverse_by_id(MetaverseId::new()).await;
        let Ok(row) = result else {
            panic!("store error");
        };
        assert!(row.is_none());
    }

    #[tokio::test]
    async fn owned_lookup_hides_foreign_rows() {
        let store = MemoryStore::new();
        let owner = UserId::new();
        let m = make_metaverse(owner);
        let id = m.id;
        let _ = store.insert_metaverse(&m).await;

        let Ok(found) = store.metaverse_owned(id, owner).await else {
            panic!("store error");
        };
        assert!(found.is_some());

        let Ok(foreign) = store.metaverse_owned(id, UserId::new()).await else {
            panic!("store error");
        };
        assert!(foreign.is_none());
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let store = MemoryStore::new();
        let user = UserId::new();
        let mut older = make_metaverse(user);
        older.created_at = Utc::now() - chrono::Duration::minutes(5);
        let newer = make_metaverse(user);
        let _ = store.insert_metaverse(&older).await;
        let _ = store.insert_metaverse(&newer).await;

        let Ok(rows) = store.metaverses_by_user(user).await else {
            panic!("store error");
        };
        assert_eq!(rows.len(), 2);
        assert_eq!(rows.first().map(|m| m.id), Some(newer.id));
    }

    #[tokio::test]
    async fn cas_applies_only_from_expected_status() {
        let store = MemoryStore::new();
        let mut m = make_metaverse(UserId::new());
        m.status = MetaverseStatus::Starting;
        let id = m.id;
        let _ = store.insert_metaverse(&m).await;

        let Ok(applied) = store
            .compare_and_set_status(
                id,
                MetaverseStatus::Starting,
                MetaverseStatus::Running,
                Some(12),
            )
            .await
        else {
            panic!("store error");
        };
        assert!(applied);

        // Second swap expects STARTING but the row is now RUNNING.
        let Ok(applied) = store
            .compare_and_set_status(
                id,
                MetaverseStatus::Starting,
                MetaverseStatus::Error,
                Some(0),
            )
            .await
        else {
            panic!("store error");
        };
        assert!(!applied);

        let Ok(Some(row)) = store.metaverse_by_id(id).await else {
            panic!("row vanished");
        };
        assert_eq!(row.status, MetaverseStatus::Running);
        assert_eq!(row.players_online, 12);
    }

    #[tokio::test]
    async fn cas_on_deleted_row_is_a_noop() {
        let store = MemoryStore::new();
        let id = MetaverseId::new();
        let Ok(applied) = store
            .compare_and_set_status(
                id,
                MetaverseStatus::Starting,
                MetaverseStatus::Running,
                None,
            )
            .await
        else {
            panic!("store error");
        };
        assert!(!applied);

        let Ok(row) = store.metaverse_by_id(id).await else {
            panic!("store error");
        };
        assert!(row.is_none(), "swap must not resurrect deleted rows");
    }

    #[tokio::test]
    async fn usage_counters_accumulate() {
        let store = MemoryStore::new();
        let m = make_metaverse(UserId::new());
        let id = m.id;
        let _ = store.insert_metaverse(&m).await;

        let _ = store.add_metaverse_usage(id, 1, 0).await;
        let _ = store.add_metaverse_usage(id, 1, 2).await;

        let Ok(Some(row)) = store.metaverse_by_id(id).await else {
            panic!("row vanished");
        };
        assert_eq!(row.uptime_minutes, 2);
        assert_eq!(row.hours_used, 2);
    }

    #[tokio::test]
    async fn delete_removes_row() {
        let store = MemoryStore::new();
        let m = make_metaverse(UserId::new());
        let id = m.id;
        let _ = store.insert_metaverse(&m).await;

        let result = store.delete_metaverse(id).await;
        assert!(result.is_ok());

        let Ok(row) = store.metaverse_by_id(id).await else {
            panic!("store error");
        };
        assert!(row.is_none());
    }

    #[tokio::test]
    async fn user_email_lookup() {
        let store = MemoryStore::new();
        let user = User::new("dev@metaforge.dev".to_string(), "hash".to_string());
        let _ = store.insert_user(&user).await;

        let Ok(found) = store.user_by_email("dev@metaforge.dev").await else {
            panic!("store error");
        };
        assert_eq!(found.map(|u| u.id), Some(user.id));

        let Ok(missing) = store.user_by_email("other@metaforge.dev").await else {
            panic!("store error");
        };
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn project_upsert_by_name_flow() {
        let store = MemoryStore::new();
        let project = Project::new("starter".to_string());
        let _ = store.insert_project(&project).await;

        let Ok(Some(mut found)) = store.project_by_name("starter").await else {
            panic!("project missing");
        };
        let asset_id = AssetId::new();
        found.character_id = Some(asset_id);
        let _ = store.update_project(&found).await;

        let Ok(Some(reloaded)) = store.project_by_id(project.id).await else {
            panic!("project missing");
        };
        assert_eq!(reloaded.character_id, Some(asset_id));
    }

    #[tokio::test]
    async fn build_job_stage_update_on_missing_row_is_noop() {
        let store = MemoryStore::new();
        let result = store
            .set_build_job_stage(BuildJobId::new(), BuildStatus::Done, "done")
            .await;
        assert!(result.is_ok());
        assert_eq!(store.build_job_count().await, 0);
    }
}
