//! PostgreSQL implementation of the store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::store::GatewayStore;
use crate::domain::{
    Asset, AssetId, AssetKind, BuildJob, BuildJobId, BuildStatus, Metaverse, MetaverseId,
    MetaverseKind, MetaverseStatus, Plan, Project, ProjectId, Region, Subscription,
    SubscriptionId, User, UserId,
};
use crate::error::GatewayError;

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

/// Raw metaverse row tuple as selected from the `metaverses` table.
type MetaverseRow = (
    Uuid,
    Uuid,
    String,
    String,
    String,
    String,
    i32,
    i32,
    i32,
    String,
    Option<String>,
    DateTime<Utc>,
    DateTime<Utc>,
);

const METAVERSE_COLUMNS: &str = "id, user_id, name, kind, region, status, players_online, \
     uptime_minutes, hours_used, version, thumbnail, created_at, updated_at";

impl PgStore {
    /// Creates a new store over the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_err(e: sqlx::Error) -> GatewayError {
    GatewayError::Persistence(e.to_string())
}

/// Maps an unknown enum string in a column to a persistence error.
fn bad_enum(column: &str, value: &str) -> GatewayError {
    GatewayError::Persistence(format!("unexpected {column} value in store: {value}"))
}

fn metaverse_from_row(row: MetaverseRow) -> Result<Metaverse, GatewayError> {
    let (
        id,
        user_id,
        name,
        kind,
        region,
        status,
        players_online,
        uptime_minutes,
        hours_used,
        version,
        thumbnail,
        created_at,
        updated_at,
    ) = row;
    Ok(Metaverse {
        id: MetaverseId::from_uuid(id),
        user_id: UserId::from_uuid(user_id),
        name,
        kind: MetaverseKind::from_str_opt(&kind).ok_or_else(|| bad_enum("kind", &kind))?,
        region: Region::from_str_opt(&region).ok_or_else(|| bad_enum("region", &region))?,
        status: MetaverseStatus::from_str_opt(&status).ok_or_else(|| bad_enum("status", &status))?,
        players_online,
        uptime_minutes,
        hours_used,
        version,
        thumbnail,
        created_at,
        updated_at,
    })
}

#[async_trait]
impl GatewayStore for PgStore {
    async fn insert_user(&self, user: &User) -> Result<(), GatewayError> {
        sqlx::query("INSERT INTO users (id, email, password_hash, created_at) VALUES ($1, $2, $3, $4)")
            .bind(user.id.as_uuid())
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.created_at)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, GatewayError> {
        let row = sqlx::query_as::<_, (Uuid, String, String, DateTime<Utc>)>(
            "SELECT id, email, password_hash, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(|(id, email, password_hash, created_at)| User {
            id: UserId::from_uuid(id),
            email,
            password_hash,
            created_at,
        }))
    }

    async fn user_by_id(&self, id: UserId) -> Result<Option<User>, GatewayError> {
        let row = sqlx::query_as::<_, (Uuid, String, String, DateTime<Utc>)>(
            "SELECT id, email, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(|(id, email, password_hash, created_at)| User {
            id: UserId::from_uuid(id),
            email,
            password_hash,
            created_at,
        }))
    }

    async fn insert_subscription(&self, sub: &Subscription) -> Result<(), GatewayError> {
        sqlx::query(
            "INSERT INTO subscriptions (id, user_id, plan, monthly_hours, used_hours, reset_date, next_billing) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(sub.id.as_uuid())
        .bind(sub.user_id.as_uuid())
        .bind(sub.plan.as_str())
        .bind(sub.monthly_hours)
        .bind(sub.used_hours)
        .bind(sub.reset_date)
        .bind(sub.next_billing)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn subscription_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<Subscription>, GatewayError> {
        let row = sqlx::query_as::<_, (Uuid, Uuid, String, i32, i32, DateTime<Utc>, DateTime<Utc>)>(
            "SELECT id, user_id, plan, monthly_hours, used_hours, reset_date, next_billing \
             FROM subscriptions WHERE user_id = $1",
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(
            |(id, user_id, plan, monthly_hours, used_hours, reset_date, next_billing)| {
                Ok(Subscription {
                    id: SubscriptionId::from_uuid(id),
                    user_id: UserId::from_uuid(user_id),
                    plan: Plan::from_str_opt(&plan).ok_or_else(|| bad_enum("plan", &plan))?,
                    monthly_hours,
                    used_hours,
                    reset_date,
                    next_billing,
                })
            },
        )
        .transpose()
    }

    async fn update_subscription(&self, sub: &Subscription) -> Result<(), GatewayError> {
        sqlx::query(
            "UPDATE subscriptions SET plan = $2, monthly_hours = $3, used_hours = $4, \
             reset_date = $5, next_billing = $6 WHERE id = $1",
        )
        .bind(sub.id.as_uuid())
        .bind(sub.plan.as_str())
        .bind(sub.monthly_hours)
        .bind(sub.used_hours)
        .bind(sub.reset_date)
        .bind(sub.next_billing)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn insert_metaverse(&self, metaverse: &Metaverse) -> Result<(), GatewayError> {
        sqlx::query(
            "INSERT INTO metaverses (id, user_id, name, kind, region, status, players_online, \
             uptime_minutes, hours_used, version, thumbnail, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(metaverse.id.as_uuid())
        .bind(metaverse.user_id.as_uuid())
        .bind(&metaverse.name)
        .bind(metaverse.kind.as_str())
        .bind(metaverse.region.as_str())
        .bind(metaverse.status.as_str())
        .bind(metaverse.players_online)
        .bind(metaverse.uptime_minutes)
        .bind(metaverse.hours_used)
        .bind(&metaverse.version)
        .bind(&metaverse.thumbnail)
        .bind(metaverse.created_at)
        .bind(metaverse.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn metaverses_by_user(&self, user_id: UserId) -> Result<Vec<Metaverse>, GatewayError> {
        let rows = sqlx::query_as::<_, MetaverseRow>(&format!(
            "SELECT {METAVERSE_COLUMNS} FROM metaverses WHERE user_id = $1 ORDER BY created_at DESC",
        ))
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(metaverse_from_row).collect()
    }

    async fn metaverse_by_id(&self, id: MetaverseId) -> Result<Option<Metaverse>, GatewayError> {
        let row = sqlx::query_as::<_, MetaverseRow>(&format!(
            "SELECT {METAVERSE_COLUMNS} FROM metaverses WHERE id = $1",
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(metaverse_from_row).transpose()
    }

    async fn metaverse_owned(
        &self,
        id: MetaverseId,
        user_id: UserId,
    ) -> Result<Option<Metaverse>, GatewayError> {
        let row = sqlx::query_as::<_, MetaverseRow>(&format!(
            "SELECT {METAVERSE_COLUMNS} FROM metaverses WHERE id = $1 AND user_id = $2",
        ))
        .bind(id.as_uuid())
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(metaverse_from_row).transpose()
    }

    async fn set_metaverse_status(
        &self,
        id: MetaverseId,
        status: MetaverseStatus,
    ) -> Result<(), GatewayError> {
        sqlx::query("UPDATE metaverses SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id.as_uuid())
            .bind(status.as_str())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn compare_and_set_status(
        &self,
        id: MetaverseId,
        expected: MetaverseStatus,
        next: MetaverseStatus,
        players_online: Option<i32>,
    ) -> Result<bool, GatewayError> {
        let result = sqlx::query(
            "UPDATE metaverses SET status = $3, players_online = COALESCE($4, players_online), \
             updated_at = NOW() WHERE id = $1 AND status = $2",
        )
        .bind(id.as_uuid())
        .bind(expected.as_str())
        .bind(next.as_str())
        .bind(players_online)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn add_metaverse_usage(
        &self,
        id: MetaverseId,
        minutes: i32,
        hours: i32,
    ) -> Result<(), GatewayError> {
        sqlx::query(
            "UPDATE metaverses SET uptime_minutes = uptime_minutes + $2, \
             hours_used = hours_used + $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(minutes)
        .bind(hours)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn delete_metaverse(&self, id: MetaverseId) -> Result<(), GatewayError> {
        sqlx::query("DELETE FROM metaverses WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn insert_project(&self, project: &Project) -> Result<(), GatewayError> {
        sqlx::query(
            "INSERT INTO projects (id, name, user_id, character_id, model_id, world_map_id, \
             created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(project.id.as_uuid())
        .bind(&project.name)
        .bind(project.user_id.map(|u| *u.as_uuid()))
        .bind(project.character_id.map(|a| *a.as_uuid()))
        .bind(project.model_id.map(|a| *a.as_uuid()))
        .bind(project.world_map_id.map(|a| *a.as_uuid()))
        .bind(project.created_at)
        .bind(project.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn update_project(&self, project: &Project) -> Result<(), GatewayError> {
        sqlx::query(
            "UPDATE projects SET name = $2, character_id = $3, model_id = $4, \
             world_map_id = $5, updated_at = $6 WHERE id = $1",
        )
        .bind(project.id.as_uuid())
        .bind(&project.name)
        .bind(project.character_id.map(|a| *a.as_uuid()))
        .bind(project.model_id.map(|a| *a.as_uuid()))
        .bind(project.world_map_id.map(|a| *a.as_uuid()))
        .bind(project.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn project_by_id(&self, id: ProjectId) -> Result<Option<Project>, GatewayError> {
        let row = sqlx::query_as::<_, ProjectRow>(
            "SELECT id, name, user_id, character_id, model_id, world_map_id, created_at, \
             updated_at FROM projects WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(project_from_row))
    }

    async fn project_by_name(&self, name: &str) -> Result<Option<Project>, GatewayError> {
        let row = sqlx::query_as::<_, ProjectRow>(
            "SELECT id, name, user_id, character_id, model_id, world_map_id, created_at, \
             updated_at FROM projects WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(project_from_row))
    }

    async fn insert_asset(&self, asset: &Asset) -> Result<(), GatewayError> {
        sqlx::query(
            "INSERT INTO assets (id, kind, original_name, filename, mime, size, url, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(asset.id.as_uuid())
        .bind(asset.kind.as_str())
        .bind(&asset.original_name)
        .bind(&asset.filename)
        .bind(&asset.mime)
        .bind(asset.size)
        .bind(&asset.url)
        .bind(asset.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn asset_by_id(&self, id: AssetId) -> Result<Option<Asset>, GatewayError> {
        let row = sqlx::query_as::<
            _,
            (Uuid, String, String, String, String, i64, String, DateTime<Utc>),
        >(
            "SELECT id, kind, original_name, filename, mime, size, url, created_at \
             FROM assets WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(
            |(id, kind, original_name, filename, mime, size, url, created_at)| {
                Ok(Asset {
                    id: AssetId::from_uuid(id),
                    kind: AssetKind::from_str_opt(&kind).ok_or_else(|| bad_enum("kind", &kind))?,
                    original_name,
                    filename,
                    mime,
                    size,
                    url,
                    created_at,
                })
            },
        )
        .transpose()
    }

    async fn insert_build_job(&self, job: &BuildJob) -> Result<(), GatewayError> {
        sqlx::query(
            "INSERT INTO build_jobs (id, project_id, status, logs, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(job.id.as_uuid())
        .bind(job.project_id.as_uuid())
        .bind(job.status.as_str())
        .bind(&job.logs)
        .bind(job.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn build_job_by_id(&self, id: BuildJobId) -> Result<Option<BuildJob>, GatewayError> {
        let row = sqlx::query_as::<_, (Uuid, Uuid, String, String, DateTime<Utc>)>(
            "SELECT id, project_id, status, logs, created_at FROM build_jobs WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(|(id, project_id, status, logs, created_at)| {
            Ok(BuildJob {
                id: BuildJobId::from_uuid(id),
                project_id: ProjectId::from_uuid(project_id),
                status: BuildStatus::from_str_opt(&status)
                    .ok_or_else(|| bad_enum("status", &status))?,
                logs,
                created_at,
            })
        })
        .transpose()
    }

    async fn set_build_job_stage(
        &self,
        id: BuildJobId,
        status: BuildStatus,
        logs: &str,
    ) -> Result<(), GatewayError> {
        sqlx::query("UPDATE build_jobs SET status = $2, logs = $3 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(status.as_str())
            .bind(logs)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}

/// Raw project row tuple as selected from the `projects` table.
type ProjectRow = (
    Uuid,
    String,
    Option<Uuid>,
    Option<Uuid>,
    Option<Uuid>,
    Option<Uuid>,
    DateTime<Utc>,
    DateTime<Utc>,
);

fn project_from_row(row: ProjectRow) -> Project {
    let (id, name, user_id, character_id, model_id, world_map_id, created_at, updated_at) = row;
    Project {
        id: ProjectId::from_uuid(id),
        name,
        user_id: user_id.map(UserId::from_uuid),
        character_id: character_id.map(AssetId::from_uuid),
        model_id: model_id.map(AssetId::from_uuid),
        world_map_id: world_map_id.map(AssetId::from_uuid),
        created_at,
        updated_at,
    }
}
