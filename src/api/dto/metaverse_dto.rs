//! Metaverse DTOs. Wire fields are camelCase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Metaverse, MetaverseId, MetaverseKind, MetaverseStatus, Region, UserId};

/// Request body for `POST /api/metaverses`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateMetaverseRequest {
    /// Display name. Must not be blank.
    pub name: String,
    /// Rendering mode.
    pub kind: MetaverseKind,
    /// Hosting region. Defaults to ASIA when omitted.
    #[serde(default)]
    pub region: Option<Region>,
}

/// Full metaverse representation returned by every metaverse endpoint.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetaverseDto {
    /// Unique identifier.
    pub id: MetaverseId,
    /// Owning user.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Rendering mode.
    pub kind: MetaverseKind,
    /// Hosting region.
    pub region: Region,
    /// Current lifecycle status. Action endpoints return the immediate
    /// transition; the resolved status arrives via a subsequent GET.
    pub status: MetaverseStatus,
    /// Simulated concurrent player count.
    pub players_online: i32,
    /// Accrued uptime in minutes.
    pub uptime_minutes: i32,
    /// Accrued whole player-hours.
    pub hours_used: i32,
    /// Deployed version label.
    pub version: String,
    /// Optional thumbnail URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<Metaverse> for MetaverseDto {
    fn from(m: Metaverse) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            name: m.name,
            kind: m.kind,
            region: m.region,
            status: m.status,
            players_online: m.players_online,
            uptime_minutes: m.uptime_minutes,
            hours_used: m.hours_used,
            version: m.version,
            thumbnail: m.thumbnail,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}
