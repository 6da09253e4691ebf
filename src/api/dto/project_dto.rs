//! Project DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{AssetId, Project, ProjectId, UserId};

/// Request body for `POST /api/project`.
///
/// All three slots are replaced wholesale: an omitted slot clears any
/// previously referenced asset.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveProjectRequest {
    /// Character asset slot.
    #[serde(default)]
    pub character_id: Option<AssetId>,
    /// Model asset slot.
    #[serde(default)]
    pub model_id: Option<AssetId>,
    /// World-map asset slot.
    #[serde(default)]
    pub world_map_id: Option<AssetId>,
}

/// Project representation.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDto {
    /// Unique identifier.
    pub id: ProjectId,
    /// Display name.
    pub name: String,
    /// Owning user, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    /// Character asset slot.
    pub character_id: Option<AssetId>,
    /// Model asset slot.
    pub model_id: Option<AssetId>,
    /// World-map asset slot.
    pub world_map_id: Option<AssetId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<Project> for ProjectDto {
    fn from(p: Project) -> Self {
        Self {
            id: p.id,
            name: p.name,
            user_id: p.user_id,
            character_id: p.character_id,
            model_id: p.model_id,
            world_map_id: p.world_map_id,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// Response envelope for `POST /api/project`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProjectResponse {
    /// The created or updated project.
    pub project: ProjectDto,
}
