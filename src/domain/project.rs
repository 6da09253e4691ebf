//! Project and asset entities.
//!
//! A project bundles at most one asset of each kind (character rig,
//! environment model, world-map image) — enforced by single reference
//! fields, not multiplicity. Assets are immutable once created; nothing
//! cleans up orphaned assets when a project re-points a slot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ids::{AssetId, ProjectId, UserId};

/// The three asset slots a project can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum AssetKind {
    /// Playable character rig.
    Character,
    /// Environment model.
    Model,
    /// World-map image.
    WorldMap,
}

impl AssetKind {
    /// Stable string form used for storage and upload URLs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Character => "character",
            Self::Model => "model",
            Self::WorldMap => "worldMap",
        }
    }

    /// Parses the storage string form.
    #[must_use]
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "character" => Some(Self::Character),
            "model" => Some(Self::Model),
            "worldMap" => Some(Self::WorldMap),
            _ => None,
        }
    }

    /// Lower-case file extensions (without the dot) accepted for this
    /// asset kind.
    #[must_use]
    pub const fn allowed_extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Character => &["glb"],
            Self::Model => &["glb", "gltf"],
            Self::WorldMap => &["png", "jpg", "jpeg"],
        }
    }
}

/// An uploaded file referenced by a project. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    /// Unique identifier.
    pub id: AssetId,
    /// Which project slot this asset fits.
    pub kind: AssetKind,
    /// Filename as uploaded by the client.
    pub original_name: String,
    /// Server-generated stored filename (uuid + extension).
    pub filename: String,
    /// MIME type reported at upload time.
    pub mime: String,
    /// File size in bytes.
    pub size: i64,
    /// Public URL the file is served from.
    pub url: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A bundle of assets that build jobs run against.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    /// Unique identifier.
    pub id: ProjectId,
    /// Display name. The builder surface maintains a single well-known
    /// project upserted by name.
    pub name: String,
    /// Owning user, when the project was created by an authenticated
    /// flow.
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

impl Project {
    /// Creates a new project with empty asset slots.
    #[must_use]
    pub fn new(name: String) -> Self {
        let now = Utc::now();
        Self {
            id: ProjectId::new(),
            name,
            user_id: None,
            character_id: None,
            model_id: None,
            world_map_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn kind_storage_round_trip() {
        for kind in [AssetKind::Character, AssetKind::Model, AssetKind::WorldMap] {
            assert_eq!(AssetKind::from_str_opt(kind.as_str()), Some(kind));
        }
        assert_eq!(AssetKind::from_str_opt("texture"), None);
    }

    #[test]
    fn extension_allowlists() {
        assert!(AssetKind::Character.allowed_extensions().contains(&"glb"));
        assert!(!AssetKind::Character.allowed_extensions().contains(&"gltf"));
        assert!(AssetKind::Model.allowed_extensions().contains(&"gltf"));
        assert!(AssetKind::WorldMap.allowed_extensions().contains(&"jpeg"));
        assert!(!AssetKind::WorldMap.allowed_extensions().contains(&"glb"));
    }

    #[test]
    fn wire_name_for_world_map_is_camel_case() {
        let json = serde_json::to_string(&AssetKind::WorldMap).ok();
        assert_eq!(json.as_deref(), Some("\"worldMap\""));
    }

    #[test]
    fn new_project_has_empty_slots() {
        let p = Project::new("starter".to_string());
        assert!(p.character_id.is_none());
        assert!(p.model_id.is_none());
        assert!(p.world_map_id.is_none());
    }
}
