//! Asset DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{Asset, AssetId, AssetKind};

/// Query parameters for `POST /api/upload/{kind}`.
#[derive(Debug, Deserialize, IntoParams)]
pub struct UploadParams {
    /// Original filename including extension; validated against the
    /// asset kind's extension allowlist.
    pub filename: String,
}

/// Asset representation.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetDto {
    /// Unique identifier.
    pub id: AssetId,
    /// Which project slot this asset fits.
    pub kind: AssetKind,
    /// Filename as uploaded by the client.
    pub original_name: String,
    /// Server-generated stored filename.
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

impl From<Asset> for AssetDto {
    fn from(a: Asset) -> Self {
        Self {
            id: a.id,
            kind: a.kind,
            original_name: a.original_name,
            filename: a.filename,
            mime: a.mime,
            size: a.size,
            url: a.url,
            created_at: a.created_at,
        }
    }
}

/// Response envelope for asset endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct AssetResponse {
    /// The asset row.
    pub asset: AssetDto,
}
