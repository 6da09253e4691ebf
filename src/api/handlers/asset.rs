//! Asset upload and lookup handlers.
//!
//! Uploads take the raw file bytes as the request body with the
//! original filename in a query parameter. The stored filename is a
//! fresh UUID plus the original extension; files are served back under
//! `/uploads/`.

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Path, Query, State};
use axum::http::HeaderMap;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;

use crate::api::dto::{AssetDto, AssetResponse, UploadParams};
use crate::app_state::AppState;
use crate::domain::{Asset, AssetId, AssetKind};
use crate::error::{ErrorResponse, GatewayError};

fn extension_of(filename: &str) -> Option<String> {
    std::path::Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
}

/// `POST /api/upload/:kind` — Upload an asset file.
///
/// # Errors
///
/// Returns [`GatewayError::Validation`] for an unknown asset kind or a
/// file extension outside the kind's allowlist, or
/// [`GatewayError::Internal`] if the file cannot be written.
#[utoipa::path(
    post,
    path = "/api/upload/{kind}",
    tag = "Assets",
    summary = "Upload an asset",
    description = "Stores the raw request body as a file and creates the asset row. Allowed extensions: character .glb; model .glb/.gltf; worldMap .png/.jpg/.jpeg.",
    params(
        ("kind" = String, Path, description = "Asset kind: character, model, or worldMap"),
        UploadParams,
    ),
    request_body(content = Vec<u8>, description = "Raw asset file bytes", content_type = "application/octet-stream"),
    responses(
        (status = 200, description = "Created asset", body = AssetResponse),
        (status = 400, description = "Unsupported kind or file type", body = ErrorResponse),
    )
)]
pub async fn upload_asset(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(params): Query<UploadParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, GatewayError> {
    let kind = AssetKind::from_str_opt(&kind)
        .ok_or_else(|| GatewayError::Validation("unsupported asset type".to_string()))?;

    let ext = extension_of(&params.filename)
        .filter(|ext| kind.allowed_extensions().contains(&ext.as_str()))
        .ok_or_else(|| GatewayError::Validation("invalid file type".to_string()))?;

    if body.is_empty() {
        return Err(GatewayError::Validation("file is required".to_string()));
    }

    let mime = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();

    let filename = format!("{}.{ext}", uuid::Uuid::new_v4());
    tokio::fs::create_dir_all(&state.upload_dir)
        .await
        .map_err(|e| GatewayError::Internal(format!("unable to create upload directory: {e}")))?;
    tokio::fs::write(state.upload_dir.join(&filename), &body)
        .await
        .map_err(|e| GatewayError::Internal(format!("unable to store upload: {e}")))?;

    let asset = Asset {
        id: AssetId::new(),
        kind,
        original_name: params.filename,
        url: format!("/uploads/{filename}"),
        filename,
        mime,
        size: body.len() as i64,
        created_at: Utc::now(),
    };
    state.store.insert_asset(&asset).await?;

    tracing::info!(asset_id = %asset.id, kind = kind.as_str(), size = asset.size, "asset uploaded");
    Ok(Json(AssetResponse {
        asset: AssetDto::from(asset),
    }))
}

/// `GET /api/assets/:id` — Asset row lookup.
///
/// # Errors
///
/// Returns [`GatewayError::NotFound`] if the asset does not exist.
#[utoipa::path(
    get,
    path = "/api/assets/{id}",
    tag = "Assets",
    summary = "Get an asset",
    params(("id" = uuid::Uuid, Path, description = "Asset UUID")),
    responses(
        (status = 200, description = "Asset row", body = AssetResponse),
        (status = 404, description = "Asset not found", body = ErrorResponse),
    )
)]
pub async fn get_asset(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let asset = state
        .store
        .asset_by_id(AssetId::from_uuid(id))
        .await?
        .ok_or(GatewayError::NotFound("asset"))?;
    Ok(Json(AssetResponse {
        asset: AssetDto::from(asset),
    }))
}

/// Asset routes. The upload route raises the body limit to
/// `max_upload_bytes`.
pub fn routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/upload/{kind}",
            post(upload_asset).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/assets/{id}", get(get_asset))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_lowercased() {
        assert_eq!(extension_of("Rig.GLB").as_deref(), Some("glb"));
        assert_eq!(extension_of("map.final.JPEG").as_deref(), Some("jpeg"));
    }

    #[test]
    fn missing_extension_is_rejected() {
        assert_eq!(extension_of("noext"), None);
    }
}
