//! REST endpoint handlers organized by resource.

pub mod asset;
pub mod auth;
pub mod build;
pub mod metaverse;
pub mod project;
pub mod subscription;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes mounted under `/api`.
pub fn routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .merge(auth::routes())
        .merge(metaverse::routes())
        .merge(subscription::routes())
        .merge(build::routes())
        .merge(project::routes())
        .merge(asset::routes(max_upload_bytes))
}
