//! REST API layer: route handlers, DTOs, auth, and router composition.
//!
//! Resource endpoints are mounted under `/api`; the health check lives
//! at the root.

pub mod auth;
pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// Builds the complete API router with all REST endpoints.
pub fn build_router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .nest("/api", handlers::routes(max_upload_bytes))
        .merge(handlers::system::routes())
}

/// OpenAPI document for the whole REST surface.
#[derive(Debug, OpenApi)]
#[openapi(
    paths(
        handlers::auth::signup,
        handlers::auth::login,
        handlers::auth::me,
        handlers::metaverse::create_metaverse,
        handlers::metaverse::list_metaverses,
        handlers::metaverse::get_metaverse,
        handlers::metaverse::start_metaverse,
        handlers::metaverse::stop_metaverse,
        handlers::metaverse::restart_metaverse,
        handlers::metaverse::delete_metaverse,
        handlers::subscription::get_subscription,
        handlers::subscription::buy_hours,
        handlers::subscription::upgrade,
        handlers::build::create_build,
        handlers::build::get_build,
        handlers::project::save_project,
        handlers::asset::upload_asset,
        handlers::asset::get_asset,
        handlers::system::health_handler,
    ),
    components(schemas(
        crate::error::ErrorResponse,
        crate::error::ErrorBody,
        dto::AuthResponse,
        dto::CredentialsRequest,
        dto::UserDto,
        dto::CreateMetaverseRequest,
        dto::MetaverseDto,
        dto::SubscriptionDto,
        dto::BuyHoursRequest,
        dto::UpgradeRequest,
        dto::CreateBuildRequest,
        dto::CreateBuildResponse,
        dto::BuildStatusResponse,
        dto::SaveProjectRequest,
        dto::ProjectDto,
        dto::ProjectResponse,
        dto::AssetDto,
        dto::AssetResponse,
    )),
    tags(
        (name = "Auth", description = "Account registration and bearer tokens"),
        (name = "Metaverses", description = "Instance CRUD and lifecycle actions"),
        (name = "Subscription", description = "Plan and usage-hour management"),
        (name = "Builds", description = "Simulated asset build pipeline"),
        (name = "Projects", description = "Asset bundling"),
        (name = "Assets", description = "Asset upload and lookup"),
        (name = "System", description = "Health and metadata"),
    )
)]
pub struct ApiDoc;
