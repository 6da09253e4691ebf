//! metaforge-gateway server entry point.
//!
//! Starts the Axum HTTP server with the REST endpoints and static
//! upload serving.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use metaforge_gateway::api;
use metaforge_gateway::app_state::AppState;
use metaforge_gateway::config::GatewayConfig;
use metaforge_gateway::persistence::{GatewayStore, MemoryStore, PgStore};
use metaforge_gateway::seed;
use metaforge_gateway::service::{BuildService, LifecycleService, UsageTracker};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = GatewayConfig::from_env()?;
    tracing::info!(addr = %config.listen_addr, "starting metaforge-gateway");

    // Select the store behind the persistence switch
    let store: Arc<dyn GatewayStore> = if config.persistence_enabled {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await
            .context("failed to connect to PostgreSQL")?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to run database migrations")?;
        Arc::new(PgStore::new(pool))
    } else {
        tracing::warn!("persistence disabled; running on the in-memory store");
        Arc::new(MemoryStore::new())
    };

    if config.seed_demo_data {
        seed::ensure_demo_creator(&store).await?;
    }

    // Build service layer
    let tracker = Arc::new(UsageTracker::new(
        Arc::clone(&store),
        config.simulation.usage_tick_period,
    ));
    let lifecycle = Arc::new(LifecycleService::new(
        Arc::clone(&store),
        Arc::clone(&tracker),
        config.simulation.clone(),
    ));
    let builds = Arc::new(BuildService::new(Arc::clone(&store), &config.simulation));
    let auth = Arc::new(api::auth::AuthKeys::new(
        &config.jwt_secret,
        config.token_ttl_hours,
    ));

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .context("unable to create upload directory")?;

    // Build application state
    let app_state = AppState {
        store,
        lifecycle,
        builds,
        auth,
        upload_dir: config.upload_dir.clone(),
    };

    // Build router
    let app = Router::new()
        .merge(api::build_router(config.max_upload_bytes))
        .nest_service("/uploads", ServeDir::new(&config.upload_dir))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(TimeoutLayer::new(Duration::from_secs(
                    config.request_timeout_secs,
                ))),
        )
        .with_state(app_state);

    #[cfg(feature = "swagger-ui")]
    let app = app.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui").url(
            "/api-docs/openapi.json",
            <api::ApiDoc as utoipa::OpenApi>::openapi(),
        ),
    );

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Tear down in-process tracking registrations before exit.
    tracker.shutdown();

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for shutdown signal");
    }
}
