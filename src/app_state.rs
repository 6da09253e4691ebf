//! Shared application state injected into all Axum handlers.

use std::path::PathBuf;
use std::sync::Arc;

use crate::api::auth::AuthKeys;
use crate::persistence::GatewayStore;
use crate::service::{BuildService, LifecycleService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Row-level store behind the persistence switch.
    pub store: Arc<dyn GatewayStore>,
    /// Metaverse lifecycle manager.
    pub lifecycle: Arc<LifecycleService>,
    /// Build pipeline simulator.
    pub builds: Arc<BuildService>,
    /// Token mint/verify keys.
    pub auth: Arc<AuthKeys>,
    /// Directory uploaded files are written to.
    pub upload_dir: PathBuf,
}
