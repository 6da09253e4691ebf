//! # metaforge-gateway
//!
//! REST API backend for a simulated game-server hosting and asset
//! build platform. Users authenticate, bundle uploaded assets into a
//! project, trigger a simulated build pipeline, and manage mock
//! game-server instances ("metaverses") plus subscription billing.
//!
//! Nothing here provisions real servers or processes real assets —
//! provisioning latency, flaky starts, build stages, and usage
//! accrual are all simulated with timers against the store.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── LifecycleService ── UsageTracker (service/)
//!     ├── BuildService (service/)
//!     │
//!     ├── Domain entities & state machine (domain/)
//!     │
//!     └── GatewayStore: PostgreSQL or in-memory (persistence/)
//! ```
//!
//! Every delayed effect — start/stop/restart resolutions, build stage
//! timers — commits through a compare-and-swap on the row's status, so
//! a stale timer silently no-ops instead of clobbering a state reached
//! through a different path.

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod seed;
pub mod service;
