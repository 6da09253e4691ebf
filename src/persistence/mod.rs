//! Persistence layer: the row-level store trait and its two backends.
//!
//! [`PgStore`] is the durable PostgreSQL backend; [`MemoryStore`] backs
//! demo mode and tests. Which one a deployment gets is decided once at
//! startup by the `PERSISTENCE_ENABLED` switch.

pub mod memory;
pub mod postgres;
pub mod store;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use store::GatewayStore;
