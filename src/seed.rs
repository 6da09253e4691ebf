//! Demo data seeding.
//!
//! Creates a ready-to-explore creator account with a populated
//! subscription and three sample metaverses in characteristic states.
//! Runs at startup unless `SEED_DEMO_DATA=false`.

use std::sync::Arc;

use crate::api::auth::hash_password;
use crate::domain::{Metaverse, MetaverseKind, MetaverseStatus, Region, Subscription, User};
use crate::error::GatewayError;
use crate::persistence::GatewayStore;

/// Login email of the demo creator account.
pub const DEMO_EMAIL: &str = "demo@metaforge.dev";
/// Password of the demo creator account.
pub const DEMO_PASSWORD: &str = "demo123";

/// Creates the demo creator account if it does not exist yet.
///
/// The seeded RUNNING instance has no tracker registration attached;
/// it accrues no usage until a lifecycle action re-arms tracking.
///
/// # Errors
///
/// Returns [`GatewayError`] on store or hashing failure.
pub async fn ensure_demo_creator(store: &Arc<dyn GatewayStore>) -> Result<(), GatewayError> {
    if store.user_by_email(DEMO_EMAIL).await?.is_some() {
        return Ok(());
    }

    let password_hash = hash_password(DEMO_PASSWORD)?;
    let user = User::new(DEMO_EMAIL.to_string(), password_hash);
    store.insert_user(&user).await?;

    let mut subscription = Subscription::new(user.id);
    subscription.used_hours = 128;
    store.insert_subscription(&subscription).await?;

    let mut ocean = Metaverse::new(
        user.id,
        "Ocean Explorers".to_string(),
        MetaverseKind::ThreeD,
        Region::Asia,
    );
    ocean.status = MetaverseStatus::Running;
    ocean.players_online = 12;
    ocean.uptime_minutes = 270;
    ocean.hours_used = 72;
    store.insert_metaverse(&ocean).await?;

    let mut skyline = Metaverse::new(
        user.id,
        "Skyline Demo".to_string(),
        MetaverseKind::ThreeD,
        Region::Eu,
    );
    skyline.status = MetaverseStatus::Stopped;
    store.insert_metaverse(&skyline).await?;

    let mut tiny_fish = Metaverse::new(
        user.id,
        "Tiny Fish".to_string(),
        MetaverseKind::TwoD,
        Region::Us,
    );
    tiny_fish.status = MetaverseStatus::Error;
    store.insert_metaverse(&tiny_fish).await?;

    tracing::info!(email = DEMO_EMAIL, "demo creator seeded");
    Ok(())
}
