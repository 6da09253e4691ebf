//! Subscription DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Plan, Subscription, SubscriptionId, UserId};

/// Subscription representation returned by the subscription endpoints.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionDto {
    /// Unique identifier.
    pub id: SubscriptionId,
    /// Owning user.
    pub user_id: UserId,
    /// Current plan tier.
    pub plan: Plan,
    /// Hour allowance per billing month.
    pub monthly_hours: i32,
    /// Hours consumed against the allowance.
    pub used_hours: i32,
    /// Start of the current usage window.
    pub reset_date: DateTime<Utc>,
    /// Next billing date.
    pub next_billing: DateTime<Utc>,
}

impl From<Subscription> for SubscriptionDto {
    fn from(sub: Subscription) -> Self {
        Self {
            id: sub.id,
            user_id: sub.user_id,
            plan: sub.plan,
            monthly_hours: sub.monthly_hours,
            used_hours: sub.used_hours,
            reset_date: sub.reset_date,
            next_billing: sub.next_billing,
        }
    }
}

/// Request body for `POST /api/subscription/buy-hours`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct BuyHoursRequest {
    /// Hours to add, between 1 and 500.
    pub hours: i32,
}

/// Request body for `POST /api/subscription/upgrade`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeRequest {
    /// Target plan tier.
    pub plan: Plan,
    /// Optional allowance override, between 50 and 1000. The plan's
    /// default allowance applies when omitted.
    #[serde(default)]
    pub monthly_hours: Option<i32>,
}
