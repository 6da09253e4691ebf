//! Subscription entity and billing plan rules.
//!
//! Each user has exactly one subscription. `used_hours` counts consumed
//! capacity against `monthly_hours`; buying extra hours *decreases*
//! `used_hours` (floored at zero) rather than raising the monthly cap.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ids::{SubscriptionId, UserId};

/// Billing plan tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Plan {
    /// Entry tier.
    Indie,
    /// Mid tier.
    Pro,
    /// Top tier.
    Studio,
}

impl Plan {
    /// Monthly hour allowance granted when upgrading to this plan
    /// without an explicit override.
    #[must_use]
    pub const fn default_monthly_hours(&self) -> i32 {
        match self {
            Self::Indie => 200,
            Self::Pro => 400,
            Self::Studio => 800,
        }
    }

    /// Stable string form used for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Indie => "INDIE",
            Self::Pro => "PRO",
            Self::Studio => "STUDIO",
        }
    }

    /// Parses the storage string form.
    #[must_use]
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "INDIE" => Some(Self::Indie),
            "PRO" => Some(Self::Pro),
            "STUDIO" => Some(Self::Studio),
            _ => None,
        }
    }
}

/// A user's billing subscription (1:1 with the user).
#[derive(Debug, Clone, PartialEq)]
pub struct Subscription {
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

impl Subscription {
    /// Creates the default INDIE subscription provisioned at signup.
    #[must_use]
    pub fn new(user_id: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: SubscriptionId::new(),
            user_id,
            plan: Plan::Indie,
            monthly_hours: Plan::Indie.default_monthly_hours(),
            used_hours: 0,
            reset_date: now,
            next_billing: now + Duration::days(30),
        }
    }

    /// Applies a top-up purchase of `hours`. Added capacity is modeled
    /// by decreasing `used_hours`, floored at zero.
    pub fn credit_hours(&mut self, hours: i32) {
        self.used_hours = (self.used_hours - hours).max(0);
    }

    /// Switches to `plan`, taking the plan's default allowance unless an
    /// explicit `monthly_hours` override is given. `used_hours` is
    /// clamped down to the new allowance and the billing date advances
    /// 30 days from `now`.
    pub fn change_plan(&mut self, plan: Plan, monthly_hours: Option<i32>, now: DateTime<Utc>) {
        let target = monthly_hours.unwrap_or_else(|| plan.default_monthly_hours());
        self.plan = plan;
        self.monthly_hours = target;
        self.used_hours = self.used_hours.min(target);
        self.next_billing = now + Duration::days(30);
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn signup_subscription_is_indie_with_defaults() {
        let sub = Subscription::new(UserId::new());
        assert_eq!(sub.plan, Plan::Indie);
        assert_eq!(sub.monthly_hours, 200);
        assert_eq!(sub.used_hours, 0);
    }

    #[test]
    fn credit_hours_decreases_used_hours() {
        let mut sub = Subscription::new(UserId::new());
        sub.monthly_hours = 200;
        sub.used_hours = 150;
        sub.credit_hours(30);
        assert_eq!(sub.used_hours, 120);
    }

    #[test]
    fn credit_hours_floors_at_zero() {
        let mut sub = Subscription::new(UserId::new());
        sub.used_hours = 20;
        sub.credit_hours(50);
        assert_eq!(sub.used_hours, 0);
    }

    #[test]
    fn upgrade_without_override_uses_plan_default() {
        let mut sub = Subscription::new(UserId::new());
        sub.used_hours = 150;
        let now = Utc::now();
        sub.change_plan(Plan::Studio, None, now);
        assert_eq!(sub.plan, Plan::Studio);
        assert_eq!(sub.monthly_hours, 800);
        assert_eq!(sub.used_hours, 150);
        assert_eq!(sub.next_billing, now + Duration::days(30));
    }

    #[test]
    fn downgrade_clamps_used_hours_to_new_allowance() {
        let mut sub = Subscription::new(UserId::new());
        sub.monthly_hours = 800;
        sub.used_hours = 500;
        sub.change_plan(Plan::Indie, None, Utc::now());
        assert_eq!(sub.monthly_hours, 200);
        assert_eq!(sub.used_hours, 200);
    }

    #[test]
    fn explicit_monthly_hours_wins_over_default() {
        let mut sub = Subscription::new(UserId::new());
        sub.change_plan(Plan::Pro, Some(650), Utc::now());
        assert_eq!(sub.monthly_hours, 650);
    }

    #[test]
    fn plan_storage_round_trip() {
        for plan in [Plan::Indie, Plan::Pro, Plan::Studio] {
            assert_eq!(Plan::from_str_opt(plan.as_str()), Some(plan));
        }
        assert_eq!(Plan::from_str_opt("ENTERPRISE"), None);
    }
}
