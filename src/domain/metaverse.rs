//! Metaverse instance entity and its lifecycle state machine.
//!
//! A metaverse is a user-owned simulated game-server instance. Its
//! `status` field is the invariant-bearing one: every lifecycle action
//! validates the current status before mutating, and every delayed
//! resolution commits only if the status is still the one it assumed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ids::{MetaverseId, UserId};

/// Rendering mode of a metaverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetaverseKind {
    /// Flat 2D world.
    TwoD,
    /// Full 3D world.
    ThreeD,
}

impl MetaverseKind {
    /// Stable string form used for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TwoD => "TWO_D",
            Self::ThreeD => "THREE_D",
        }
    }

    /// Parses the storage string form.
    #[must_use]
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "TWO_D" => Some(Self::TwoD),
            "THREE_D" => Some(Self::ThreeD),
            _ => None,
        }
    }
}

/// Hosting region of a metaverse instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Region {
    /// Asia-Pacific.
    Asia,
    /// Europe.
    Eu,
    /// United States.
    Us,
}

impl Region {
    /// Stable string form used for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asia => "ASIA",
            Self::Eu => "EU",
            Self::Us => "US",
        }
    }

    /// Parses the storage string form.
    #[must_use]
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "ASIA" => Some(Self::Asia),
            "EU" => Some(Self::Eu),
            "US" => Some(Self::Us),
            _ => None,
        }
    }
}

/// Lifecycle status of a metaverse instance.
///
/// Initial state is [`Stopped`](Self::Stopped). There is no terminal
/// state; [`Error`](Self::Error) is recoverable via `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetaverseStatus {
    /// Instance is down and can be started.
    Stopped,
    /// Provisioning in flight; resolves to RUNNING or ERROR.
    Starting,
    /// Instance is live; usage accrues while in this state.
    Running,
    /// Deprovisioning in flight; resolves to STOPPED (or STARTING on
    /// restart).
    Stopping,
    /// Simulated provisioning failure. Startable again.
    Error,
}

impl MetaverseStatus {
    /// Stable string form used for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Stopped => "STOPPED",
            Self::Starting => "STARTING",
            Self::Running => "RUNNING",
            Self::Stopping => "STOPPING",
            Self::Error => "ERROR",
        }
    }

    /// Parses the storage string form.
    #[must_use]
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "STOPPED" => Some(Self::Stopped),
            "STARTING" => Some(Self::Starting),
            "RUNNING" => Some(Self::Running),
            "STOPPING" => Some(Self::Stopping),
            "ERROR" => Some(Self::Error),
            _ => None,
        }
    }

    /// Whether `start` is legal from this status.
    #[must_use]
    pub const fn can_start(&self) -> bool {
        matches!(self, Self::Stopped | Self::Error)
    }

    /// Whether `stop` is legal from this status.
    #[must_use]
    pub const fn can_stop(&self) -> bool {
        matches!(self, Self::Running | Self::Error)
    }

    /// Whether `restart` is legal from this status.
    #[must_use]
    pub const fn can_restart(&self) -> bool {
        matches!(self, Self::Running)
    }
}

impl std::fmt::Display for MetaverseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user-owned simulated game-server instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Metaverse {
    /// Unique identifier (immutable after creation).
    pub id: MetaverseId,
    /// Owning user.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Rendering mode.
    pub kind: MetaverseKind,
    /// Hosting region.
    pub region: Region,
    /// Current lifecycle status.
    pub status: MetaverseStatus,
    /// Simulated concurrent player count. Zero unless RUNNING.
    pub players_online: i32,
    /// Minutes this instance has spent RUNNING, accrued by the usage
    /// tracker.
    pub uptime_minutes: i32,
    /// Whole player-hours consumed, accrued by the usage tracker.
    pub hours_used: i32,
    /// Deployed version label.
    pub version: String,
    /// Optional thumbnail URL.
    pub thumbnail: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Metaverse {
    /// Creates a new instance in the STOPPED state with zeroed counters.
    #[must_use]
    pub fn new(user_id: UserId, name: String, kind: MetaverseKind, region: Region) -> Self {
        let now = Utc::now();
        Self {
            id: MetaverseId::new(),
            user_id,
            name,
            kind,
            region,
            status: MetaverseStatus::Stopped,
            players_online: 0,
            uptime_minutes: 0,
            hours_used: 0,
            version: "v1.0.0".to_string(),
            thumbnail: None,
            created_at: now,
            updated_at: now,
        }
    }
}
