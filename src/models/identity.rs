//! Authenticated user identity and the countdown display cache.

use serde::{Deserialize, Serialize};

/// Account role reported by `/account-details`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Store administrator, allowed into the admin panel
    Admin,
    /// Regular shopper; unknown role strings are treated as this
    #[default]
    #[serde(other)]
    Customer,
}

/// The `data` payload of a successful `/account-details` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Opaque user identifier
    #[serde(rename = "_id", default)]
    pub user_id: Option<String>,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Account email
    #[serde(default)]
    pub email: Option<String>,
    /// Contact phone number
    #[serde(default)]
    pub phone: Option<String>,
    /// Account role
    #[serde(default)]
    pub role: Role,
}

impl Identity {
    /// Whether this identity may use the admin panel.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Hours/minutes/seconds left in the session, persisted under `remainingTime`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemainingTime {
    /// Whole hours left (mod 24)
    pub hours: u64,
    /// Whole minutes left (mod 60)
    pub minutes: u64,
    /// Whole seconds left (mod 60)
    pub seconds: u64,
}

impl RemainingTime {
    /// Breaks a positive millisecond count down into display units.
    /// Negative input is treated as zero.
    #[must_use]
    pub fn from_millis(millis: i64) -> Self {
        let millis = u64::try_from(millis).unwrap_or(0);
        Self {
            hours: (millis / (1000 * 60 * 60)) % 24,
            minutes: (millis / (1000 * 60)) % 60,
            seconds: (millis / 1000) % 60,
        }
    }
}
