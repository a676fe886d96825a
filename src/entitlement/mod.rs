//! Entitlement domain — the local daily usage quota.
//!
//! Decides whether the caller may spend one generation. Free users get
//! `FREE_USAGE_LIMIT` generations per calendar day; pro users are unlimited.
//!
//! Two-phase contract:
//!   1. `EntitlementGate::check()` before dispatching (side-effect free)
//!   2. `EntitlementGate::record_usage()` only after the inference call succeeded

mod gate;
mod store;

pub use gate::EntitlementGate;
pub use store::{EntitlementStore, JsonFileStore, MemoryStore, StoreError};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Free generations per calendar day.
pub const FREE_USAGE_LIMIT: u32 = 3;

/// Screenshots per request for free users.
pub const FREE_MAX_IMAGES: usize = 1;

/// Screenshots per request for pro users.
pub const PRO_MAX_IMAGES: usize = 5;

/// Persisted entitlement state.
///
/// `is_pro` is refreshed by the commerce layer; this crate only stores it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitlementState {
    #[serde(default)]
    pub is_pro: bool,
    #[serde(default)]
    pub daily_usage_count: u32,
    #[serde(default)]
    pub last_usage_date: Option<NaiveDate>,
}

impl EntitlementState {
    /// Usage count as seen on `today`. A count from any other day is stale.
    pub fn effective_count(&self, today: NaiveDate) -> u32 {
        match self.last_usage_date {
            Some(date) if date == today => self.daily_usage_count,
            _ => 0,
        }
    }
}

/// How many generations are left today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "count")]
pub enum Remaining {
    Unlimited,
    Count(u32),
}

impl std::fmt::Display for Remaining {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Remaining::Unlimited => write!(f, "unlimited"),
            Remaining::Count(n) => write!(f, "{}", n),
        }
    }
}

/// Result of `EntitlementGate::check()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageCheck {
    pub allowed: bool,
    pub remaining: Remaining,
}
