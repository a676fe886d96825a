//! The usage gate.
//!
//! State sits behind a std `Mutex`: `record_usage()` is a read-modify-write
//! on the counter and concurrent callers must not lose increments.

use super::store::EntitlementStore;
use super::{
    EntitlementState, Remaining, UsageCheck, FREE_MAX_IMAGES, FREE_USAGE_LIMIT, PRO_MAX_IMAGES,
};
use chrono::{Local, NaiveDate};
use std::sync::{Mutex, MutexGuard};

struct GateInner {
    state: EntitlementState,
    /// Set when the last save failed; the next mutation writes again.
    pending_write: bool,
}

pub struct EntitlementGate<S: EntitlementStore> {
    store: S,
    inner: Mutex<GateInner>,
}

impl<S: EntitlementStore> EntitlementGate<S> {
    /// Load persisted state from `store`.
    ///
    /// A missing or unreadable store starts from the default state
    /// (free tier, nothing used).
    pub fn load(store: S) -> Self {
        let state = match store.load() {
            Ok(Some(state)) => {
                log::info!(
                    "[GATE] Loaded state: pro={}, count={}, last={:?}",
                    state.is_pro,
                    state.daily_usage_count,
                    state.last_usage_date
                );
                state
            }
            Ok(None) => {
                log::info!("[GATE] No persisted state — starting fresh");
                EntitlementState::default()
            }
            Err(e) => {
                log::warn!("[GATE] Failed to load state, starting fresh: {}", e);
                EntitlementState::default()
            }
        };
        Self::with_state(store, state)
    }

    /// Build a gate around an explicit state without reading the store.
    pub fn with_state(store: S, state: EntitlementState) -> Self {
        Self {
            store,
            inner: Mutex::new(GateInner {
                state,
                pending_write: false,
            }),
        }
    }

    /// Daily free allowance. Fixed for every free user.
    pub fn free_limit(&self) -> u32 {
        FREE_USAGE_LIMIT
    }

    /// May the caller spend one generation today?
    pub fn check(&self) -> UsageCheck {
        self.check_on(today())
    }

    /// `check()` against an explicit calendar date. Never mutates.
    pub fn check_on(&self, today: NaiveDate) -> UsageCheck {
        let inner = self.lock();
        if inner.state.is_pro {
            return UsageCheck {
                allowed: true,
                remaining: Remaining::Unlimited,
            };
        }
        let used = inner.state.effective_count(today);
        UsageCheck {
            allowed: used < FREE_USAGE_LIMIT,
            remaining: Remaining::Count(FREE_USAGE_LIMIT.saturating_sub(used)),
        }
    }

    /// Consume one generation. Call only after the inference call succeeded.
    pub fn record_usage(&self) {
        self.record_usage_on(today())
    }

    /// `record_usage()` against an explicit calendar date.
    ///
    /// No-op for pro users. Persistence failures are logged and swallowed.
    pub fn record_usage_on(&self, today: NaiveDate) {
        let mut inner = self.lock();
        if inner.state.is_pro {
            log::debug!("[GATE] Pro user — usage not counted");
            return;
        }

        if inner.state.last_usage_date != Some(today) {
            if inner.state.daily_usage_count > 0 {
                log::info!(
                    "[GATE] Day rollover ({:?} → {}), resetting count from {}",
                    inner.state.last_usage_date,
                    today,
                    inner.state.daily_usage_count
                );
            }
            inner.state.daily_usage_count = 0;
        }
        inner.state.daily_usage_count = inner.state.daily_usage_count.saturating_add(1);
        inner.state.last_usage_date = Some(today);
        log::info!(
            "[GATE] Usage recorded: {}/{} on {}",
            inner.state.daily_usage_count,
            FREE_USAGE_LIMIT,
            today
        );

        self.persist(&mut inner);
    }

    /// Update the pro flag from the commerce layer.
    pub fn set_pro(&self, is_pro: bool) {
        let mut inner = self.lock();
        if inner.state.is_pro == is_pro && !inner.pending_write {
            return;
        }
        inner.state.is_pro = is_pro;
        log::info!("[GATE] Pro status set to {}", is_pro);
        self.persist(&mut inner);
    }

    pub fn is_pro(&self) -> bool {
        self.lock().state.is_pro
    }

    /// Screenshots allowed per request for the current tier.
    pub fn max_images(&self) -> usize {
        if self.is_pro() {
            PRO_MAX_IMAGES
        } else {
            FREE_MAX_IMAGES
        }
    }

    /// Snapshot of the in-memory state.
    pub fn state(&self) -> EntitlementState {
        self.lock().state.clone()
    }

    /// True while the most recent save failed.
    pub fn has_pending_write(&self) -> bool {
        self.lock().pending_write
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn persist(&self, inner: &mut GateInner) {
        match self.store.save(&inner.state) {
            Ok(()) => {
                if inner.pending_write {
                    log::info!("[GATE] Deferred write succeeded");
                }
                inner.pending_write = false;
            }
            Err(e) => {
                log::warn!("[GATE] Failed to persist state, will retry on next change: {}", e);
                inner.pending_write = true;
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, GateInner> {
        // A poisoned lock still holds a consistent counter: every mutation
        // completes before anything that could panic.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
