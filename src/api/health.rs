//! Shared refresh status for the /health endpoint.
//! Updated by the Refresher, read by the API.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

/// Shared health metrics.
#[derive(Default)]
pub struct HealthState {
    /// True while a fetch + evaluate cycle is running.
    refresh_in_flight: AtomicBool,
    /// Unix seconds of the last successful refresh (0 = none).
    last_success_at: AtomicU64,
    /// Unix seconds of the last failed refresh (0 = none).
    last_failure_at: AtomicU64,
    last_error: Mutex<Option<String>>,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the refresh slot. Returns a guard that releases it on drop, or None if a
    /// refresh is already running.
    pub fn try_begin_refresh(&self) -> Option<RefreshGuard<'_>> {
        self.refresh_in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RefreshGuard { health: self })
    }

    pub fn refresh_in_flight(&self) -> bool {
        self.refresh_in_flight.load(Ordering::Acquire)
    }

    pub fn record_success(&self, at_secs: u64) {
        self.last_success_at.store(at_secs, Ordering::Relaxed);
        if let Ok(mut e) = self.last_error.lock() {
            *e = None;
        }
    }

    pub fn record_failure(&self, at_secs: u64, error: String) {
        self.last_failure_at.store(at_secs, Ordering::Relaxed);
        if let Ok(mut e) = self.last_error.lock() {
            *e = Some(error);
        }
    }

    pub fn last_success_at(&self) -> Option<u64> {
        nonzero(self.last_success_at.load(Ordering::Relaxed))
    }

    pub fn last_failure_at(&self) -> Option<u64> {
        nonzero(self.last_failure_at.load(Ordering::Relaxed))
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().ok().and_then(|e| e.clone())
    }
}

fn nonzero(v: u64) -> Option<u64> {
    (v != 0).then_some(v)
}

/// Held for the duration of one refresh cycle.
pub struct RefreshGuard<'a> {
    health: &'a HealthState,
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.health.refresh_in_flight.store(false, Ordering::Release);
    }
}
