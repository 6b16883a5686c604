//! Shared failure backoff.

use crate::config::SyncConfig;
use fitsync_core::Timestamp;
use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, Default)]
struct BackoffState {
    last_failure_at: Option<Timestamp>,
    cooldown_secs: i64,
}

/// One shared cooldown window for the whole engine.
///
/// Upload failures are almost always global conditions (outage, stale
/// auth) that affect every upload equally, so the cooldown is shared
/// rather than per-session. After a failure the window starts at the
/// base value and doubles per subsequent failure up to the cap; any
/// success clears it.
///
/// Invariant: `cooldown_secs == 0` exactly when `last_failure_at` is
/// `None`.
#[derive(Debug)]
pub struct BackoffController {
    base_cooldown_secs: i64,
    max_cooldown_secs: i64,
    state: Mutex<BackoffState>,
}

impl BackoffController {
    /// Creates a controller with cooldown bounds taken from `config`.
    #[must_use]
    pub fn new(config: &SyncConfig) -> Self {
        Self {
            base_cooldown_secs: config.base_cooldown_secs,
            max_cooldown_secs: config.max_cooldown_secs,
            state: Mutex::new(BackoffState::default()),
        }
    }

    /// Returns true if `now` still falls inside the cooldown window.
    #[must_use]
    pub fn should_skip(&self, now: Timestamp) -> bool {
        let state = self.state.lock();
        match state.last_failure_at {
            Some(failed_at) => now.secs_since(failed_at) < state.cooldown_secs,
            None => false,
        }
    }

    /// Records a failure at `now` and escalates the cooldown.
    pub fn on_failure(&self, now: Timestamp) {
        let mut state = self.state.lock();
        state.last_failure_at = Some(now);
        state.cooldown_secs = if state.cooldown_secs == 0 {
            self.base_cooldown_secs
        } else {
            (state.cooldown_secs * 2).min(self.max_cooldown_secs)
        };
    }

    /// Clears the cooldown after any successful upload.
    pub fn on_success(&self) {
        let mut state = self.state.lock();
        state.last_failure_at = None;
        state.cooldown_secs = 0;
    }

    /// Returns the current cooldown window in seconds.
    #[must_use]
    pub fn cooldown_secs(&self) -> i64 {
        self.state.lock().cooldown_secs
    }
}
