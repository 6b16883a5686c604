//! Duplicate-attempt guard for in-flight uploads.

use crate::config::SyncConfig;
use fitsync_core::{SessionId, Timestamp};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Default)]
struct GuardInner {
    in_flight: HashSet<SessionId>,
    last_attempt_at: HashMap<SessionId, Timestamp>,
}

/// Prevents two concurrent upload attempts for the same session.
///
/// Sync cycles can be triggered from independent events (app start, a
/// session just ending, a manual refresh) that may race; without this
/// guard the same session could be uploaded twice concurrently before
/// the first result lands in the ledger. A short per-session throttle
/// window additionally absorbs rapid re-entry from overlapping
/// triggers.
pub struct InFlightGuard {
    min_retry_interval_secs: i64,
    inner: Arc<Mutex<GuardInner>>,
}

impl InFlightGuard {
    /// Creates a guard with the throttle window taken from `config`.
    #[must_use]
    pub fn new(config: &SyncConfig) -> Self {
        Self {
            min_retry_interval_secs: config.min_retry_interval_secs,
            inner: Arc::new(Mutex::new(GuardInner::default())),
        }
    }

    /// Claims `id` for an upload attempt.
    ///
    /// Returns `None` if the session is already mid-upload, or if an
    /// attempt was made within the throttle window. On success the
    /// returned permit holds the claim; dropping it releases the
    /// session on every exit path, including unwinding.
    #[must_use]
    pub fn try_acquire(&self, id: SessionId, now: Timestamp) -> Option<InFlightPermit> {
        let mut inner = self.inner.lock();

        if inner.in_flight.contains(&id) {
            return None;
        }
        if let Some(&last) = inner.last_attempt_at.get(&id) {
            if now.as_millis() - last.as_millis() < self.min_retry_interval_secs * 1000 {
                return None;
            }
        }

        inner.in_flight.insert(id);
        inner.last_attempt_at.insert(id, now);
        Some(InFlightPermit {
            id,
            inner: Arc::clone(&self.inner),
        })
    }

    /// Returns true if `id` is currently mid-upload.
    #[must_use]
    pub fn is_in_flight(&self, id: SessionId) -> bool {
        self.inner.lock().in_flight.contains(&id)
    }
}

/// A claim on one session's upload slot.
///
/// Released on drop; exactly one permit exists per session at a time.
pub struct InFlightPermit {
    id: SessionId,
    inner: Arc<Mutex<GuardInner>>,
}

impl InFlightPermit {
    /// The session this permit claims.
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }
}

impl Drop for InFlightPermit {
    fn drop(&mut self) {
        self.inner.lock().in_flight.remove(&self.id);
    }
}
