//! Local session store interface.

use crate::error::{CoreError, CoreResult};
use crate::session::{SessionId, WorkoutSession};
use crate::time::Timestamp;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Read access to locally recorded sessions.
///
/// Implemented by the on-device persistence layer. The sync engine
/// only ever reads through this trait; it never mutates session
/// records.
pub trait SessionStore: Send + Sync {
    /// Lists completed sessions, ordered by `ended_at` ascending.
    ///
    /// When `after` is set, only sessions that ended strictly after the
    /// cursor are returned. At most `limit` sessions are returned;
    /// older sessions beyond the limit remain visible to later calls.
    fn list_ended_sessions(
        &self,
        after: Option<Timestamp>,
        limit: usize,
    ) -> CoreResult<Vec<WorkoutSession>>;
}

/// An in-memory session store.
///
/// Used by tests and by embedders that keep the active session log in
/// RAM. Can be switched into a failing mode to exercise store-outage
/// paths.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<SessionId, WorkoutSession>>,
    fail_reads: RwLock<bool>,
}

impl MemorySessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a session record.
    pub fn upsert(&self, session: WorkoutSession) {
        self.sessions.write().insert(session.id, session);
    }

    /// Rewrites a session's completion time.
    ///
    /// Models the tracker correcting a session's end time after the
    /// fact. Returns false if the session is unknown.
    pub fn set_ended_at(&self, id: SessionId, ended_at: Option<Timestamp>) -> bool {
        match self.sessions.write().get_mut(&id) {
            Some(session) => {
                session.ended_at = ended_at;
                true
            }
            None => false,
        }
    }

    /// Makes every subsequent read fail, or restores normal reads.
    pub fn set_fail_reads(&self, fail: bool) {
        *self.fail_reads.write() = fail;
    }

    /// Returns the number of stored sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// Returns true if no sessions are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

impl SessionStore for MemorySessionStore {
    fn list_ended_sessions(
        &self,
        after: Option<Timestamp>,
        limit: usize,
    ) -> CoreResult<Vec<WorkoutSession>> {
        if *self.fail_reads.read() {
            return Err(CoreError::StoreUnavailable(
                "simulated read failure".into(),
            ));
        }

        let sessions = self.sessions.read();
        let mut ended: Vec<WorkoutSession> = sessions
            .values()
            .filter(|s| match (s.ended_at, after) {
                (Some(ended_at), Some(cursor)) => ended_at > cursor,
                (Some(_), None) => true,
                (None, _) => false,
            })
            .cloned()
            .collect();

        ended.sort_by_key(|s| s.ended_at);
        ended.truncate(limit);
        Ok(ended)
    }
}
