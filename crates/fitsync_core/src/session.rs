//! Workout session records.

use crate::time::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a workout session.
///
/// Session IDs are assigned when a session is first recorded and never
/// change afterwards.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Generates a fresh random session ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session:{}", self.0)
    }
}

/// A workout session as recorded by the on-device tracker.
///
/// `ended_at` stays `None` while the session is in progress; only
/// completed sessions are visible to the sync engine. Aggregate fields
/// are carried through to the upload payload unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSession {
    /// Stable session identifier.
    pub id: SessionId,
    /// User-visible session title.
    pub title: String,
    /// When the session was started.
    pub started_at: Timestamp,
    /// When the session was completed, if it has been.
    pub ended_at: Option<Timestamp>,
    /// Total number of sets performed.
    pub total_sets: u32,
    /// Total number of reps performed.
    pub total_reps: u32,
    /// Total volume lifted, in kilograms.
    pub volume: f64,
}

impl WorkoutSession {
    /// Returns true if the session is completed and non-empty.
    ///
    /// Sessions with zero sets are discarded drafts and never sync.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.ended_at.is_some() && self.total_sets > 0
    }
}
