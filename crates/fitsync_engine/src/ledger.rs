//! The durable sync ledger: which session completions reached the
//! remote store.

use fitsync_core::{SessionId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Namespaced key under which the ledger is persisted.
pub const LEDGER_KEY: &str = "fitsync.ledger.v1";

/// Durable proof that a specific completion-state of a session reached
/// the remote store.
///
/// A mark is content-addressed on the completion timestamp: it only
/// counts if `synced_ended_at` equals the session's *current*
/// `ended_at`. A later correction to `ended_at` invalidates the mark
/// and the session becomes a candidate again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncMark {
    /// The session this mark belongs to.
    pub session_id: SessionId,
    /// The `ended_at` value that was uploaded.
    pub synced_ended_at: Timestamp,
    /// When the upload was confirmed.
    pub synced_at: Timestamp,
}

/// The full set of sync marks, keyed by session ID.
///
/// The ledger only grows, except for optional bounded-retention
/// trimming which evicts the oldest-confirmed marks and affects
/// memory, not correctness: a trimmed session at worst re-uploads
/// once, which the idempotent remote upsert absorbs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncLedger {
    marks: HashMap<SessionId, SyncMark>,
}

impl SyncLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `id` is confirmed synced at exactly `ended_at`.
    #[must_use]
    pub fn is_synced(&self, id: SessionId, ended_at: Timestamp) -> bool {
        self.marks
            .get(&id)
            .is_some_and(|mark| mark.synced_ended_at == ended_at)
    }

    /// Records a confirmed upload, replacing any previous mark for the
    /// session.
    pub fn mark_synced(&mut self, id: SessionId, ended_at: Timestamp, now: Timestamp) {
        self.marks.insert(
            id,
            SyncMark {
                session_id: id,
                synced_ended_at: ended_at,
                synced_at: now,
            },
        );
    }

    /// Returns the mark for a session, if one exists.
    #[must_use]
    pub fn mark(&self, id: SessionId) -> Option<&SyncMark> {
        self.marks.get(&id)
    }

    /// Returns the latest completion timestamp among all marks.
    ///
    /// Informational only: candidate filtering is per-session
    /// exact-match, never watermark-based, so out-of-order completions
    /// are tolerated.
    #[must_use]
    pub fn watermark(&self) -> Option<Timestamp> {
        self.marks.values().map(|m| m.synced_ended_at).max()
    }

    /// Returns the number of retained marks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.marks.len()
    }

    /// Returns true if the ledger holds no marks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    /// Evicts oldest-confirmed marks until at most `max_marks` remain.
    pub fn trim(&mut self, max_marks: usize) {
        while self.marks.len() > max_marks {
            let oldest = self
                .marks
                .values()
                .min_by_key(|m| m.synced_at)
                .map(|m| m.session_id);
            match oldest {
                Some(id) => {
                    self.marks.remove(&id);
                }
                None => break,
            }
        }
    }

    /// Encodes the ledger to its persisted JSON form.
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Decodes a ledger from its persisted JSON form.
    pub fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
