//! Candidate selection for a sync cycle.

use crate::ledger::SyncLedger;
use fitsync_core::{Timestamp, WorkoutSession};

/// A session eligible for upload this cycle.
///
/// Carries the completion timestamp alongside the record so callers
/// never have to re-unwrap `ended_at`.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// The session to upload.
    pub session: WorkoutSession,
    /// Its current completion timestamp.
    pub ended_at: Timestamp,
}

/// Selects the sessions to upload this cycle.
///
/// Pure filter over the given records: completed, non-empty, and not
/// already confirmed synced at their current `ended_at`. Output is
/// ordered oldest completion first so a partial-failure cycle makes
/// maximum progress on the longest-outstanding backlog, then truncated
/// to `max` to cap per-cycle cost; sessions past the cap stay pending
/// for later cycles.
#[must_use]
pub fn select_candidates(
    sessions: &[WorkoutSession],
    ledger: &SyncLedger,
    max: usize,
) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = sessions
        .iter()
        .filter(|s| s.total_sets > 0)
        .filter_map(|s| {
            let ended_at = s.ended_at?;
            if ledger.is_synced(s.id, ended_at) {
                None
            } else {
                Some(Candidate {
                    session: s.clone(),
                    ended_at,
                })
            }
        })
        .collect();

    candidates.sort_by_key(|c| c.ended_at);
    candidates.truncate(max);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitsync_core::SessionId;

    fn session(ended_secs: Option<i64>, total_sets: u32) -> WorkoutSession {
        WorkoutSession {
            id: SessionId::new(),
            title: "Legs".into(),
            started_at: Timestamp::from_secs(0),
            ended_at: ended_secs.map(Timestamp::from_secs),
            total_sets,
            total_reps: total_sets * 5,
            volume: 900.0,
        }
    }

    #[test]
    fn filters_incomplete_and_empty() {
        let sessions = vec![
            session(Some(100), 10),
            session(None, 10),
            session(Some(200), 0),
        ];
        let ledger = SyncLedger::new();

        let candidates = select_candidates(&sessions, &ledger, 100);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].ended_at, Timestamp::from_secs(100));
    }

    #[test]
    fn filters_already_synced() {
        let sessions = vec![session(Some(100), 10), session(Some(200), 10)];
        let mut ledger = SyncLedger::new();
        ledger.mark_synced(
            sessions[0].id,
            Timestamp::from_secs(100),
            Timestamp::from_secs(110),
        );

        let candidates = select_candidates(&sessions, &ledger, 100);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].session.id, sessions[1].id);
    }

    #[test]
    fn corrected_session_reselected() {
        let mut corrected = session(Some(100), 10);
        let mut ledger = SyncLedger::new();
        ledger.mark_synced(
            corrected.id,
            Timestamp::from_secs(100),
            Timestamp::from_secs(110),
        );

        // The old mark no longer matches after the correction.
        corrected.ended_at = Some(Timestamp::from_secs(150));
        let candidates = select_candidates(std::slice::from_ref(&corrected), &ledger, 100);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].ended_at, Timestamp::from_secs(150));
    }

    #[test]
    fn oldest_first_and_capped() {
        let sessions = vec![
            session(Some(300), 10),
            session(Some(100), 10),
            session(Some(200), 10),
        ];
        let ledger = SyncLedger::new();

        let candidates = select_candidates(&sessions, &ledger, 2);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].ended_at, Timestamp::from_secs(100));
        assert_eq!(candidates[1].ended_at, Timestamp::from_secs(200));
    }
}
