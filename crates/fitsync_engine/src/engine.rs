//! Sync orchestrator: drives upload cycles.

use crate::backoff::BackoffController;
use crate::config::SyncConfig;
use crate::error::SyncResult;
use crate::inflight::InFlightGuard;
use crate::ledger::{SyncLedger, LEDGER_KEY};
use crate::selector::select_candidates;
use crate::state_store::StateStore;
use crate::uploader::{SessionSummary, SessionUploader};
use fitsync_core::{SessionId, SessionStore, Timestamp};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// The orchestrator's top-level state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// No cycle in progress.
    Idle,
    /// A cycle is executing; further triggers are no-ops.
    Running,
}

/// Why a triggered cycle did or did not run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The cycle ran to completion.
    Completed(CycleReport),
    /// Another cycle was already in flight; this trigger was dropped.
    AlreadyRunning,
    /// The failure cooldown is still active; nothing was attempted.
    CoolingDown,
    /// The local session store could not be read; the cycle aborted
    /// before selecting candidates.
    StoreUnavailable,
}

/// Per-cycle accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CycleReport {
    /// Candidates selected for this cycle.
    pub candidates: usize,
    /// Uploads confirmed by the remote.
    pub uploaded: usize,
    /// Uploads the remote rejected or that never reached it.
    pub failed: usize,
    /// Candidates skipped because another attempt held their slot.
    pub skipped_in_flight: usize,
}

/// Cumulative engine statistics, for status display.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Cycles that ran to completion (including zero-candidate ones).
    pub cycles_completed: u64,
    /// Total sessions confirmed uploaded.
    pub sessions_uploaded: u64,
    /// Total failed upload attempts.
    pub uploads_failed: u64,
    /// When the last cycle trigger was processed.
    pub last_cycle_at: Option<Timestamp>,
    /// When the last fully clean cycle finished.
    pub last_success_at: Option<Timestamp>,
    /// The most recent error, cleared by a clean cycle.
    pub last_error: Option<String>,
}

/// Releases the Idle/Running gate on every exit path.
struct RunningGate<'a>(&'a AtomicBool);

impl Drop for RunningGate<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// The sync orchestrator.
///
/// Owns the sync ledger, the shared backoff window, and the in-flight
/// guard; external callers interact only through [`run_cycle`] and the
/// read-only status surface, so the engine's state is never mutated
/// from outside a cycle. At most one cycle executes at a time
/// process-wide; overlapping triggers are silent no-ops.
///
/// Within a cycle, candidates are uploaded sequentially, oldest
/// completion first. A failing candidate never aborts the cycle:
/// backoff escalates and the remaining candidates still get their
/// attempt, so one malformed session cannot block healthy ones.
///
/// [`run_cycle`]: SyncEngine::run_cycle
pub struct SyncEngine<S, U, K> {
    config: SyncConfig,
    store: Arc<S>,
    uploader: Arc<U>,
    state_store: Arc<K>,
    ledger: RwLock<SyncLedger>,
    backoff: BackoffController,
    inflight: InFlightGuard,
    stats: RwLock<SyncStats>,
    running: AtomicBool,
}

impl<S, U, K> SyncEngine<S, U, K>
where
    S: SessionStore,
    U: SessionUploader,
    K: StateStore,
{
    /// Creates an engine, loading the persisted ledger.
    ///
    /// A missing ledger means first run; an unreadable or corrupt one
    /// is logged and replaced with an empty ledger, costing at most
    /// redundant re-uploads that the idempotent remote upsert absorbs.
    pub fn new(config: SyncConfig, store: Arc<S>, uploader: Arc<U>, state_store: Arc<K>) -> Self {
        let ledger = match state_store.load(LEDGER_KEY) {
            Ok(Some(bytes)) => match SyncLedger::decode(&bytes) {
                Ok(ledger) => ledger,
                Err(e) => {
                    warn!(error = %e, "sync ledger corrupt, starting empty");
                    SyncLedger::new()
                }
            },
            Ok(None) => SyncLedger::new(),
            Err(e) => {
                warn!(error = %e, "sync ledger unreadable, starting empty");
                SyncLedger::new()
            }
        };

        Self {
            backoff: BackoffController::new(&config),
            inflight: InFlightGuard::new(&config),
            config,
            store,
            uploader,
            state_store,
            ledger: RwLock::new(ledger),
            stats: RwLock::new(SyncStats::default()),
            running: AtomicBool::new(false),
        }
    }

    /// Returns whether a cycle is currently executing.
    #[must_use]
    pub fn state(&self) -> EngineState {
        if self.running.load(Ordering::SeqCst) {
            EngineState::Running
        } else {
            EngineState::Idle
        }
    }

    /// Returns a snapshot of the cumulative statistics.
    #[must_use]
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }

    /// Returns the latest completion timestamp among synced sessions.
    ///
    /// Informational only; never used for candidate filtering.
    #[must_use]
    pub fn watermark(&self) -> Option<Timestamp> {
        self.ledger.read().watermark()
    }

    /// Returns true if `id` is confirmed synced at exactly `ended_at`.
    #[must_use]
    pub fn is_synced(&self, id: SessionId, ended_at: Timestamp) -> bool {
        self.ledger.read().is_synced(id, ended_at)
    }

    /// Returns the current backoff cooldown window in seconds.
    #[must_use]
    pub fn cooldown_secs(&self) -> i64 {
        self.backoff.cooldown_secs()
    }

    /// Triggers a sync cycle at the current wall-clock time.
    ///
    /// Safe to call from any thread and from racing triggers: if a
    /// cycle is already running or the failure cooldown is active this
    /// is a no-op. Never returns an error; failures feed backoff and
    /// the last-error observable instead.
    pub fn run_cycle(&self) -> CycleOutcome {
        self.run_cycle_at(Timestamp::now())
    }

    /// Triggers a sync cycle at an explicit time.
    ///
    /// The time source is injectable so cooldown and throttle behavior
    /// can be exercised deterministically.
    pub fn run_cycle_at(&self, now: Timestamp) -> CycleOutcome {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("sync cycle already running, trigger ignored");
            return CycleOutcome::AlreadyRunning;
        }
        let _gate = RunningGate(&self.running);

        let outcome = self.cycle(now);
        self.stats.write().last_cycle_at = Some(now);
        outcome
    }

    fn cycle(&self, now: Timestamp) -> CycleOutcome {
        if self.backoff.should_skip(now) {
            debug!(
                cooldown_secs = self.backoff.cooldown_secs(),
                "sync cycle skipped during cooldown"
            );
            return CycleOutcome::CoolingDown;
        }

        // The per-cycle bound is the candidate cap, not the fetch:
        // already-synced sessions must not crowd unsynced work out of
        // a bounded fetch window.
        let sessions = match self.store.list_ended_sessions(None, usize::MAX) {
            Ok(sessions) => sessions,
            Err(e) => {
                warn!(error = %e, "cannot read local sessions, aborting cycle");
                self.backoff.on_failure(now);
                self.stats.write().last_error = Some(e.to_string());
                return CycleOutcome::StoreUnavailable;
            }
        };

        let candidates = {
            let ledger = self.ledger.read();
            select_candidates(&sessions, &ledger, self.config.max_candidates_per_cycle)
        };

        let mut report = CycleReport {
            candidates: candidates.len(),
            ..CycleReport::default()
        };
        let mut persist_failed = false;
        let mut cycle_failed = false;

        for candidate in candidates {
            let id = candidate.session.id;
            let Some(_permit) = self.inflight.try_acquire(id, now) else {
                debug!(session = %id, "upload slot busy, deferring to next cycle");
                report.skipped_in_flight += 1;
                continue;
            };

            let summary = SessionSummary::from_session(&candidate.session, candidate.ended_at);
            match self.uploader.upsert_summary(&summary) {
                Ok(()) => {
                    if let Err(e) = self.commit_mark(id, candidate.ended_at, now) {
                        // The in-memory mark still holds for this
                        // process lifetime; a crash before the next
                        // successful save costs one redundant
                        // re-upload.
                        warn!(session = %id, error = %e, "sync ledger persist failed");
                        self.stats.write().last_error = Some(e.to_string());
                        persist_failed = true;
                    }
                    // A failure earlier in this cycle is evidence of a
                    // degraded remote even when later uploads squeak
                    // through; only failure-free successes clear the
                    // cooldown.
                    if !cycle_failed {
                        self.backoff.on_success();
                    }
                    report.uploaded += 1;
                }
                Err(e) => {
                    warn!(session = %id, error = %e, "session upload failed");
                    self.backoff.on_failure(now);
                    self.stats.write().last_error = Some(e.to_string());
                    report.failed += 1;
                    cycle_failed = true;
                }
            }
        }

        {
            let mut stats = self.stats.write();
            stats.cycles_completed += 1;
            stats.sessions_uploaded += report.uploaded as u64;
            stats.uploads_failed += report.failed as u64;
            if report.failed == 0 {
                stats.last_success_at = Some(now);
                if !persist_failed {
                    stats.last_error = None;
                }
            }
        }

        debug!(
            candidates = report.candidates,
            uploaded = report.uploaded,
            failed = report.failed,
            skipped = report.skipped_in_flight,
            "sync cycle finished"
        );
        CycleOutcome::Completed(report)
    }

    /// Records a confirmed upload in the ledger and persists it.
    fn commit_mark(&self, id: SessionId, ended_at: Timestamp, now: Timestamp) -> SyncResult<()> {
        let bytes = {
            let mut ledger = self.ledger.write();
            ledger.mark_synced(id, ended_at, now);
            if let Some(cap) = self.config.max_ledger_marks {
                ledger.trim(cap);
            }
            ledger.encode()?
        };
        self.state_store.save(LEDGER_KEY, &bytes)
    }
}
