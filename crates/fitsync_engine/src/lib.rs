//! # Fitsync Engine
//!
//! Incremental cloud synchronization for locally recorded workout
//! sessions.
//!
//! This crate provides:
//! - The sync orchestrator (Idle/Running cycle gate, oldest-first
//!   upload ordering)
//! - A content-addressed sync ledger with durable persistence
//! - Shared failure backoff with escalating cooldown
//! - A per-session in-flight guard against duplicate uploads
//! - The uploader trait boundary plus a scriptable test double
//!
//! ## Architecture
//!
//! Each cycle reads completed sessions from the local store, filters
//! out ones whose current `ended_at` already has a matching sync mark,
//! and uploads the remainder oldest first through an idempotent remote
//! upsert. Confirmed uploads are recorded in the ledger and persisted;
//! failures escalate a single shared cooldown that short-circuits
//! subsequent cycles.
//!
//! ## Key Invariants
//!
//! - At most one cycle runs at a time process-wide
//! - A session counts as synced only if its mark matches its current
//!   `ended_at`; correcting the completion time re-queues it
//! - A failing upload never aborts the cycle, only escalates backoff
//! - No engine error is fatal: everything folds into backoff state and
//!   the last-error observable

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backoff;
mod config;
mod engine;
mod error;
mod inflight;
mod ledger;
mod selector;
mod state_store;
mod uploader;

pub use backoff::BackoffController;
pub use config::SyncConfig;
pub use engine::{CycleOutcome, CycleReport, EngineState, SyncEngine, SyncStats};
pub use error::{SyncError, SyncResult, UploadError};
pub use inflight::{InFlightGuard, InFlightPermit};
pub use ledger::{SyncLedger, SyncMark, LEDGER_KEY};
pub use selector::{select_candidates, Candidate};
pub use state_store::{FileStateStore, MemoryStateStore, StateStore};
pub use uploader::{MockUploader, SessionSummary, SessionUploader};
