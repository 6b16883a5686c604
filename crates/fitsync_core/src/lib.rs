//! # Fitsync Core
//!
//! Domain model and local-store interface for the fitsync workout
//! tracker.
//!
//! This crate provides:
//! - `Timestamp` and `SessionId` identifier types
//! - `WorkoutSession` records as produced by the on-device tracker
//! - The `SessionStore` trait through which the sync engine reads
//!   completed sessions
//! - An in-memory store implementation for tests and embedders
//!
//! ## Key Invariants
//!
//! - A session is complete only once `ended_at` is set and it has at
//!   least one recorded set
//! - Session IDs are stable for the lifetime of a record
//! - `list_ended_sessions` returns sessions ordered by `ended_at`
//!   ascending

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod session;
mod store;
mod time;

pub use error::{CoreError, CoreResult};
pub use session::{SessionId, WorkoutSession};
pub use store::{MemorySessionStore, SessionStore};
pub use time::Timestamp;
