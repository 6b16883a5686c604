//! End-to-end scenarios for the sync engine.

use fitsync_core::{MemorySessionStore, SessionId, Timestamp, WorkoutSession};
use fitsync_engine::{
    CycleOutcome, CycleReport, EngineState, FileStateStore, InFlightGuard, MemoryStateStore,
    MockUploader, StateStore, SyncConfig, SyncEngine, UploadError, LEDGER_KEY,
};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn ended_session(title: &str, ended_secs: i64) -> WorkoutSession {
    WorkoutSession {
        id: SessionId::new(),
        title: title.into(),
        started_at: Timestamp::from_secs(ended_secs - 3600),
        ended_at: Some(Timestamp::from_secs(ended_secs)),
        total_sets: 10,
        total_reps: 80,
        volume: 1800.0,
    }
}

fn report(outcome: CycleOutcome) -> CycleReport {
    match outcome {
        CycleOutcome::Completed(report) => report,
        other => panic!("expected completed cycle, got {other:?}"),
    }
}

#[test]
fn three_sessions_sync_oldest_first() {
    let store = Arc::new(MemorySessionStore::new());
    let uploader = Arc::new(MockUploader::new());
    let state_store = Arc::new(MemoryStateStore::new());

    let a = ended_session("a", 1000);
    let b = ended_session("b", 2000);
    let c = ended_session("c", 3000);
    // Inserted out of order; upload order must follow ended_at.
    store.upsert(c.clone());
    store.upsert(a.clone());
    store.upsert(b.clone());

    let engine = SyncEngine::new(
        SyncConfig::new(),
        Arc::clone(&store),
        Arc::clone(&uploader),
        state_store,
    );

    let r = report(engine.run_cycle_at(Timestamp::from_secs(4000)));
    assert_eq!(r.candidates, 3);
    assert_eq!(r.uploaded, 3);
    assert_eq!(r.failed, 0);

    let calls = uploader.calls();
    let titles: Vec<&str> = calls.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, ["a", "b", "c"]);

    for session in [&a, &b, &c] {
        assert!(engine.is_synced(session.id, session.ended_at.unwrap()));
    }
    assert_eq!(engine.watermark(), Some(Timestamp::from_secs(3000)));
    assert_eq!(engine.cooldown_secs(), 0);
}

#[test]
fn partial_failure_then_cooldown_exclusion() {
    let store = Arc::new(MemorySessionStore::new());
    let uploader = Arc::new(MockUploader::new());
    let state_store = Arc::new(MemoryStateStore::new());

    let a = ended_session("a", 1000);
    let b = ended_session("b", 2000);
    let c = ended_session("c", 3000);
    for s in [&a, &b, &c] {
        store.upsert(s.clone());
    }

    // Second upload (b) fails; a and c succeed.
    uploader.push_result(Ok(()));
    uploader.push_result(Err(UploadError::Network("reset by peer".into())));
    uploader.push_result(Ok(()));

    let engine = SyncEngine::new(
        SyncConfig::new(),
        Arc::clone(&store),
        Arc::clone(&uploader),
        state_store,
    );

    let t0 = Timestamp::from_secs(4000);
    let r = report(engine.run_cycle_at(t0));
    assert_eq!(r.uploaded, 2);
    assert_eq!(r.failed, 1);

    // Marks for a and c only; the failing b stays a candidate.
    assert!(engine.is_synced(a.id, a.ended_at.unwrap()));
    assert!(engine.is_synced(c.id, c.ended_at.unwrap()));
    assert!(!engine.is_synced(b.id, b.ended_at.unwrap()));

    // b's mid-cycle failure leaves the cooldown armed even though c
    // succeeded afterwards.
    assert!(engine.cooldown_secs() > 0);

    // Inside the window the next trigger is a no-op and does not
    // reset backoff.
    let before = engine.cooldown_secs();
    assert_eq!(
        engine.run_cycle_at(t0.plus_secs(5)),
        CycleOutcome::CoolingDown
    );
    assert_eq!(uploader.call_count(), 3);
    assert_eq!(engine.cooldown_secs(), before);
    assert_eq!(engine.stats().sessions_uploaded, 2);
    assert!(engine.stats().last_success_at.is_none());
}

#[test]
fn backoff_escalates_across_failing_cycles() {
    let store = Arc::new(MemorySessionStore::new());
    let uploader = Arc::new(MockUploader::new());
    let state_store = Arc::new(MemoryStateStore::new());

    store.upsert(ended_session("stubborn", 1000));

    let engine = SyncEngine::new(
        SyncConfig::new(),
        Arc::clone(&store),
        Arc::clone(&uploader),
        state_store,
    );

    let mut now = Timestamp::from_secs(5000);
    for expected in [30, 60, 120, 240, 300, 300] {
        uploader.push_result(Err(UploadError::Network("still down".into())));
        let r = report(engine.run_cycle_at(now));
        assert_eq!(r.failed, 1);
        assert_eq!(engine.cooldown_secs(), expected);

        // Let the cooldown elapse before the next cycle.
        now = now.plus_secs(expected + 1);
    }
}

#[test]
fn reentrant_trigger_is_a_no_op() {
    let store = Arc::new(MemorySessionStore::new());
    let uploader = Arc::new(MockUploader::new());
    let state_store = Arc::new(MemoryStateStore::new());

    store.upsert(ended_session("a", 1000));
    uploader.hold();

    let engine = Arc::new(SyncEngine::new(
        SyncConfig::new(),
        Arc::clone(&store),
        Arc::clone(&uploader),
        state_store,
    ));

    let worker = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || engine.run_cycle_at(Timestamp::from_secs(2000)))
    };

    // Wait until the first cycle is parked inside the uploader.
    while uploader.call_count() == 0 {
        thread::sleep(Duration::from_millis(1));
    }
    assert_eq!(engine.state(), EngineState::Running);

    // A second trigger while the first is in flight is refused.
    assert_eq!(
        engine.run_cycle_at(Timestamp::from_secs(2001)),
        CycleOutcome::AlreadyRunning
    );

    uploader.release();
    let r = report(worker.join().unwrap());
    assert_eq!(r.uploaded, 1);
    assert_eq!(uploader.call_count(), 1);
    assert_eq!(engine.state(), EngineState::Idle);
}

#[test]
fn dedup_guard_serializes_simultaneous_claims() {
    let guard = Arc::new(InFlightGuard::new(&SyncConfig::new()));
    let id = SessionId::new();
    let now = Timestamp::from_secs(100);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let guard = Arc::clone(&guard);
            thread::spawn(move || guard.try_acquire(id, now).is_some())
        })
        .collect();

    let acquired = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|&won| won)
        .count();

    // Exactly one claim wins: losers see either a busy slot or the
    // winner's attempt timestamp inside the throttle window.
    assert_eq!(acquired, 1);
}

#[test]
fn ledger_survives_engine_restart() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemorySessionStore::new());
    let uploader = Arc::new(MockUploader::new());

    let session = ended_session("persisted", 1000);
    store.upsert(session.clone());

    {
        let state_store = Arc::new(FileStateStore::open(dir.path()).unwrap());
        let engine = SyncEngine::new(
            SyncConfig::new(),
            Arc::clone(&store),
            Arc::clone(&uploader),
            Arc::clone(&state_store),
        );
        report(engine.run_cycle_at(Timestamp::from_secs(2000)));
        assert_eq!(uploader.call_count(), 1);
        assert!(state_store.load(LEDGER_KEY).unwrap().is_some());
    }

    // A fresh engine over the same directory sees the mark and
    // performs zero uploads.
    let state_store = Arc::new(FileStateStore::open(dir.path()).unwrap());
    let engine = SyncEngine::new(
        SyncConfig::new(),
        Arc::clone(&store),
        Arc::clone(&uploader),
        state_store,
    );
    assert!(engine.is_synced(session.id, session.ended_at.unwrap()));

    let r = report(engine.run_cycle_at(Timestamp::from_secs(3000)));
    assert_eq!(r.candidates, 0);
    assert_eq!(uploader.call_count(), 1);
}
