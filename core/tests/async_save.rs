//! Non-blocking saves: at most one in flight, and a guaranteed
//! minimum time on screen for the "saving" indicator.
//!
//! Timing tests run on a paused tokio clock, so the hold is exact and
//! the suite does not actually sleep.

use savegame_core::{
    file_store::SlotStore, rng::sample_snapshot, SaveCoordinator, SaveMode, SharedFeedback,
    StoreConfig, StoreError, StoreResult,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

const HOLD: Duration = Duration::from_millis(2_000);

/// In-memory store that counts every call. Writes are instant.
#[derive(Default)]
struct MemoryStore {
    bytes:      Mutex<Option<Vec<u8>>>,
    calls:      AtomicUsize,
    fail_write: bool,
}

impl MemoryStore {
    fn failing() -> Self {
        Self { fail_write: true, ..Self::default() }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl SlotStore for MemoryStore {
    fn path(&self) -> &Path {
        Path::new("memory://save.dat")
    }

    fn exists(&self) -> bool {
        self.touch();
        self.bytes.lock().unwrap().is_some()
    }

    fn is_empty(&self) -> bool {
        self.touch();
        self.bytes.lock().unwrap().as_ref().map_or(true, |b| b.is_empty())
    }

    fn read_all(&self) -> StoreResult<Vec<u8>> {
        self.touch();
        self.bytes
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| StoreError::NotFound(PathBuf::from("memory://save.dat")))
    }

    fn write_all(&self, bytes: &[u8]) -> StoreResult<()> {
        self.touch();
        if self.fail_write {
            return Err(StoreError::io(
                "memory://save.dat",
                std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            ));
        }
        *self.bytes.lock().unwrap() = Some(bytes.to_vec());
        Ok(())
    }

    fn delete(&self) -> StoreResult<()> {
        self.touch();
        *self.bytes.lock().unwrap() = None;
        Ok(())
    }

    fn delete_sidecar(&self) -> StoreResult<()> {
        self.touch();
        Ok(())
    }
}

fn config(allow: bool) -> StoreConfig {
    StoreConfig {
        allow_save_load: allow,
        feedback_hold_ms: HOLD.as_millis() as u64,
        ..StoreConfig::in_dir("/unused")
    }
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn build(store: Arc<MemoryStore>, feedback: SharedFeedback) -> SaveCoordinator {
    init_logging();
    SaveCoordinator::with_store(store, &config(true), Arc::new(feedback))
}

#[tokio::test(start_paused = true)]
async fn async_save_returns_before_the_write() {
    let store = Arc::new(MemoryStore::default());
    let coordinator = build(store.clone(), SharedFeedback::new());
    let calls_before = store.calls();

    assert!(coordinator.save(sample_snapshot(1), SaveMode::Async));
    assert!(coordinator.is_save_in_progress());
    assert_eq!(store.calls(), calls_before, "write must wait for the first yield");

    assert_eq!(coordinator.wait_for_save().await, Some(true));
    assert!(store.bytes.lock().unwrap().is_some());
}

#[tokio::test(start_paused = true)]
async fn fast_write_still_holds_progress_for_minimum() {
    let store = Arc::new(MemoryStore::default());
    let coordinator = build(store, SharedFeedback::new());
    let started = Instant::now();

    assert!(coordinator.save(sample_snapshot(2), SaveMode::Async));

    tokio::time::sleep(HOLD - Duration::from_millis(1)).await;
    assert!(coordinator.is_save_in_progress(), "cleared before the minimum hold");

    assert_eq!(coordinator.wait_for_save().await, Some(true));
    assert!(!coordinator.is_save_in_progress());
    assert!(started.elapsed() >= HOLD);
}

#[tokio::test(start_paused = true)]
async fn second_async_save_is_rejected_while_first_is_pending() {
    let store = Arc::new(MemoryStore::default());
    let coordinator = build(store, SharedFeedback::new());
    let first = sample_snapshot(10);
    let second = sample_snapshot(11);

    assert!(coordinator.save(first.clone(), SaveMode::Async));
    assert!(!coordinator.save(second, SaveMode::Async));
    assert_eq!(coordinator.last_saved(), Some(first.clone()));

    assert_eq!(coordinator.wait_for_save().await, Some(true));
    assert_eq!(coordinator.last_saved(), Some(first));
}

#[tokio::test(start_paused = true)]
async fn sync_save_is_rejected_while_async_is_pending() {
    let store = Arc::new(MemoryStore::default());
    let coordinator = build(store, SharedFeedback::new());
    let first = sample_snapshot(20);

    assert!(coordinator.save(first.clone(), SaveMode::Async));
    assert!(matches!(
        coordinator.try_save(sample_snapshot(21), SaveMode::Sync),
        Err(StoreError::SaveInProgress)
    ));
    assert_eq!(coordinator.last_saved(), Some(first));

    coordinator.wait_for_save().await;
    assert!(coordinator.save(sample_snapshot(22), SaveMode::Sync));
}

#[tokio::test(start_paused = true)]
async fn new_save_is_accepted_after_the_hold() {
    let store = Arc::new(MemoryStore::default());
    let coordinator = build(store, SharedFeedback::new());

    assert!(coordinator.save(sample_snapshot(30), SaveMode::Async));
    coordinator.wait_for_save().await;
    assert!(coordinator.save(sample_snapshot(31), SaveMode::Async));
    assert_eq!(coordinator.wait_for_save().await, Some(true));

    assert!(coordinator.load());
    assert_eq!(coordinator.loaded(), Some(sample_snapshot(31)));
}

#[tokio::test(start_paused = true)]
async fn feedback_text_tracks_the_save() {
    let store = Arc::new(MemoryStore::default());
    let feedback = SharedFeedback::new();
    let coordinator = build(store, feedback.clone());
    assert!(!feedback.is_showing());

    coordinator.set_feedback_string("Sauvegarde");
    assert!(coordinator.save(sample_snapshot(40), SaveMode::Async));
    assert_eq!(feedback.text(), "Sauvegarde");
    assert_eq!(coordinator.feedback_text(), "Sauvegarde");

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(feedback.is_showing());

    coordinator.wait_for_save().await;
    assert_eq!(feedback.text(), "");
    assert_eq!(coordinator.feedback_text(), "");

    coordinator.refresh_feedback_string();
    assert!(coordinator.save(sample_snapshot(41), SaveMode::Async));
    assert_eq!(feedback.text(), "Saving Data");
    coordinator.wait_for_save().await;
}

#[tokio::test(start_paused = true)]
async fn sync_save_clears_feedback_immediately() {
    let store = Arc::new(MemoryStore::default());
    let feedback = SharedFeedback::new();
    let coordinator = build(store, feedback.clone());

    assert!(coordinator.save(sample_snapshot(50), SaveMode::Sync));
    assert!(!coordinator.is_save_in_progress());
    assert!(!feedback.is_showing());
}

#[tokio::test(start_paused = true)]
async fn failed_async_write_reports_and_goes_idle() {
    let store = Arc::new(MemoryStore::failing());
    let coordinator = build(store, SharedFeedback::new());
    let started = Instant::now();

    assert!(coordinator.save(sample_snapshot(60), SaveMode::Async), "acceptance is not completion");
    assert_eq!(coordinator.wait_for_save().await, Some(false));
    assert!(!coordinator.is_save_in_progress());
    assert!(started.elapsed() < HOLD, "a failed write skips the feedback hold");
}

#[tokio::test]
async fn kill_switch_does_no_store_access() {
    let store = Arc::new(MemoryStore::default());
    let coordinator =
        SaveCoordinator::with_store(store.clone(), &config(false), Arc::new(SharedFeedback::new()));

    assert!(!coordinator.save(sample_snapshot(70), SaveMode::Async));
    assert!(!coordinator.save(sample_snapshot(71), SaveMode::Sync));
    assert!(!coordinator.load());
    assert_eq!(store.calls(), 0);
    assert!(coordinator.last_saved().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn clones_share_one_slot_across_threads() {
    let store = Arc::new(MemoryStore::default());
    let coordinator = SaveCoordinator::with_store(
        store,
        &StoreConfig { feedback_hold_ms: 20, ..config(true) },
        Arc::new(SharedFeedback::new()),
    );

    let racers: Vec<_> = (0..8)
        .map(|i| {
            let handle = coordinator.clone();
            tokio::spawn(async move { handle.save(sample_snapshot(100 + i), SaveMode::Async) })
        })
        .collect();
    let mut wins = 0;
    for racer in racers {
        if racer.await.expect("join") {
            wins += 1;
        }
    }
    assert!(wins >= 1);

    // Every accepted save finishes and releases the slot.
    while coordinator.is_save_in_progress() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(coordinator.last_saved().is_some());
}

fn current_thread_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("build runtime")
}

#[test]
fn runtime_shutdown_before_the_write_releases_the_slot() {
    let store = Arc::new(MemoryStore::default());
    let coordinator = build(store.clone(), SharedFeedback::new());

    let rt = current_thread_runtime();
    let accepted = rt.block_on(async { coordinator.save(sample_snapshot(80), SaveMode::Async) });
    assert!(accepted);
    assert!(coordinator.is_save_in_progress());

    // The task never got polled; tearing the runtime down drops it.
    drop(rt);
    assert!(!coordinator.is_save_in_progress(), "slot stuck busy after the task was dropped");
    assert!(store.bytes.lock().unwrap().is_none());
    assert_eq!(coordinator.feedback_text(), "");

    assert!(coordinator.save(sample_snapshot(81), SaveMode::Sync));
    assert!(coordinator.load());
    assert_eq!(coordinator.loaded(), Some(sample_snapshot(81)));
}

#[test]
fn runtime_shutdown_during_the_hold_keeps_the_write() {
    let store = Arc::new(MemoryStore::default());
    let feedback = SharedFeedback::new();
    let coordinator = build(store.clone(), feedback.clone());

    let rt = current_thread_runtime();
    rt.block_on(async {
        assert!(coordinator.save(sample_snapshot(82), SaveMode::Async));
        // Long enough for the task to write and enter its hold.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(coordinator.is_save_in_progress());
    });
    drop(rt);

    assert!(!coordinator.is_save_in_progress());
    assert!(!feedback.is_showing());
    assert!(coordinator.load());
    assert_eq!(coordinator.loaded(), Some(sample_snapshot(82)));
}
