//! The save coordinator: owner of the single save slot.
//!
//! STATE MACHINE (one save at a time):
//!   IDLE --save(Sync)--> WRITING --done--> IDLE
//!   IDLE --save(Async)--> WRITING --yield, write--> FEEDBACK_HOLD --hold elapsed--> IDLE
//!   WRITING --I/O failure--> IDLE
//!
//! RULES:
//!   - At most one save is in flight. A second request (sync or async)
//!     while one is pending is rejected, never queued.
//!   - All slot state sits behind one mutex. It is taken per transition
//!     and never held across an await.
//!   - An accepted async save always returns the slot to IDLE, even when
//!     its task is dropped with the runtime before it runs.
//!   - Failures are logged and reported as `false`; in-memory state that
//!     was valid before a failed load is never replaced.

use crate::{
    codec,
    config::StoreConfig,
    error::{DecodeError, EncodeError, StoreError, StoreResult},
    feedback::{FeedbackChannel, NullFeedback},
    file_store::{RawFileStore, SlotStore},
    snapshot::Snapshot,
    types::SaveMode,
};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;

/// The simulation side of a save: produces the snapshot to persist.
pub trait SnapshotSource {
    fn generate_save_data(&self) -> Snapshot;
}

struct SlotState {
    allow_save_load:  bool,
    save_in_progress: bool,
    last_saved:       Option<Snapshot>,
    loaded:           Option<Snapshot>,
    feedback_string:  String,
    /// Bumped by every accepted save.
    generation:       u64,
    /// The most recent async save task. Resolves to whether its write succeeded.
    pending:          Option<JoinHandle<bool>>,
}

struct Inner {
    store:            Arc<dyn SlotStore>,
    feedback:         Arc<dyn FeedbackChannel>,
    default_feedback: String,
    feedback_hold:    Duration,
    initialized:      bool,
    state:            Mutex<SlotState>,
}

/// Handle to the save slot. Cheap to clone; clones share one slot.
#[derive(Clone)]
pub struct SaveCoordinator {
    inner: Arc<Inner>,
}

impl SaveCoordinator {
    /// Build a coordinator over the config's save file with no UI attached.
    pub fn new(config: &StoreConfig) -> Self {
        Self::with_feedback(config, Arc::new(NullFeedback))
    }

    pub fn with_feedback(config: &StoreConfig, feedback: Arc<dyn FeedbackChannel>) -> Self {
        let store = Arc::new(RawFileStore::new(config.save_path.clone()));
        Self::with_store(store, config, feedback)
    }

    /// Validate the config, then build.
    pub fn from_config(
        config: &StoreConfig,
        feedback: Arc<dyn FeedbackChannel>,
    ) -> StoreResult<Self> {
        config
            .validate()
            .map_err(|e| StoreError::Config(e.to_string()))?;
        Ok(Self::with_feedback(config, feedback))
    }

    /// Build over an arbitrary store. The save path in `config` is ignored.
    ///
    /// On startup an existing zero-length save file is deleted: it is the
    /// leftover of an interrupted write and never loadable. Skipped while
    /// save/load is disabled.
    pub fn with_store(
        store: Arc<dyn SlotStore>,
        config: &StoreConfig,
        feedback: Arc<dyn FeedbackChannel>,
    ) -> Self {
        if config.allow_save_load {
            sweep_empty_file(store.as_ref());
        }
        let state = SlotState {
            allow_save_load:  config.allow_save_load,
            save_in_progress: false,
            last_saved:       None,
            loaded:           None,
            feedback_string:  config.feedback_text.clone(),
            generation:       0,
            pending:          None,
        };
        Self {
            inner: Arc::new(Inner {
                store,
                feedback,
                default_feedback: config.feedback_text.clone(),
                feedback_hold:    config.feedback_hold(),
                initialized:      true,
                state:            Mutex::new(state),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, SlotState> {
        // Slot state stays consistent per transition, so a poisoned lock is still usable.
        self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ── Probes ─────────────────────────────────────────────────

    pub fn is_initialized(&self) -> bool {
        self.inner.initialized
    }

    pub fn path(&self) -> &Path {
        self.inner.store.path()
    }

    pub fn is_save_in_progress(&self) -> bool {
        self.state().save_in_progress
    }

    pub fn allow_save_load(&self) -> bool {
        self.state().allow_save_load
    }

    pub fn set_allow_save_load(&self, allow: bool) {
        self.state().allow_save_load = allow;
        log::info!("save/load {}", if allow { "enabled" } else { "disabled" });
    }

    pub fn feedback_hold(&self) -> Duration {
        self.inner.feedback_hold
    }

    pub fn last_saved(&self) -> Option<Snapshot> {
        self.state().last_saved.clone()
    }

    pub fn loaded(&self) -> Option<Snapshot> {
        self.state().loaded.clone()
    }

    /// True only for loaded data that came from a completed save.
    pub fn has_loaded_data(&self) -> bool {
        self.state().loaded.as_ref().is_some_and(|s| s.valid)
    }

    // ── Saving ─────────────────────────────────────────────────

    /// Persist `snapshot`. Returns false on any failure (logged).
    ///
    /// Sync: returns once the file is written.
    /// Async: returns true as soon as the save is accepted; the write and
    /// the feedback hold run on a spawned task. Requires a tokio runtime.
    pub fn save(&self, snapshot: Snapshot, mode: SaveMode) -> bool {
        match self.try_save(snapshot, mode) {
            Ok(())  => true,
            Err(e) => {
                report_failure("save", &e);
                false
            }
        }
    }

    /// Ask `source` for its current state and save it.
    pub fn save_from(&self, source: &dyn SnapshotSource, mode: SaveMode) -> bool {
        self.save(source.generate_save_data(), mode)
    }

    pub fn try_save(&self, snapshot: Snapshot, mode: SaveMode) -> StoreResult<()> {
        match mode {
            SaveMode::Sync  => self.save_sync(snapshot),
            SaveMode::Async => self.save_async(snapshot),
        }
    }

    fn save_sync(&self, snapshot: Snapshot) -> StoreResult<()> {
        self.begin_save(&snapshot)?;
        self.refresh_feedback_text();

        let result = encode_payload(&snapshot)
            .and_then(|bytes| self.inner.store.write_all(&bytes));

        self.finish_save();
        if result.is_ok() {
            log::info!("saved game to {}", self.path().display());
        }
        result
    }

    fn save_async(&self, snapshot: Snapshot) -> StoreResult<()> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| StoreError::NoRuntime)?;

        let generation = self.begin_save(&snapshot)?;
        self.refresh_feedback_text();

        let bytes = match encode_payload(&snapshot) {
            Ok(bytes) => bytes,
            Err(e) => {
                self.finish_save();
                return Err(e);
            }
        };

        // Built before the spawn: if the runtime drops the task unpolled, the
        // guard still returns the slot to IDLE.
        let guard = InFlightSave::new(self.clone());
        let task = runtime.spawn(run_async_write(guard, bytes));

        let mut state = self.state();
        if state.generation == generation {
            state.pending = Some(task);
        }
        log::debug!("async save accepted for {}", self.path().display());
        Ok(())
    }

    /// IDLE -> WRITING. Records the payload as the last save and returns
    /// the save's generation.
    fn begin_save(&self, snapshot: &Snapshot) -> StoreResult<u64> {
        let mut state = self.state();
        if !state.allow_save_load {
            return Err(StoreError::SaveDisabled);
        }
        if state.save_in_progress {
            return Err(StoreError::SaveInProgress);
        }
        state.save_in_progress = true;
        state.last_saved = Some(snapshot.clone());
        state.generation += 1;
        Ok(state.generation)
    }

    /// WRITING / FEEDBACK_HOLD -> IDLE.
    fn finish_save(&self) {
        self.state().save_in_progress = false;
        self.refresh_feedback_text();
    }

    /// Wait for the most recent async save to finish.
    /// Returns whether its write succeeded, or None if there was none.
    pub async fn wait_for_save(&self) -> Option<bool> {
        let pending = self.state().pending.take()?;
        match pending.await {
            Ok(written) => Some(written),
            Err(e) => {
                log::error!("async save task failed: {e}");
                Some(false)
            }
        }
    }

    // ── Loading ────────────────────────────────────────────────

    /// Load the save file into the slot. Returns false on any failure (logged).
    pub fn load(&self) -> bool {
        match self.try_load() {
            Ok(())  => true,
            Err(e) => {
                report_failure("load", &e);
                false
            }
        }
    }

    pub fn try_load(&self) -> StoreResult<()> {
        if !self.allow_save_load() {
            return Err(StoreError::SaveDisabled);
        }
        let store = self.inner.store.as_ref();
        if !store.exists() {
            return Err(StoreError::NotFound(store.path().to_path_buf()));
        }

        let bytes = store.read_all()?;
        if bytes.is_empty() {
            log::warn!("save file {} is empty; deleting it", store.path().display());
            if let Err(e) = store.delete() {
                log::error!("could not delete empty save file: {e}");
            }
            return Err(DecodeError::Empty.into());
        }

        let snapshot = codec::decode(&bytes)?;
        log::info!(
            "loaded save from {} (score={}, area={})",
            store.path().display(),
            snapshot.score,
            snapshot.current_area_index
        );
        self.state().loaded = Some(snapshot);
        Ok(())
    }

    // ── Slot management ────────────────────────────────────────

    /// Continue straight after saving, without a round trip through disk.
    pub fn promote_last_save_to_loaded(&self) {
        let mut state = self.state();
        state.loaded = state.last_saved.clone();
    }

    pub fn clear_loaded(&self) {
        self.state().loaded = None;
    }

    /// Drop both snapshots; with `delete_file`, also remove the save file and
    /// its `.meta` sidecar. A missing file is not an error.
    ///
    /// The file is left alone while save/load is disabled or a save is
    /// still in flight (the pending write would recreate it). Returns false
    /// if the file should have been deleted but was not.
    pub fn clear_all(&self, delete_file: bool) -> bool {
        let (allowed, busy) = {
            let mut state = self.state();
            state.last_saved = None;
            state.loaded = None;
            (state.allow_save_load, state.save_in_progress)
        };
        if !delete_file {
            return true;
        }
        if !allowed {
            report_failure("clear", &StoreError::SaveDisabled);
            return false;
        }
        if busy {
            report_failure("clear", &StoreError::SaveInProgress);
            return false;
        }

        let store = self.inner.store.as_ref();
        match store.delete().and_then(|()| store.delete_sidecar()) {
            Ok(()) => {
                log::info!("cleared save file {}", store.path().display());
                true
            }
            Err(e) => {
                report_failure("clear", &e);
                false
            }
        }
    }

    // ── Feedback ───────────────────────────────────────────────

    /// Override the progress text (e.g. after a language change).
    pub fn set_feedback_string(&self, text: impl Into<String>) {
        self.state().feedback_string = text.into();
    }

    /// Reset the progress text to the configured default.
    pub fn refresh_feedback_string(&self) {
        self.state().feedback_string = self.inner.default_feedback.clone();
    }

    /// What the indicator should show right now.
    pub fn feedback_text(&self) -> String {
        let state = self.state();
        if state.save_in_progress {
            state.feedback_string.clone()
        } else {
            String::new()
        }
    }

    /// Push the current indicator text to the feedback channel.
    pub fn refresh_feedback_text(&self) {
        let text = self.feedback_text();
        self.inner.feedback.set_text(&text);
    }
}

impl std::fmt::Debug for SaveCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("SaveCoordinator")
            .field("path", &self.path())
            .field("allow_save_load", &state.allow_save_load)
            .field("save_in_progress", &state.save_in_progress)
            .field("has_last_saved", &state.last_saved.is_some())
            .field("has_loaded", &state.loaded.is_some())
            .finish()
    }
}

/// Body of an accepted async save: yield, write, hold, release.
async fn run_async_write(mut guard: InFlightSave, bytes: Vec<u8>) -> bool {
    // Let the caller's frame finish before touching the disk.
    tokio::task::yield_now().await;
    let coordinator = guard.coordinator.clone();
    coordinator.refresh_feedback_text();

    let written = match coordinator.inner.store.write_all(&bytes) {
        Ok(()) => true,
        Err(e) => {
            report_failure("async save", &e);
            false
        }
    };
    guard.written = true;

    if written {
        // Keep the indicator up for a perceptible minimum, however fast the write was.
        tokio::time::sleep(coordinator.inner.feedback_hold).await;
        coordinator.refresh_feedback_text();
        log::info!("saved game to {} (async)", coordinator.path().display());
    }

    guard.finished = true;
    written
}

/// Owns the busy flag of one async save. Dropping it, whether the task
/// completed or was torn down with its runtime, returns the slot to IDLE.
struct InFlightSave {
    coordinator: SaveCoordinator,
    written:     bool,
    finished:    bool,
}

impl InFlightSave {
    fn new(coordinator: SaveCoordinator) -> Self {
        Self { coordinator, written: false, finished: false }
    }
}

impl Drop for InFlightSave {
    fn drop(&mut self) {
        if !self.written {
            log::error!(
                "async save to {} dropped before its write; the save is lost",
                self.coordinator.path().display()
            );
        } else if !self.finished {
            log::warn!("async save task dropped during its feedback hold");
        }
        self.coordinator.finish_save();
    }
}

fn encode_payload(snapshot: &Snapshot) -> StoreResult<Vec<u8>> {
    let bytes = codec::encode(snapshot)?;
    if bytes.is_empty() {
        return Err(EncodeError::Empty.into());
    }
    Ok(bytes)
}

fn sweep_empty_file(store: &dyn SlotStore) {
    if store.exists() && store.is_empty() {
        log::warn!("removing empty save file {}", store.path().display());
        if let Err(e) = store.delete() {
            log::error!("could not remove empty save file: {e}");
        }
    }
}

fn report_failure(op: &str, err: &StoreError) {
    match err {
        StoreError::SaveDisabled | StoreError::NotFound(_) => log::debug!("{op} skipped: {err}"),
        StoreError::SaveInProgress | StoreError::Decode(_) => log::warn!("{op} failed: {err}"),
        _ => log::error!("{op} failed: {err}"),
    }
}
