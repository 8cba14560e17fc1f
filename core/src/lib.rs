//! savegame-core: the single-slot persistence store behind the game's
//! "Save and Continue" / "Continue" flow.
//!
//! Layering (leaf first):
//!   types / snapshot  -> the persisted record
//!   codec             -> Snapshot <-> bytes
//!   file_store        -> one fixed file on disk
//!   feedback          -> progress text pushed to the UI
//!   coordinator       -> owns the slot, drives sync and async saves
//!
//! RULE: Only the coordinator, through a SlotStore, touches the save file.

pub mod codec;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod feedback;
pub mod file_store;
pub mod rng;
pub mod snapshot;
pub mod types;

pub use config::StoreConfig;
pub use coordinator::{SaveCoordinator, SnapshotSource};
pub use error::{DecodeError, EncodeError, StoreError, StoreResult};
pub use feedback::{FeedbackChannel, SharedFeedback};
pub use file_store::{RawFileStore, SlotStore};
pub use snapshot::{Snapshot, TutorialProgress};
pub use types::{PowerKind, SaveMode};
