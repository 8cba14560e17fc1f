//! Progress text pushed from the coordinator to the UI.
//!
//! The UI owns the channel; the coordinator only writes to it.

use std::sync::{Arc, Mutex};

pub const DEFAULT_FEEDBACK_TEXT: &str = "Saving Data";

/// Receives the save-progress string. An empty string means "hide".
pub trait FeedbackChannel: Send + Sync {
    fn set_text(&self, text: &str);
}

/// A channel that drops everything. Used when no UI is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullFeedback;

impl FeedbackChannel for NullFeedback {
    fn set_text(&self, _text: &str) {}
}

/// A pollable text cell the UI can read once per frame.
#[derive(Debug, Default, Clone)]
pub struct SharedFeedback {
    text: Arc<Mutex<String>>,
}

impl SharedFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current text; empty while no save is running.
    pub fn text(&self) -> String {
        self.text.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn is_showing(&self) -> bool {
        !self.text().is_empty()
    }
}

impl FeedbackChannel for SharedFeedback {
    fn set_text(&self, text: &str) {
        let mut current = self.text.lock().unwrap_or_else(|e| e.into_inner());
        if *current != text {
            current.clear();
            current.push_str(text);
        }
    }
}
