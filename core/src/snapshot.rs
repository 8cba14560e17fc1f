//! The persisted game-state record.
//!
//! A snapshot is produced wholesale by the simulation on every save
//! request and consumed wholesale on load. It has no internal references.

use crate::types::{PowerKind, AREA_UNSET, CHALLENGER_COUNT, POWER_KIND_COUNT, TUTORIAL_STEP_COUNT};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Only set on snapshots produced by a completed save.
    /// A default snapshot is never loadable progress.
    pub valid:                bool,
    pub complete:             bool,
    /// Fixed at first save; the simulation keeps it stable per playthrough.
    pub use_tutorial:         bool,
    pub elapsed_time:         f32,
    pub score:                i32,
    pub wrong_answers:        i32,
    pub losses:               i32,
    pub recent_losses:        i32,
    pub current_area_index:   i32,
    pub selected_power:       PowerKind,
    pub power_list:           [PowerKind; POWER_KIND_COUNT],
    pub challengers_defeated: [bool; CHALLENGER_COUNT],
    pub tutorial_progress:    TutorialProgress,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            valid:                false,
            complete:             false,
            use_tutorial:         true,
            elapsed_time:         0.0,
            score:                0,
            wrong_answers:        0,
            losses:               0,
            recent_losses:        0,
            current_area_index:   AREA_UNSET,
            selected_power:       PowerKind::None,
            power_list:           [PowerKind::None; POWER_KIND_COUNT],
            challengers_defeated: [false; CHALLENGER_COUNT],
            tutorial_progress:    TutorialProgress::default(),
        }
    }
}

impl Snapshot {
    /// Number of challengers marked defeated.
    pub fn defeated_count(&self) -> usize {
        self.challengers_defeated.iter().filter(|d| **d).count()
    }

    pub fn has_area(&self) -> bool {
        self.current_area_index != AREA_UNSET
    }
}

/// Tutorial steps the player has already cleared.
/// Opaque to the store: carried through save/load untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TutorialProgress {
    pub cleared: [bool; TUTORIAL_STEP_COUNT],
}
