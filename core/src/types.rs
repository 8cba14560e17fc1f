//! Shared primitive types used across the save store.

use serde::{Deserialize, Serialize};

/// Number of distinct power kinds, `PowerKind::None` included.
/// The power list in every snapshot has exactly this many entries.
pub const POWER_KIND_COUNT: usize = 6;

/// Number of challenger entities in the world.
pub const CHALLENGER_COUNT: usize = 9;

/// Number of tutorial steps tracked in a snapshot.
pub const TUTORIAL_STEP_COUNT: usize = 12;

/// Area index meaning "no area entered yet".
pub const AREA_UNSET: i32 = -1;

/// A power the player can hold.
/// Discriminants are written to disk: NEVER reorder, only append
/// (and bump POWER_KIND_COUNT).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum PowerKind {
    #[default]
    None = 0,
    Shield = 1,
    Focus = 2,
    Hint = 3,
    Retry = 4,
    Skip = 5,
}

impl PowerKind {
    pub const ALL: [PowerKind; POWER_KIND_COUNT] = [
        Self::None,
        Self::Shield,
        Self::Focus,
        Self::Hint,
        Self::Retry,
        Self::Skip,
    ];

    /// Stable on-disk code.
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::None   => "none",
            Self::Shield => "shield",
            Self::Focus  => "focus",
            Self::Hint   => "hint",
            Self::Retry  => "retry",
            Self::Skip   => "skip",
        }
    }
}

/// How a save request is carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    /// Encode and write on the caller's thread; returns once the file is written.
    Sync,
    /// Accept, then encode and write on a spawned task with a feedback hold.
    Async,
}
