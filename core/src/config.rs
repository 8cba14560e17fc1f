use crate::feedback::DEFAULT_FEEDBACK_TEXT;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const SAVE_FILE_NAME: &str = "save.dat";

/// Minimum time the "saving" indicator stays up after an async write.
pub const DEFAULT_FEEDBACK_HOLD_MS: u64 = 2_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_save_path")]
    pub save_path:        PathBuf,
    /// Operator kill switch. When false every save/load fails fast.
    #[serde(default = "default_true")]
    pub allow_save_load:  bool,
    #[serde(default = "default_hold_ms")]
    pub feedback_hold_ms: u64,
    #[serde(default = "default_feedback_text")]
    pub feedback_text:    String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            save_path:        default_save_path(),
            allow_save_load:  true,
            feedback_hold_ms: DEFAULT_FEEDBACK_HOLD_MS,
            feedback_text:    default_feedback_text(),
        }
    }
}

impl StoreConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {}: {e}", path.display()))?;
        let config: StoreConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults, with the save file placed at `<dir>/save.dat`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            save_path: dir.as_ref().join(SAVE_FILE_NAME),
            ..Self::default()
        }
    }

    /// Config with a short feedback hold for use in tests.
    pub fn default_test(dir: impl AsRef<Path>) -> Self {
        Self {
            feedback_hold_ms: 50,
            ..Self::in_dir(dir)
        }
    }

    pub fn feedback_hold(&self) -> Duration {
        Duration::from_millis(self.feedback_hold_ms)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.save_path.as_os_str().is_empty() {
            anyhow::bail!("save_path must not be empty");
        }
        if self.save_path.file_name().is_none() {
            anyhow::bail!("save_path {} does not name a file", self.save_path.display());
        }
        Ok(())
    }
}

fn default_save_path() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("savegame"))
        .unwrap_or_else(|| PathBuf::from("./data"))
        .join(SAVE_FILE_NAME)
}

fn default_true() -> bool {
    true
}

fn default_hold_ms() -> u64 {
    DEFAULT_FEEDBACK_HOLD_MS
}

fn default_feedback_text() -> String {
    DEFAULT_FEEDBACK_TEXT.to_string()
}
