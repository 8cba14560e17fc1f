use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Encode error: {0}")]
    Encode(#[from] EncodeError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Invalid config: {0}")]
    Config(String),

    #[error("Save/load is disabled")]
    SaveDisabled,

    #[error("Save already in progress")]
    SaveInProgress,

    #[error("No async runtime available for a non-blocking save")]
    NoRuntime,

    #[error("No save file at {}", .0.display())]
    NotFound(PathBuf),
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

/// Snapshot could not be turned into bytes.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EncodeError {
    #[error("encoded payload is empty")]
    Empty,

    #[error("field '{field}' is not representable: {reason}")]
    Unrepresentable { field: &'static str, reason: String },
}

/// Bytes could not be turned into a Snapshot.
/// Every variant is a hard failure; nothing is defaulted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("payload is empty")]
    Empty,

    #[error("payload truncated: needed {needed} more byte(s), {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },

    #[error("unsupported format version {0}")]
    UnsupportedFormat(u8),

    #[error("field '{field}' has {actual} entries, expected {expected}")]
    LengthMismatch { field: &'static str, expected: usize, actual: usize },

    #[error("field '{field}' holds unknown code {value}")]
    InvalidEnum { field: &'static str, value: u8 },

    #[error("field '{field}' holds {value}, expected 0 or 1")]
    InvalidBool { field: &'static str, value: u8 },

    #[error("field '{field}' is negative: {value}")]
    Negative { field: &'static str, value: i32 },

    #[error("field '{field}' is not a finite non-negative number")]
    InvalidFloat { field: &'static str },

    #[error("{0} trailing byte(s) after snapshot")]
    TrailingBytes(usize),
}

pub type StoreResult<T> = Result<T, StoreError>;
