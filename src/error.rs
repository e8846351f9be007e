//! Centralized error types for tgexport.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the tgexport library.
#[derive(Error, Debug)]
pub enum ExportError {
    /// I/O error with the associated file path.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The channel identifier could not be resolved by the message source.
    #[error("Channel not found: {0}")]
    ChannelNotFound(String),

    /// The transport failed while talking to the remote side or reading its stream.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The export archive is missing or malformed.
    #[error("Invalid archive '{path}': {reason}")]
    InvalidArchive { path: PathBuf, reason: String },

    /// A single message could not be decoded. The rest of the feed is usable.
    #[error("Malformed message {id}: {reason}")]
    MalformedMessage { id: i64, reason: String },

    /// The media referenced by a document cannot be fetched.
    #[error("Media unavailable: {0}")]
    MediaUnavailable(String),

    /// Writing the manifest document failed.
    #[error("Manifest error: {0}")]
    Manifest(String),

    /// A configuration value is out of range or contradictory.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Convenience alias for `Result<T, ExportError>`.
pub type Result<T> = std::result::Result<T, ExportError>;

impl ExportError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error ends a run instead of being logged and skipped.
    ///
    /// Only channel resolution and transport-level failures qualify. Anything
    /// else met while iterating (a bad message, a missing directory, a failed
    /// copy) is per-item.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ChannelNotFound(_) | Self::Transport(_) | Self::InvalidArchive { .. }
        )
    }
}

/// Allow `?` on `std::io::Error` when no path context is available
/// (rare, prefer `ExportError::io`).
impl From<std::io::Error> for ExportError {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            path: PathBuf::from("<unknown>"),
            source,
        }
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(e: serde_json::Error) -> Self {
        Self::Manifest(e.to_string())
    }
}
