//! Immutable run configuration.

use std::path::PathBuf;

use crate::error::{ExportError, Result};
use crate::filter::extension::ExtensionPolicy;
use crate::filter::size::DEFAULT_SIZE_LIMIT_MIB;

use super::pacing::Pacing;

/// Default cap on messages pulled from the source.
pub const DEFAULT_MAX_MESSAGES: usize = 100;

/// What to do with admissible attachments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportMode {
    /// Record metadata only. The filesystem is never touched.
    #[default]
    List,
    /// Record metadata and transfer files that are not already on disk.
    Download,
}

impl std::str::FromStr for ExportMode {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "list" => Ok(Self::List),
            "download" => Ok(Self::Download),
            other => Err(ExportError::InvalidConfig(format!(
                "unknown mode '{other}' (expected 'list' or 'download')"
            ))),
        }
    }
}

impl std::fmt::Display for ExportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::List => "list",
            Self::Download => "download",
        })
    }
}

/// Everything a run needs besides the source and writer. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Allowed extensions.
    pub extensions: ExtensionPolicy,
    /// Size ceiling in MiB (inclusive).
    pub size_limit_mib: f64,
    /// Maximum number of messages to process.
    pub max_messages: usize,
    /// List or download.
    pub mode: ExportMode,
    /// Destination for downloaded files.
    pub download_dir: PathBuf,
    /// Delay between messages.
    pub pacing: Pacing,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            extensions: ExtensionPolicy::default(),
            size_limit_mib: DEFAULT_SIZE_LIMIT_MIB,
            max_messages: DEFAULT_MAX_MESSAGES,
            mode: ExportMode::List,
            download_dir: PathBuf::from("."),
            pacing: Pacing::default(),
        }
    }
}

impl ExportOptions {
    /// Reject values that cannot produce a meaningful run.
    pub fn validate(&self) -> Result<()> {
        if self.extensions.is_empty() {
            return Err(ExportError::InvalidConfig(
                "allowed extension list is empty".into(),
            ));
        }
        if !self.size_limit_mib.is_finite() || self.size_limit_mib < 0.0 {
            return Err(ExportError::InvalidConfig(format!(
                "size limit must be a non-negative number of MiB, got {}",
                self.size_limit_mib
            )));
        }
        Ok(())
    }
}
