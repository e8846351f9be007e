//! The run manifest: every admissible attachment found, keyed by channel.
//!
//! Output shape:
//!
//! ```json
//! {
//!     "Channel Title": [
//!         {
//!             "File Name": "report.csv",
//!             "Date Posted": "2024-01-05 09:30:00",
//!             "Combined Name": "20240105-report.csv",
//!             "Post URL": "https://t.me/news/42"
//!         }
//!     ]
//! }
//! ```

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::error::{ExportError, Result};
use crate::model::AdmissibleAttachment;

/// `strftime` format of the "Date Posted" field.
pub const DATE_POSTED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One manifest row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct ManifestEntry {
    #[serde(rename = "File Name")]
    pub file_name: String,
    #[serde(rename = "Date Posted")]
    pub date_posted: String,
    #[serde(rename = "Combined Name")]
    pub combined_name: String,
    #[serde(rename = "Post URL")]
    pub post_url: String,
}

impl ManifestEntry {
    /// Build the row for an admissible attachment of a message posted at `posted`.
    pub fn new(posted: DateTime<Utc>, attachment: &AdmissibleAttachment) -> Self {
        Self {
            file_name: attachment.file_name.clone(),
            date_posted: posted.format(DATE_POSTED_FORMAT).to_string(),
            combined_name: attachment.combined_name.clone(),
            post_url: attachment.post_url.clone(),
        }
    }
}

/// A finished manifest: channel display name → entries in discovery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    channel: String,
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render as pretty JSON with four-space indentation.
    pub fn to_json_pretty(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        buf.push(b'\n');
        Ok(buf)
    }
}

impl Serialize for Manifest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.channel, &self.entries)?;
        map.end()
    }
}

/// Accumulates entries during a run. Order is never changed.
#[derive(Debug, Clone)]
pub struct ManifestBuilder {
    channel: String,
    entries: Vec<ManifestEntry>,
}

impl ManifestBuilder {
    pub fn new(channel_display_name: impl Into<String>) -> Self {
        Self {
            channel: channel_display_name.into(),
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, entry: ManifestEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn finish(self) -> Manifest {
        Manifest {
            channel: self.channel,
            entries: self.entries,
        }
    }
}

/// Persists a finished manifest.
pub trait ManifestWriter {
    fn write(&self, path: &Path, manifest: &Manifest) -> Result<()>;
}

/// Writes the manifest as a pretty-printed JSON file.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonManifestWriter;

impl ManifestWriter for JsonManifestWriter {
    fn write(&self, path: &Path, manifest: &Manifest) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ExportError::io(parent, e))?;
        }
        let bytes = manifest.to_json_pretty()?;
        let mut file = std::fs::File::create(path).map_err(|e| ExportError::io(path, e))?;
        file.write_all(&bytes).map_err(|e| ExportError::io(path, e))?;
        tracing::info!(path = %path.display(), entries = manifest.len(), "Wrote manifest");
        Ok(())
    }
}
