//! Attachment metadata and per-attachment decisions.
//!
//! The actual content is NOT read during extraction.
//! Only names, sizes and an opaque transport location are carried.

use std::path::PathBuf;

/// A document attached to a message.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Document {
    /// Original file name from the document attributes, if the sender set one.
    pub file_name: Option<String>,

    /// Declared size in bytes.
    pub size: u64,

    /// MIME type (e.g. `"text/csv"`), informational only.
    pub mime_type: Option<String>,

    /// Transport-specific handle used to fetch the bytes.
    pub location: String,
}

/// Why an attachment was left out of the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The extension is not in the allowed set.
    ExtensionNotAllowed,
    /// The declared size is over the configured ceiling.
    SizeExceeded,
    /// The document has no usable file name.
    NameMissing,
}

impl RejectReason {
    /// Stable short label for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ExtensionNotAllowed => "extension-not-allowed",
            Self::SizeExceeded => "size-exceeded",
            Self::NameMissing => "name-missing",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An attachment that passed every filter.
#[derive(Debug, Clone, PartialEq)]
pub struct AdmissibleAttachment {
    /// Original file name, trimmed.
    pub file_name: String,

    /// `{YYYYMMDD}-{file_name}`, used both in the manifest and on disk.
    pub combined_name: String,

    /// Public link to the originating message.
    pub post_url: String,

    /// Declared size in MiB.
    pub size_mib: f64,

    /// Destination path. Set only in download mode.
    pub file_path: Option<PathBuf>,

    /// `true` when the destination already exists. Only probed in download mode.
    pub file_exists: bool,

    /// The source document, kept for the transfer request.
    pub document: Document,
}

/// Outcome of evaluating one document.
#[derive(Debug, Clone, PartialEq)]
pub enum AttachmentDecision {
    /// Goes into the manifest and, in download mode, may be transferred.
    Admissible(AdmissibleAttachment),
    /// Skipped with a reason.
    Rejected {
        file_name: Option<String>,
        reason: RejectReason,
    },
}

impl AttachmentDecision {
    /// `true` for [`AttachmentDecision::Admissible`].
    pub fn is_admissible(&self) -> bool {
        matches!(self, Self::Admissible(_))
    }

    /// Consume the decision, keeping only an admissible attachment.
    pub fn into_admissible(self) -> Option<AdmissibleAttachment> {
        match self {
            Self::Admissible(att) => Some(att),
            Self::Rejected { .. } => None,
        }
    }

    /// The rejection reason, if any.
    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            Self::Admissible(_) => None,
            Self::Rejected { reason, .. } => Some(*reason),
        }
    }
}
