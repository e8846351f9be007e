//! Decide whether an admissible attachment needs a transfer.

use std::path::Path;

use tracing::debug;

use crate::model::AdmissibleAttachment;

use super::options::ExportMode;

/// Fill in the destination path and existence flag for `attachment`.
///
/// In list mode the attachment is returned unchanged and the filesystem is
/// not touched. In download mode the path is `download_dir/combined_name`,
/// with path separators in the sender-supplied name replaced by `_` so every
/// file lands directly in `download_dir`. The manifest keeps the name as sent.
/// The probe and the later transfer are not atomic; runs are single-consumer.
pub fn resolve(
    mut attachment: AdmissibleAttachment,
    mode: ExportMode,
    download_dir: &Path,
) -> AdmissibleAttachment {
    if mode == ExportMode::List {
        return attachment;
    }

    let path = download_dir.join(attachment.combined_name.replace(['/', '\\'], "_"));
    attachment.file_exists = path.exists();
    if attachment.file_exists {
        debug!(path = %path.display(), "File already exists");
    }
    attachment.file_path = Some(path);
    attachment
}

/// Whether the orchestrator must request a transfer for `attachment`.
pub fn needs_transfer(mode: ExportMode, attachment: &AdmissibleAttachment) -> bool {
    mode == ExportMode::Download && !attachment.file_exists
}

/// Destination to transfer `attachment` to, or `None` when no transfer is needed.
///
/// Every attachment that [`needs_transfer`] has been through [`resolve`] in
/// download mode and so carries a path.
pub fn transfer_target(mode: ExportMode, attachment: &AdmissibleAttachment) -> Option<&Path> {
    if !needs_transfer(mode, attachment) {
        return None;
    }
    let path = attachment.file_path.as_deref();
    if path.is_none() {
        debug!(file = %attachment.file_name, "Download mode attachment was never resolved");
    }
    path
}
