//! File naming for downloaded attachments and the manifest file.

use chrono::{DateTime, Utc};

/// Prefix the original name with the post date: `{YYYYMMDD}-{original_name}`.
///
/// Distinct days never collide. Two attachments with the same name posted on
/// the same day map to the same name; the second is then treated as already
/// present in download mode.
pub fn combine(message_date: DateTime<Utc>, original_name: &str) -> String {
    format!("{}-{}", message_date.format("%Y%m%d"), original_name)
}

/// Name of the manifest file for a run: `{YYYYMMDD}-{identifier}.json`.
///
/// `@` is removed from the identifier and `/` becomes `_`.
pub fn manifest_file_name(run_date: DateTime<Utc>, channel_identifier: &str) -> String {
    format!(
        "{}-{}.json",
        run_date.format("%Y%m%d"),
        sanitize_identifier(channel_identifier)
    )
}

fn sanitize_identifier(identifier: &str) -> String {
    identifier.replace('@', "").replace('/', "_")
}
