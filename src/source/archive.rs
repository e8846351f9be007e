//! Offline source backed by a Telegram Desktop JSON export.
//!
//! Accepts either a single-chat export (`name`, `id`, `messages` at the top
//! level) or a full account export (`chats.list[]`, `left_chats.list[]`).
//! Attached files live next to `result.json` at the relative path given in
//! each message's `file` field.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{ExportError, Result};
use crate::model::{Channel, Document, Message};

use super::{MessageSource, MessageStream};

/// Name of the JSON file Telegram Desktop writes at the export root.
pub const RESULT_FILE: &str = "result.json";

/// Placeholder prefix used when a file was excluded from the export.
const NOT_INCLUDED_PREFIX: &str = "(File ";

#[derive(Debug, Deserialize)]
struct RawExport {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    id: Option<i64>,
    #[serde(default)]
    messages: Option<Vec<RawMessage>>,
    #[serde(default)]
    chats: Option<RawChatList>,
    #[serde(default)]
    left_chats: Option<RawChatList>,
}

#[derive(Debug, Deserialize)]
struct RawChatList {
    #[serde(default)]
    list: Vec<RawChat>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawChat {
    #[serde(default)]
    name: Option<String>,
    id: i64,
    #[serde(default)]
    messages: Vec<RawMessage>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawMessage {
    id: i64,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    date_unixtime: Option<String>,
    #[serde(default)]
    file: Option<String>,
    #[serde(default)]
    file_name: Option<String>,
    #[serde(default)]
    file_size: Option<u64>,
    #[serde(default)]
    mime_type: Option<String>,
}

impl RawMessage {
    fn parse_date(&self) -> Option<DateTime<Utc>> {
        if let Some(ts) = self.date_unixtime.as_deref() {
            if let Some(dt) = ts
                .trim()
                .parse::<i64>()
                .ok()
                .and_then(|secs| DateTime::from_timestamp(secs, 0))
            {
                return Some(dt);
            }
        }
        self.date
            .as_deref()
            .and_then(|d| NaiveDateTime::parse_from_str(d.trim(), "%Y-%m-%dT%H:%M:%S").ok())
            .map(|naive| naive.and_utc())
    }

    fn into_message(self, root: &Path) -> Result<Message> {
        let date = self
            .parse_date()
            .ok_or_else(|| ExportError::MalformedMessage {
                id: self.id,
                reason: "no readable date".into(),
            })?;

        let documents = match self.file {
            Some(location) => {
                let size = self
                    .file_size
                    .or_else(|| {
                        exported_file(root, &location)
                            .and_then(|p| p.metadata().ok())
                            .map(|m| m.len())
                    })
                    .unwrap_or(0);
                vec![Document {
                    file_name: self.file_name,
                    size,
                    mime_type: self.mime_type,
                    location,
                }]
            }
            None => Vec::new(),
        };

        Ok(Message {
            id: self.id,
            date,
            documents,
        })
    }
}

/// Resolve a message's `file` field to a path inside the export, unless the
/// file was left out of the export.
fn exported_file(root: &Path, location: &str) -> Option<PathBuf> {
    if location.starts_with(NOT_INCLUDED_PREFIX) {
        return None;
    }
    let path = root.join(location);
    path.is_file().then_some(path)
}

/// Reads channels and messages from an unpacked Telegram Desktop export.
#[derive(Debug)]
pub struct ArchiveSource {
    archive: PathBuf,
    root: PathBuf,
    chats: Vec<RawChat>,
    handle: Option<String>,
}

impl ArchiveSource {
    /// Open an export directory (or a `result.json` path directly).
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let archive = if path.is_dir() {
            path.join(RESULT_FILE)
        } else {
            path.to_path_buf()
        };
        let root = archive
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let file = File::open(&archive).map_err(|e| ExportError::io(&archive, e))?;
        let raw: RawExport = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            ExportError::InvalidArchive {
                path: archive.clone(),
                reason: e.to_string(),
            }
        })?;

        let chats = collect_chats(raw);
        if chats.is_empty() {
            return Err(ExportError::InvalidArchive {
                path: archive,
                reason: "no chats found".into(),
            });
        }
        info!(path = %archive.display(), chats = chats.len(), "Opened export archive");

        Ok(Self {
            archive,
            root,
            chats,
            handle: None,
        })
    }

    /// Public handle to report for the resolved channel. Exports do not record one.
    pub fn with_handle(mut self, handle: Option<String>) -> Self {
        self.handle = handle
            .map(|h| h.trim().trim_start_matches('@').to_string())
            .filter(|h| !h.is_empty());
        self
    }

    fn find_chat(&self, identifier: &str) -> Option<&RawChat> {
        let ident = identifier.trim().trim_start_matches('@');
        if let Ok(n) = ident.parse::<i64>() {
            let candidates = id_candidates(n);
            if let Some(chat) = self.chats.iter().find(|c| candidates.contains(&c.id)) {
                return Some(chat);
            }
        }
        let lowered = ident.to_lowercase();
        self.chats.iter().find(|c| {
            c.name
                .as_deref()
                .is_some_and(|name| name.trim().to_lowercase() == lowered)
        })
    }
}

fn collect_chats(raw: RawExport) -> Vec<RawChat> {
    if let (Some(id), Some(messages)) = (raw.id, raw.messages) {
        return vec![RawChat {
            name: raw.name,
            id,
            messages,
        }];
    }
    raw.chats
        .into_iter()
        .chain(raw.left_chats)
        .flat_map(|l| l.list)
        .collect()
}

/// Ids a numeric identifier may refer to: as given, its magnitude, and the
/// bare id behind a marked `-100…` channel id.
fn id_candidates(n: i64) -> Vec<i64> {
    let mut out = vec![n, n.saturating_abs()];
    if n < 0 {
        if let Some(bare) = n
            .unsigned_abs()
            .to_string()
            .strip_prefix("100")
            .and_then(|rest| rest.parse::<i64>().ok())
        {
            out.push(bare);
        }
    }
    out
}

#[async_trait]
impl MessageSource for ArchiveSource {
    async fn resolve_channel(&mut self, identifier: &str) -> Result<Channel> {
        let chat = self
            .find_chat(identifier)
            .ok_or_else(|| ExportError::ChannelNotFound(identifier.to_string()))?;
        Ok(Channel {
            id: chat.id,
            username: self.handle.clone(),
            title: chat.name.clone().unwrap_or_default(),
        })
    }

    async fn iter_messages(&mut self, channel: &Channel, limit: usize) -> Result<MessageStream> {
        let chat = self
            .chats
            .iter()
            .find(|c| c.id == channel.id)
            .ok_or_else(|| ExportError::ChannelNotFound(channel.id.to_string()))?;

        debug!(
            archive = %self.archive.display(),
            channel = chat.id,
            total = chat.messages.len(),
            limit,
            "Iterating archive messages"
        );

        // Exports are oldest first; yield newest first.
        let raw: Vec<RawMessage> = chat.messages.iter().rev().take(limit).cloned().collect();
        let root = self.root.clone();
        Ok(stream::iter(raw)
            .map(move |m| m.into_message(&root))
            .boxed())
    }

    async fn download_media(&mut self, document: &Document, destination: &Path) -> Result<()> {
        let source = exported_file(&self.root, &document.location)
            .ok_or_else(|| ExportError::MediaUnavailable(document.location.clone()))?;
        tokio::fs::copy(&source, destination)
            .await
            .map_err(|e| ExportError::io(destination, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    const SINGLE: &str = r#"{
        "name": "Data Drops",
        "type": "private_channel",
        "id": 1234567890,
        "messages": [
            {"id": 1, "type": "service", "date": "2024-01-04T10:00:00", "date_unixtime": "1704362400"},
            {"id": 2, "type": "message", "date": "2024-01-05T09:30:00", "date_unixtime": "1704447000",
             "file": "files/report.csv", "file_name": "report.csv", "mime_type": "text/csv"},
            {"id": 3, "type": "message", "date": "2024-01-06T12:00:00",
             "file": "(File not included. Change data exporting settings to download.)",
             "file_name": "big.zip", "file_size": 5000}
        ]
    }"#;

    fn write_archive(dir: &Path) {
        std::fs::write(dir.join(RESULT_FILE), SINGLE).unwrap();
        std::fs::create_dir_all(dir.join("files")).unwrap();
        std::fs::write(dir.join("files/report.csv"), b"a,b\n1,2\n").unwrap();
    }

    #[tokio::test]
    async fn test_resolve_by_name_and_id() {
        let tmp = tempfile::tempdir().unwrap();
        write_archive(tmp.path());
        let mut src = ArchiveSource::open(tmp.path()).unwrap();

        let by_name = src.resolve_channel("data drops").await.unwrap();
        assert_eq!(by_name.id, 1234567890);
        assert_eq!(by_name.title, "Data Drops");
        assert_eq!(by_name.username, None);

        let by_marked = src.resolve_channel("-1001234567890").await.unwrap();
        assert_eq!(by_marked.id, 1234567890);

        let err = src.resolve_channel("@elsewhere").await.unwrap_err();
        assert!(matches!(err, ExportError::ChannelNotFound(_)));
    }

    #[tokio::test]
    async fn test_messages_newest_first_with_limit() {
        let tmp = tempfile::tempdir().unwrap();
        write_archive(tmp.path());
        let mut src = ArchiveSource::open(tmp.path()).unwrap();
        let channel = src.resolve_channel("1234567890").await.unwrap();

        let stream = src.iter_messages(&channel, 2).await.unwrap();
        let msgs: Vec<Message> = stream.try_collect().await.unwrap();
        assert_eq!(msgs.iter().map(|m| m.id).collect::<Vec<_>>(), [3, 2]);

        // id 3 has no unixtime; the naive date is read as UTC
        assert_eq!(msgs[0].date.format("%Y-%m-%d %H:%M:%S").to_string(), "2024-01-06 12:00:00");
        assert_eq!(msgs[0].documents[0].size, 5000);
        // id 2 has no file_size; the exported file is measured
        assert_eq!(msgs[1].documents[0].size, 8);
        assert_eq!(msgs[1].documents[0].file_name.as_deref(), Some("report.csv"));
    }

    #[tokio::test]
    async fn test_download_copies_and_reports_missing() {
        let tmp = tempfile::tempdir().unwrap();
        write_archive(tmp.path());
        let out = tempfile::tempdir().unwrap();
        let mut src = ArchiveSource::open(tmp.path()).unwrap();
        let channel = src.resolve_channel("Data Drops").await.unwrap();
        let stream = src.iter_messages(&channel, 10).await.unwrap();
        let msgs: Vec<Message> = stream.try_collect().await.unwrap();

        let dest = out.path().join("20240105-report.csv");
        src.download_media(&msgs[1].documents[0], &dest).await.unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"a,b\n1,2\n");

        let err = src
            .download_media(&msgs[0].documents[0], &out.path().join("x.zip"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::MediaUnavailable(_)));
    }

    #[tokio::test]
    async fn test_undated_message_is_a_per_item_error() {
        let tmp = tempfile::tempdir().unwrap();
        let json = r#"{
            "name": "Drops", "id": 7,
            "messages": [
                {"id": 1, "date_unixtime": "1704362400"},
                {"id": 2, "date": "not a date"},
                {"id": 3, "date_unixtime": "1704447000"}
            ]
        }"#;
        std::fs::write(tmp.path().join(RESULT_FILE), json).unwrap();
        let mut src = ArchiveSource::open(tmp.path()).unwrap();
        let channel = src.resolve_channel("7").await.unwrap();

        let items: Vec<Result<Message>> = src
            .iter_messages(&channel, 10)
            .await
            .unwrap()
            .collect()
            .await;
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].as_ref().unwrap().id, 3);
        let err = items[1].as_ref().unwrap_err();
        assert!(matches!(err, ExportError::MalformedMessage { id: 2, .. }));
        assert!(!err.is_fatal());
        assert_eq!(items[2].as_ref().unwrap().id, 1);
    }

    #[test]
    fn test_full_export_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let json = r#"{
            "chats": {"list": [{"name": "A", "id": 1, "messages": []}]},
            "left_chats": {"list": [{"name": "B", "id": 2, "messages": []}]}
        }"#;
        std::fs::write(tmp.path().join(RESULT_FILE), json).unwrap();
        let src = ArchiveSource::open(tmp.path().join(RESULT_FILE)).unwrap();
        assert!(src.find_chat("b").is_some());
        assert!(src.find_chat("2").is_some());
    }

    #[test]
    fn test_invalid_archive() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(RESULT_FILE), "{\"about\": \"x\"}").unwrap();
        let err = ArchiveSource::open(tmp.path()).unwrap_err();
        assert!(matches!(err, ExportError::InvalidArchive { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_handle_normalized() {
        let tmp = tempfile::tempdir().unwrap();
        write_archive(tmp.path());
        let src = ArchiveSource::open(tmp.path()).unwrap().with_handle(Some("@drops".into()));
        assert_eq!(src.handle.as_deref(), Some("drops"));
    }
}
