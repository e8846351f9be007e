//! Channel identity and message records.

use chrono::{DateTime, Utc};

use super::attachment::Document;

/// A resolved channel: the feed messages are exported from.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Channel {
    /// Numeric identity. Some sources report it negative (marked form);
    /// links always use the magnitude.
    pub id: i64,

    /// Public handle without the leading `@`, if the channel has one.
    pub username: Option<String>,

    /// Human-readable title.
    pub title: String,
}

impl Channel {
    /// Name used as the single top-level key of the manifest.
    ///
    /// Falls back to the handle, then to the numeric id, when the title is blank.
    pub fn display_name(&self) -> String {
        if !self.title.trim().is_empty() {
            return self.title.clone();
        }
        match self.public_handle() {
            Some(handle) => handle.to_string(),
            None => self.id.to_string(),
        }
    }

    /// The handle, if present and non-empty.
    pub fn public_handle(&self) -> Option<&str> {
        self.username
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
    }
}

/// One message as yielded by the source. Read-only to the exporter.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Message {
    /// Message id within the channel.
    pub id: i64,

    /// Post timestamp.
    pub date: DateTime<Utc>,

    /// Document-type media attached to the message (empty for text, photos,
    /// service messages).
    pub documents: Vec<Document>,
}

impl Message {
    /// Whether the message carries any document media.
    pub fn has_documents(&self) -> bool {
        !self.documents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(title: &str, username: Option<&str>) -> Channel {
        Channel {
            id: -1001234,
            username: username.map(String::from),
            title: title.to_string(),
        }
    }

    #[test]
    fn test_display_name_prefers_title() {
        assert_eq!(channel("Daily Dumps", Some("dumps")).display_name(), "Daily Dumps");
    }

    #[test]
    fn test_display_name_fallbacks() {
        assert_eq!(channel("  ", Some("dumps")).display_name(), "dumps");
        assert_eq!(channel("", None).display_name(), "-1001234");
    }

    #[test]
    fn test_blank_handle_is_none() {
        assert_eq!(channel("x", Some(" ")).public_handle(), None);
    }
}
