//! Message sources: where channels, messages and media bytes come from.

pub mod archive;

use std::path::Path;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::Result;
use crate::model::{Channel, Document, Message};

pub use archive::ArchiveSource;

/// Finite, single-use stream of messages in source order (typically newest first).
pub type MessageStream = BoxStream<'static, Result<Message>>;

/// The transport the exporter pulls from.
///
/// Each call is a suspension point for the run; the exporter never issues
/// two calls at once.
#[async_trait]
pub trait MessageSource: Send {
    /// Resolve a channel identifier (handle, title or numeric id).
    async fn resolve_channel(&mut self, identifier: &str) -> Result<Channel>;

    /// Start iterating the channel's messages, yielding at most `limit`.
    async fn iter_messages(&mut self, channel: &Channel, limit: usize) -> Result<MessageStream>;

    /// Fetch the bytes of `document` into `destination`.
    async fn download_media(&mut self, document: &Document, destination: &Path) -> Result<()>;
}
