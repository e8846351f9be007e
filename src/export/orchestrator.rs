//! Drive one export run over a message source.
//!
//! Phases: `Initializing → Iterating → Finalizing → Done`, or `Failed` when
//! the channel cannot be resolved or the message stream breaks. Errors are
//! sorted with [`ExportError::is_fatal`]: anything below that level is logged
//! and counted, and the run carries on.

use std::path::{Path, PathBuf};

use futures::StreamExt;
use tracing::{debug, error, info, warn};

use crate::error::{ExportError, Result};
use crate::model::{AdmissibleAttachment, AttachmentDecision, Channel, Message};
use crate::source::MessageSource;

use super::decision::{resolve, transfer_target};
use super::extract::extract;
use super::manifest::{Manifest, ManifestBuilder, ManifestEntry, ManifestWriter};
use super::options::{ExportMode, ExportOptions};

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Initializing,
    Iterating,
    Finalizing,
    Done,
    Failed,
}

/// Per-run tallies, returned in [`RunSummary`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    /// Messages pulled from the source and processed.
    pub messages_processed: usize,
    /// Messages the source could not decode. They still count toward the limit.
    pub messages_skipped: usize,
    /// Files transferred successfully.
    pub files_downloaded: usize,
    /// Files skipped because the destination already existed.
    pub files_existed: usize,
    /// Transfers that failed. Their manifest entries remain.
    pub transfers_failed: usize,
    /// Attachments left out by the filters.
    pub attachments_rejected: usize,
    /// Declared bytes of successfully transferred files.
    pub bytes_downloaded: u64,
}

/// What happened to the manifest at the end of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestOutcome {
    /// No writer attached.
    Skipped,
    /// Written to this path.
    Written(PathBuf),
    /// The writer failed; downloads are unaffected.
    Failed(String),
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub channel: Channel,
    pub counters: RunCounters,
    pub manifest: Manifest,
    pub manifest_outcome: ManifestOutcome,
}

/// Sequential exporter: one message at a time, one transfer at a time.
pub struct ExportOrchestrator<'a, S: MessageSource> {
    source: S,
    options: ExportOptions,
    writer: Option<(&'a dyn ManifestWriter, PathBuf)>,
    phase: RunPhase,
}

impl<'a, S: MessageSource> ExportOrchestrator<'a, S> {
    pub fn new(source: S, options: ExportOptions) -> Self {
        Self {
            source,
            options,
            writer: None,
            phase: RunPhase::Initializing,
        }
    }

    /// Write the manifest to `path` with `writer` when the run finishes.
    pub fn with_writer(
        mut self,
        writer: &'a dyn ManifestWriter,
        path: impl Into<PathBuf>,
    ) -> Self {
        self.writer = Some((writer, path.into()));
        self
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Run the export for `channel_identifier`.
    ///
    /// The progress callback receives `(processed, max_messages)` after each
    /// message. Returns an error only for run-level failures, in which case no
    /// manifest is written.
    pub async fn run(
        &mut self,
        channel_identifier: &str,
        progress: Option<&dyn Fn(usize, usize)>,
    ) -> Result<RunSummary> {
        self.enter(RunPhase::Initializing);
        let channel = match self.initialize(channel_identifier).await {
            Ok(channel) => channel,
            Err(e) => return Err(self.fail(e)),
        };

        let mut counters = RunCounters::default();
        let mut builder = ManifestBuilder::new(channel.display_name());

        self.enter(RunPhase::Iterating);
        if let Err(e) = self
            .iterate(&channel, &mut counters, &mut builder, progress)
            .await
        {
            return Err(self.fail(e));
        }

        self.enter(RunPhase::Finalizing);
        let manifest = builder.finish();
        let manifest_outcome = self.write_manifest(&manifest);

        self.enter(RunPhase::Done);
        info!(
            processed = counters.messages_processed,
            skipped = counters.messages_skipped,
            downloaded = counters.files_downloaded,
            existed = counters.files_existed,
            failed = counters.transfers_failed,
            rejected = counters.attachments_rejected,
            entries = manifest.len(),
            "Export finished"
        );

        Ok(RunSummary {
            channel,
            counters,
            manifest,
            manifest_outcome,
        })
    }

    async fn initialize(&mut self, identifier: &str) -> Result<Channel> {
        info!(
            extensions = %self.options.extensions,
            size_limit_mib = self.options.size_limit_mib,
            mode = %self.options.mode,
            download_dir = %self.options.download_dir.display(),
            "Starting export"
        );

        let channel = self.source.resolve_channel(identifier).await?;
        info!(channel = %channel.display_name(), id = channel.id, "Channel found");

        if self.options.mode == ExportMode::Download {
            let dir = &self.options.download_dir;
            if let Err(e) = tokio::fs::create_dir_all(dir).await {
                // Each transfer reports its own failure.
                let e = ExportError::io(dir, e);
                warn!(error = %e, "Cannot create download directory");
            }
        }
        Ok(channel)
    }

    async fn iterate(
        &mut self,
        channel: &Channel,
        counters: &mut RunCounters,
        builder: &mut ManifestBuilder,
        progress: Option<&dyn Fn(usize, usize)>,
    ) -> Result<()> {
        let limit = self.options.max_messages;
        info!(limit, "Processing messages");
        let mut messages = self.source.iter_messages(channel, limit).await?;

        let mut pulled = 0;
        while pulled < limit {
            // suspension point: next message
            let Some(next) = messages.next().await else {
                break;
            };
            pulled += 1;
            match next {
                Ok(message) => {
                    counters.messages_processed += 1;
                    debug!(
                        processed = counters.messages_processed,
                        limit,
                        message_id = message.id,
                        "Processing message"
                    );
                    self.process_message(&message, channel, counters, builder)
                        .await;
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    counters.messages_skipped += 1;
                    warn!(error = %e, "Skipping message");
                }
            }

            if let Some(cb) = progress {
                cb(pulled, limit);
            }

            // suspension point: pacing, after every message
            self.options.pacing.pause().await;
        }
        Ok(())
    }

    async fn process_message(
        &mut self,
        message: &Message,
        channel: &Channel,
        counters: &mut RunCounters,
        builder: &mut ManifestBuilder,
    ) {
        let mode = self.options.mode;
        for decision in extract(message, channel, &self.options) {
            let attachment = match decision {
                AttachmentDecision::Admissible(att) => att,
                AttachmentDecision::Rejected { file_name, reason } => {
                    counters.attachments_rejected += 1;
                    info!(
                        message_id = message.id,
                        file = file_name.as_deref().unwrap_or("<unnamed>"),
                        reason = %reason,
                        "Skipping attachment"
                    );
                    continue;
                }
            };

            let attachment = resolve(attachment, mode, &self.options.download_dir);
            info!(
                message_id = message.id,
                file = %attachment.file_name,
                size_mib = attachment.size_mib,
                "Attachment accepted"
            );
            // Recorded before any transfer; a failed transfer keeps its entry.
            builder.push(ManifestEntry::new(message.date, &attachment));

            if let Some(path) = transfer_target(mode, &attachment) {
                self.transfer(&attachment, path, counters).await;
            } else if attachment.file_exists {
                counters.files_existed += 1;
                info!(file = %attachment.file_name, "Already downloaded");
            }
        }
    }

    async fn transfer(
        &mut self,
        attachment: &AdmissibleAttachment,
        path: &Path,
        counters: &mut RunCounters,
    ) {
        info!(file = %attachment.file_name, path = %path.display(), "Downloading");
        // suspension point: transfer
        match self.source.download_media(&attachment.document, path).await {
            Ok(()) => {
                counters.files_downloaded += 1;
                counters.bytes_downloaded += attachment.document.size;
            }
            Err(e) => {
                counters.transfers_failed += 1;
                warn!(
                    file = %attachment.file_name,
                    path = %path.display(),
                    error = %e,
                    "Download failed"
                );
            }
        }
    }

    fn write_manifest(&self, manifest: &Manifest) -> ManifestOutcome {
        let Some((writer, path)) = &self.writer else {
            return ManifestOutcome::Skipped;
        };
        info!(path = %path.display(), "Writing manifest");
        match writer.write(path, manifest) {
            Ok(()) => ManifestOutcome::Written(path.clone()),
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to write manifest");
                ManifestOutcome::Failed(e.to_string())
            }
        }
    }

    fn enter(&mut self, phase: RunPhase) {
        debug!(from = ?self.phase, to = ?phase, "Run phase");
        self.phase = phase;
    }

    fn fail(&mut self, e: ExportError) -> ExportError {
        error!(error = %e, phase = ?self.phase, "Export aborted");
        self.enter(RunPhase::Failed);
        e
    }
}
