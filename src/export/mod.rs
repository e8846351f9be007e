//! The export pipeline: extraction, admission, download decisions, pacing
//! and manifest assembly, driven by [`orchestrator::ExportOrchestrator`].

pub mod decision;
pub mod extract;
pub mod link;
pub mod manifest;
pub mod naming;
pub mod options;
pub mod orchestrator;
pub mod pacing;

pub use manifest::{JsonManifestWriter, Manifest, ManifestBuilder, ManifestEntry, ManifestWriter};
pub use options::{ExportMode, ExportOptions};
pub use orchestrator::{ExportOrchestrator, ManifestOutcome, RunCounters, RunPhase, RunSummary};
pub use pacing::Pacing;
