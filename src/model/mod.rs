//! Core data model types for channels, messages, and their attachments.

pub mod attachment;
pub mod message;

pub use attachment::{AdmissibleAttachment, AttachmentDecision, Document, RejectReason};
pub use message::{Channel, Message};
