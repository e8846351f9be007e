//! `tgexport` — list or download document attachments from a Telegram
//! channel's history.
//!
//! This crate provides the export pipeline: per-message attachment
//! extraction, extension and size filtering, idempotent download decisions,
//! paced iteration over a [`source::MessageSource`], and the JSON manifest.

pub mod config;
pub mod error;
pub mod export;
pub mod filter;
pub mod model;
pub mod source;
