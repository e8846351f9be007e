//! Turn one message into per-document admission decisions.

use tracing::debug;

use crate::filter::{extension_of, is_allowed, is_within_limit, size_in_mib};
use crate::model::{
    AdmissibleAttachment, AttachmentDecision, Channel, Document, Message, RejectReason,
};

use super::link;
use super::naming;
use super::options::ExportOptions;

/// Evaluate every document of `message` independently.
///
/// A message without document media yields an empty vector. Admissible
/// attachments come back with `file_exists = false` and no path; existence
/// is resolved later by [`super::decision::resolve`].
pub fn extract(
    message: &Message,
    channel: &Channel,
    options: &ExportOptions,
) -> Vec<AttachmentDecision> {
    if !message.has_documents() {
        debug!(message_id = message.id, "No media");
        return Vec::new();
    }

    message
        .documents
        .iter()
        .map(|doc| evaluate(message, channel, doc, options))
        .collect()
}

fn evaluate(
    message: &Message,
    channel: &Channel,
    doc: &Document,
    options: &ExportOptions,
) -> AttachmentDecision {
    let Some(file_name) = doc
        .file_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
    else {
        return AttachmentDecision::Rejected {
            file_name: None,
            reason: RejectReason::NameMissing,
        };
    };

    let ext = extension_of(file_name).unwrap_or_default();
    if !is_allowed(&ext, options.extensions.allowed()) {
        return AttachmentDecision::Rejected {
            file_name: Some(file_name.to_string()),
            reason: RejectReason::ExtensionNotAllowed,
        };
    }

    if !is_within_limit(doc.size, options.size_limit_mib) {
        return AttachmentDecision::Rejected {
            file_name: Some(file_name.to_string()),
            reason: RejectReason::SizeExceeded,
        };
    }

    AttachmentDecision::Admissible(AdmissibleAttachment {
        file_name: file_name.to_string(),
        combined_name: naming::combine(message.date, file_name),
        post_url: link::locate(channel, message.id),
        size_mib: size_in_mib(doc.size),
        file_path: None,
        file_exists: false,
        document: doc.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn doc(name: Option<&str>, size: u64) -> Document {
        Document {
            file_name: name.map(String::from),
            size,
            mime_type: None,
            location: name.unwrap_or("blob").to_string(),
        }
    }

    fn message(documents: Vec<Document>) -> Message {
        Message {
            id: 42,
            date: Utc.with_ymd_and_hms(2024, 1, 5, 9, 30, 0).unwrap(),
            documents,
        }
    }

    fn channel() -> Channel {
        Channel {
            id: 1,
            username: Some("news".into()),
            title: "News".into(),
        }
    }

    #[test]
    fn test_no_media_is_empty() {
        let out = extract(&message(vec![]), &channel(), &ExportOptions::default());
        assert!(out.is_empty());
    }

    #[test]
    fn test_mixed_documents() {
        let msg = message(vec![doc(Some("report.csv"), 100), doc(Some("setup.exe"), 100)]);
        let out = extract(&msg, &channel(), &ExportOptions::default());
        assert_eq!(out.len(), 2);

        let admissible: Vec<_> = out.iter().filter(|d| d.is_admissible()).collect();
        assert_eq!(admissible.len(), 1);
        match admissible[0] {
            AttachmentDecision::Admissible(att) => {
                assert_eq!(att.file_name, "report.csv");
                assert_eq!(att.combined_name, "20240105-report.csv");
                assert_eq!(att.post_url, "https://t.me/news/42");
                assert!(!att.file_exists);
                assert!(att.file_path.is_none());
            }
            AttachmentDecision::Rejected { .. } => unreachable!(),
        }
        assert_eq!(out[1].reject_reason(), Some(RejectReason::ExtensionNotAllowed));
    }

    #[test]
    fn test_missing_name_does_not_abort_siblings() {
        let msg = message(vec![doc(None, 10), doc(Some("   "), 10), doc(Some("a.zip"), 10)]);
        let out = extract(&msg, &channel(), &ExportOptions::default());
        assert_eq!(out[0].reject_reason(), Some(RejectReason::NameMissing));
        assert_eq!(out[1].reject_reason(), Some(RejectReason::NameMissing));
        assert!(out[2].is_admissible());
    }

    #[test]
    fn test_size_ceiling() {
        let opts = ExportOptions {
            size_limit_mib: 1.0,
            ..ExportOptions::default()
        };
        let msg = message(vec![
            doc(Some("exact.zip"), 1024 * 1024),
            doc(Some("over.zip"), 1024 * 1024 + 1),
        ]);
        let out = extract(&msg, &channel(), &opts);
        assert!(out[0].is_admissible());
        assert_eq!(out[1].reject_reason(), Some(RejectReason::SizeExceeded));
    }

    #[test]
    fn test_name_is_trimmed_and_extension_case_insensitive() {
        let msg = message(vec![doc(Some("  DATA.CSV "), 1)]);
        let out = extract(&msg, &channel(), &ExportOptions::default());
        let att = out.into_iter().next().and_then(|d| d.into_admissible()).unwrap();
        assert_eq!(att.file_name, "DATA.CSV");
        assert_eq!(att.combined_name, "20240105-DATA.CSV");
    }

    #[test]
    fn test_size_reported_in_mib() {
        let msg = message(vec![doc(Some("half.txt"), 512 * 1024)]);
        let out = extract(&msg, &channel(), &ExportOptions::default());
        let att = out.into_iter().next().and_then(|d| d.into_admissible()).unwrap();
        assert_eq!(att.size_mib, 0.5);
    }
}
