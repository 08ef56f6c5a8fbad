use serde::{Deserialize, Serialize};

/// A ticket snapshot as reported by the legacy tracker.
///
/// `original_id` is the ID the extraction loop asked for; `numerical_id` is
/// the ID the tracker reported back. They diverge exactly when the ticket
/// was merged into another one, in which case the history belongs to the
/// surviving ticket and is not carried here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyTicket {
    pub original_id: u64,
    pub numerical_id: u64,
    pub subject: String,
    pub queue: String,
    pub status: String,
    pub creator: String,
    pub owner: String,
    /// Creation timestamp, verbatim tracker string.
    pub created: String,
    /// Resolution timestamp, verbatim tracker string ("Not set" when open).
    pub resolved: String,
}

impl LegacyTicket {
    /// A ticket fetched by one ID but reported under another was merged
    /// into the surviving ticket.
    pub fn is_merged(&self) -> bool {
        self.original_id != self.numerical_id
    }
}

/// One transaction from a ticket's history.
///
/// Only `Correspond` and `Comment` items are replayed into the target
/// system; every other kind (status changes, ownership changes, ...) is
/// carried in the snapshot but dropped at load time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyHistoryItem {
    pub id: u64,
    pub kind: String,
    pub creator: String,
    pub created: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<AttachmentRef>,
}

impl LegacyHistoryItem {
    pub fn is_replayable(&self) -> bool {
        self.kind == "Correspond" || self.kind == "Comment"
    }
}

/// Reference from a history item to an attachment, by tracker-wide ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentRef {
    pub id: u64,
    pub name: String,
}

/// Attachment payload. Bytes are stored exactly as decoded from the
/// tracker and are only ever base64-encoded for transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyAttachment {
    pub filename: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

impl LegacyAttachment {
    /// Unnamed attachments and detached signature blobs are noise and are
    /// dropped during article replay.
    pub fn is_noise(&self) -> bool {
        self.filename.is_empty() || self.filename == "signature.asc"
    }
}

/// A user record from the legacy tracker, keyed by its internal username.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyUser {
    pub name: String,
    /// May be empty for system accounts such as "Nobody".
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_name: Option<String>,
}

/// A ticket together with its full extracted history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketRecord {
    pub ticket: LegacyTicket,
    pub history: Vec<LegacyHistoryItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merged_ticket_detected_by_id_divergence() {
        let mut ticket = LegacyTicket {
            original_id: 5,
            numerical_id: 5,
            subject: "Printer broken".into(),
            queue: "Support".into(),
            status: "open".into(),
            creator: "jdoe".into(),
            owner: "root".into(),
            created: "Mon Apr 04 13:06:14 2016".into(),
            resolved: "Not set".into(),
        };
        assert!(!ticket.is_merged());
        ticket.numerical_id = 7;
        assert!(ticket.is_merged());
    }

    #[test]
    fn only_correspond_and_comment_replay() {
        let mut item = LegacyHistoryItem {
            id: 1,
            kind: "Correspond".into(),
            creator: "jdoe".into(),
            created: "2016-04-04 13:06:14".into(),
            content: "hello".into(),
            attachments: vec![],
        };
        assert!(item.is_replayable());
        item.kind = "Comment".into();
        assert!(item.is_replayable());
        item.kind = "Status".into();
        assert!(!item.is_replayable());
        item.kind = "Set".into();
        assert!(!item.is_replayable());
    }

    #[test]
    fn signature_and_unnamed_attachments_are_noise() {
        let mut att = LegacyAttachment {
            filename: "report.pdf".into(),
            content_type: "application/pdf".into(),
            content: vec![1, 2, 3],
        };
        assert!(!att.is_noise());
        att.filename = "signature.asc".into();
        assert!(att.is_noise());
        att.filename = String::new();
        assert!(att.is_noise());
    }

    #[test]
    fn history_item_round_trips_json() {
        let item = LegacyHistoryItem {
            id: 42,
            kind: "Correspond".into(),
            creator: "jdoe".into(),
            created: "2016-04-04 13:06:14".into(),
            content: "line one\nline two".into(),
            attachments: vec![AttachmentRef {
                id: 9001,
                name: "report.pdf".into(),
            }],
        };
        let json = serde_json::to_string(&item).unwrap();
        let parsed: LegacyHistoryItem = serde_json::from_str(&json).unwrap();
        assert_eq!(item, parsed);
    }
}
