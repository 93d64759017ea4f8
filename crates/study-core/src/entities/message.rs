//! Chat message entity
//!
//! Messages are immutable once created. The ordering key is the
//! server-assigned `sent_at` timestamp; messages whose timestamp has not
//! been assigned yet sort after all stamped ones, ties keeping arrival
//! order.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::traits::DocumentSnapshot;
use crate::value_objects::UserId;

/// Message body, decided once at decode time
///
/// Historic writers stored the body either as a plain string or as an
/// object wrapping the text (sometimes with an attached image reference).
/// The variant is fixed here so downstream code never re-inspects the raw
/// shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MessageBody {
    Text { text: String },
    TextWithImage { text: String, image_ref: String },
}

impl MessageBody {
    /// Create a plain text body
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// The textual part of the body, whatever the variant
    pub fn as_text(&self) -> &str {
        match self {
            Self::Text { text } | Self::TextWithImage { text, .. } => text,
        }
    }

    /// Normalize a raw `message` field value into a body
    fn from_field(value: &Value) -> Self {
        match value {
            Value::String(s) => Self::text(s.clone()),
            Value::Object(obj) => {
                let text = obj
                    .get("text")
                    .or_else(|| obj.get("message"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| Value::Object(obj.clone()).to_string());
                match obj.get("image").and_then(Value::as_str) {
                    Some(image) => Self::TextWithImage {
                        text,
                        image_ref: image.to_string(),
                    },
                    None => Self::Text { text },
                }
            }
            other => Self::text(other.to_string()),
        }
    }
}

/// Chat message entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: UserId,
    pub sender_display_name: String,
    pub body: MessageBody,
    pub message_id: String,
    /// Server-assigned; `None` while the append is still pending
    pub sent_at: Option<DateTime<Utc>>,
}

impl ChatMessage {
    /// Decode a message from a stored document.
    ///
    /// Returns `None` for records without a sender; everything else decodes
    /// with fallbacks (display name falls back to the sender id, a missing
    /// message id falls back to the document id).
    pub fn from_snapshot(snapshot: &DocumentSnapshot) -> Option<Self> {
        let sender = field_as_string(snapshot.field("sender")?)?;
        let sender = UserId::new(sender);

        let sender_display_name = snapshot
            .str_field("senderName")
            .map(str::to_string)
            .unwrap_or_else(|| sender.to_string());

        let body = snapshot
            .field("message")
            .map(MessageBody::from_field)
            .unwrap_or_else(|| MessageBody::text(""));

        let message_id = snapshot
            .field("messageID")
            .and_then(field_as_string)
            .unwrap_or_else(|| snapshot.id.clone());

        let sent_at = snapshot.field("timestamp").and_then(parse_timestamp);

        Some(Self {
            sender,
            sender_display_name,
            body,
            message_id,
            sent_at,
        })
    }

    /// Check whether the message was authored by the given user
    #[inline]
    pub fn is_from(&self, uid: &UserId) -> bool {
        &self.sender == uid
    }
}

/// Sort messages ascending by `sent_at`; pending timestamps order last and
/// ties keep the incoming (arrival) order via stable sort.
pub fn sort_by_sent_at(messages: &mut [ChatMessage]) {
    messages.sort_by(|a, b| match (a.sent_at, b.sent_at) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

/// Accept both string and numeric id-ish field values
fn field_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Timestamps arrive as RFC 3339 strings, epoch milliseconds, or the
/// `{seconds, nanoseconds}` object shape some store SDKs emit.
fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        Value::Object(obj) => {
            let seconds = obj.get("seconds").and_then(Value::as_i64)?;
            let nanos = obj
                .get("nanoseconds")
                .and_then(Value::as_u64)
                .unwrap_or(0) as u32;
            Utc.timestamp_opt(seconds, nanos).single()
        }
        _ => None,
    }
}
