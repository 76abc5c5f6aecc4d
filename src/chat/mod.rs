//! Chat messages and the reconcile rules for the collaboration panel.
//!
//! DESIGN
//! ======
//! The message list only ever grows through [`merge`], which drops anything
//! whose id is already present. Both the realtime feed and local sends go
//! through it, so the race between a write acknowledgement and the feed
//! delivering the same row cannot produce a duplicate.

pub mod store;

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use time::macros::format_description;
use uuid::Uuid;

pub use store::{OptimisticMessageStore, PendingSend};

// =============================================================================
// MESSAGE
// =============================================================================

/// Delivery state of a message. `Sending` only exists on local placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Sending,
    #[default]
    Sent,
    Error,
}

impl MessageStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sending => "sending",
            Self::Sent => "sent",
            Self::Error => "error",
        }
    }
}

impl FromStr for MessageStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sending" => Ok(Self::Sending),
            "sent" => Ok(Self::Sent),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown message status: {other}")),
        }
    }
}

/// What produced the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    #[default]
    Text,
    System,
    RevisionRequest,
}

impl MessageKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::System => "system",
            Self::RevisionRequest => "revision_request",
        }
    }
}

impl FromStr for MessageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "system" => Ok(Self::System),
            "revision_request" => Ok(Self::RevisionRequest),
            other => Err(format!("unknown message type: {other}")),
        }
    }
}

/// Message body: plain text, or an editor document kept as raw JSON so it
/// round-trips untouched through storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Doc(Value),
}

impl MessageContent {
    /// Classify a stored JSON body. Strings are plain text; everything else
    /// is treated as a document and left to the renderer to judge.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(text) => Self::Text(text),
            other => Self::Doc(other),
        }
    }

    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Text(text) => Value::String(text.clone()),
            Self::Doc(doc) => doc.clone(),
        }
    }

    #[must_use]
    pub fn render(&self) -> richdoc::View {
        match self {
            Self::Text(text) => richdoc::View::text(text.as_str()),
            Self::Doc(doc) => richdoc::render_value(doc),
        }
    }
}

impl From<&str> for MessageContent {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for MessageContent {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// A chat message as stored remotely and shown in the panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub channel_id: String,
    pub content: MessageContent,
    pub sender_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default)]
    pub status: MessageStatus,
    #[serde(rename = "type", default)]
    pub kind: MessageKind,
}

impl Message {
    /// A local, unconfirmed message with a fresh UUID and `Sending` status.
    #[must_use]
    pub fn placeholder(channel_id: impl Into<String>, sender_id: i64, content: MessageContent) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            channel_id: channel_id.into(),
            content,
            sender_id,
            created_at: OffsetDateTime::now_utc(),
            status: MessageStatus::Sending,
            kind: MessageKind::Text,
        }
    }

    /// One terminal line: `[HH:MM:SS] sender: body`, with a status suffix for
    /// anything not yet confirmed.
    #[must_use]
    pub fn summary_line(&self) -> String {
        let clock = self
            .created_at
            .format(format_description!("[hour]:[minute]:[second]"))
            .unwrap_or_default();
        let body = self.content.render().to_plain_text();
        let suffix = match self.status {
            MessageStatus::Sent => "",
            MessageStatus::Sending => " (sending)",
            MessageStatus::Error => " (failed)",
        };
        match self.kind {
            MessageKind::System => format!("[{clock}] * {body}{suffix}"),
            MessageKind::Text | MessageKind::RevisionRequest => {
                format!("[{clock}] {}: {body}{suffix}", self.sender_id)
            }
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary_line())
    }
}

// =============================================================================
// RECONCILE
// =============================================================================

/// Append `incoming` unless a message with the same id is already present.
/// Returns whether the list changed.
pub fn merge(messages: &mut Vec<Message>, incoming: Message) -> bool {
    if messages.iter().any(|m| m.id == incoming.id) {
        return false;
    }
    messages.push(incoming);
    true
}

/// Resolve a `Sending` message to `status`. Messages that already left
/// `Sending`, or are no longer in the list, are left alone. Returns whether a
/// transition happened.
pub fn resolve_status(messages: &mut [Message], id: &str, status: MessageStatus) -> bool {
    match messages.iter_mut().find(|m| m.id == id) {
        Some(message) if message.status == MessageStatus::Sending && status != MessageStatus::Sending => {
            message.status = status;
            true
        }
        _ => false,
    }
}

/// Order by `created_at` ascending, keeping the incoming order for ties, and
/// drop repeated ids after the first.
#[must_use]
pub fn chronological(mut messages: Vec<Message>) -> Vec<Message> {
    messages.sort_by_key(|m| m.created_at);
    let mut ordered = Vec::with_capacity(messages.len());
    for message in messages {
        merge(&mut ordered, message);
    }
    ordered
}
