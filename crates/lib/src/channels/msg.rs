//! Canonical messages and events exchanged with the host.

use crate::channels::urn::Urn;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

/// Host-assigned message id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MsgId(pub i64);

impl fmt::Display for MsgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A message the host wants delivered. Handed to the adapter once per send attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingMsg {
    pub id: MsgId,
    pub uuid: Uuid,
    pub channel_uuid: Uuid,
    pub urn: Urn,
    pub text: String,
    #[serde(default)]
    pub high_priority: bool,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl OutgoingMsg {
    pub fn new(id: MsgId, channel_uuid: Uuid, urn: Urn, text: impl Into<String>) -> Self {
        Self {
            id,
            uuid: Uuid::new_v4(),
            channel_uuid,
            urn,
            text: text.into(),
            high_priority: false,
            metadata: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Photo,
    Video,
    Voice,
    Audio,
    Document,
    Sticker,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Photo => "photo",
            MediaKind::Video => "video",
            MediaKind::Voice => "voice",
            MediaKind::Audio => "audio",
            MediaKind::Document => "document",
            MediaKind::Sticker => "sticker",
        }
    }
}

/// Structured attachment carried by an incoming message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Attachment {
    Geo { latitude: f64, longitude: f64 },
    /// Provider file reference; fetching the bytes is up to the host.
    File { media: MediaKind, file_id: String },
}

impl fmt::Display for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attachment::Geo {
                latitude,
                longitude,
            } => write!(f, "geo:{},{}", latitude, longitude),
            Attachment::File { media, file_id } => write!(f, "{}:{}", media.as_str(), file_id),
        }
    }
}

/// Start of a new conversation with a contact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelEvent {
    pub channel_uuid: Uuid,
    pub urn: Urn,
    pub contact_name: String,
    pub occurred_on: DateTime<Utc>,
}

/// A message received from a contact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncomingMsg {
    pub channel_uuid: Uuid,
    pub urn: Urn,
    pub contact_name: String,
    pub text: String,
    pub received_on: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

/// Domain event produced by the inbound pipeline. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    NewConversation(ChannelEvent),
    IncomingMessage(IncomingMsg),
}

impl Event {
    pub fn urn(&self) -> &Urn {
        match self {
            Event::NewConversation(e) => &e.urn,
            Event::IncomingMessage(m) => &m.urn,
        }
    }

    pub fn contact_name(&self) -> &str {
        match self {
            Event::NewConversation(e) => &e.contact_name,
            Event::IncomingMessage(m) => &m.contact_name,
        }
    }

    pub fn occurred_on(&self) -> DateTime<Utc> {
        match self {
            Event::NewConversation(e) => e.occurred_on,
            Event::IncomingMessage(m) => m.received_on,
        }
    }
}
