//! Inbound webhook: decode the update envelope, then build one domain event from it.

use crate::channels::error::AdapterError;
use crate::channels::msg::{Attachment, ChannelEvent, Event, IncomingMsg, MediaKind};
use crate::channels::urn::{self, Urn};
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use uuid::Uuid;

/// Text that opens a new conversation instead of delivering a message.
pub const START_COMMAND: &str = "/start";

pub const IGNORED_NO_MESSAGE: &str = "Ignoring request, no message";
pub const IGNORED_NO_CONTENT: &str = "Ignoring request, no text or attachment";

#[derive(Debug, Deserialize)]
struct Update {
    #[serde(default)]
    message: Option<Envelope>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Sender {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FileRef {
    pub file_id: String,
    #[serde(default)]
    pub file_size: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Sticker {
    pub file_id: String,
    #[serde(default)]
    pub thumb: Option<FileRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Venue {
    pub location: Location,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Contact {
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub first_name: String,
}

/// Decoded webhook message.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub message_id: i64,
    #[serde(default)]
    pub from: Sender,
    #[serde(default)]
    pub date: i64,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub photo: Vec<PhotoSize>,
    #[serde(default)]
    pub video: Option<FileRef>,
    #[serde(default)]
    pub voice: Option<FileRef>,
    #[serde(default)]
    pub audio: Option<FileRef>,
    #[serde(default)]
    pub document: Option<FileRef>,
    #[serde(default)]
    pub sticker: Option<Sticker>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub venue: Option<Venue>,
    #[serde(default)]
    pub contact: Option<Contact>,
}

impl Envelope {
    /// Message time as a UTC instant (decode guarantees it is representable).
    pub fn sent_on(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.date, 0)
            .single()
            .unwrap_or_default()
    }

    /// External id as reported by the provider.
    pub fn external_id(&self) -> String {
        self.message_id.to_string()
    }

    /// URN of the sender. A zero id counts as missing.
    pub fn urn(&self) -> Result<Urn, AdapterError> {
        let id = if self.from.id > 0 {
            self.from.id.to_string()
        } else {
            String::new()
        };
        urn::normalize(&id, Some(&self.from.username))
    }
}

/// Parse a raw webhook body. A zero message id is the ignorable `EmptyMessage`.
pub fn decode(body: &[u8]) -> Result<Envelope, AdapterError> {
    let update: Update =
        serde_json::from_slice(body).map_err(|e| AdapterError::MalformedPayload(e.to_string()))?;
    let envelope = match update.message {
        Some(m) if m.message_id != 0 => m,
        _ => return Err(AdapterError::empty(IGNORED_NO_MESSAGE)),
    };
    if Utc.timestamp_opt(envelope.date, 0).single().is_none() {
        return Err(AdapterError::MalformedPayload(format!(
            "invalid date: {}",
            envelope.date
        )));
    }
    Ok(envelope)
}

/// "First Last", falling back to the handle; may be empty.
pub fn contact_name(from: &Sender) -> String {
    let full = [from.first_name.trim(), from.last_name.trim()]
        .iter()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ");
    if full.is_empty() {
        from.username.trim().to_string()
    } else {
        full
    }
}

fn file(media: MediaKind, file_id: &str) -> Option<Attachment> {
    let file_id = file_id.trim();
    (!file_id.is_empty()).then(|| Attachment::File {
        media,
        file_id: file_id.to_string(),
    })
}

/// Attachments carried by the envelope; the largest photo size wins.
fn attachments(envelope: &Envelope) -> Vec<Attachment> {
    let mut out = Vec::new();
    let largest = envelope
        .photo
        .iter()
        .max_by_key(|p| u64::from(p.width) * u64::from(p.height));
    if let Some(p) = largest {
        out.extend(file(MediaKind::Photo, &p.file_id));
    }
    if let Some(ref s) = envelope.sticker {
        let id = s.thumb.as_ref().map(|t| t.file_id.as_str()).unwrap_or(&s.file_id);
        out.extend(file(MediaKind::Sticker, id));
    }
    let files = [
        (MediaKind::Video, &envelope.video),
        (MediaKind::Voice, &envelope.voice),
        (MediaKind::Audio, &envelope.audio),
        (MediaKind::Document, &envelope.document),
    ];
    for (media, f) in files {
        if let Some(f) = f {
            out.extend(file(media, &f.file_id));
        }
    }
    let location = envelope
        .venue
        .as_ref()
        .map(|v| v.location)
        .or(envelope.location);
    if let Some(l) = location {
        out.push(Attachment::Geo {
            latitude: l.latitude,
            longitude: l.longitude,
        });
    }
    out
}

/// Text, falling back to caption, then venue or contact descriptions.
fn message_text(envelope: &Envelope) -> String {
    if !envelope.text.is_empty() {
        return envelope.text.clone();
    }
    if !envelope.caption.is_empty() {
        return envelope.caption.clone();
    }
    if let Some(ref v) = envelope.venue {
        let parts: Vec<&str> = [v.title.trim(), v.address.trim()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect();
        return parts.join(", ");
    }
    if let Some(ref c) = envelope.contact {
        return match (c.first_name.trim(), c.phone_number.trim()) {
            ("", phone) => phone.to_string(),
            (name, "") => name.to_string(),
            (name, phone) => format!("{} ({})", name, phone),
        };
    }
    String::new()
}

/// Build the event for a decoded envelope. Nothing to deliver is the ignorable `EmptyMessage`.
pub fn build(channel_uuid: Uuid, envelope: &Envelope, urn: Urn) -> Result<Event, AdapterError> {
    let contact_name = contact_name(&envelope.from);
    let occurred_on = envelope.sent_on();

    if envelope.text == START_COMMAND {
        return Ok(Event::NewConversation(ChannelEvent {
            channel_uuid,
            urn,
            contact_name,
            occurred_on,
        }));
    }

    let text = message_text(envelope);
    let attachments = attachments(envelope);
    if text.is_empty() && attachments.is_empty() {
        return Err(AdapterError::empty(IGNORED_NO_CONTENT));
    }
    Ok(Event::IncomingMessage(IncomingMsg {
        channel_uuid,
        urn,
        contact_name,
        text,
        received_on: occurred_on,
        external_id: Some(envelope.external_id()),
        attachments,
    }))
}

/// Full inbound pipeline: decode, normalize, build.
pub fn receive(channel_uuid: Uuid, body: &[u8]) -> Result<Event, AdapterError> {
    let envelope = decode(body)?;
    let urn = envelope.urn()?;
    build(channel_uuid, &envelope, urn)
}
