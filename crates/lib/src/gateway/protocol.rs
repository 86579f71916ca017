//! Webhook response bodies returned to the provider.

use crate::channels::Event;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

pub const ACCEPTED: &str = "Accepted";
pub const IGNORED: &str = "Ignored";
pub const ERROR: &str = "Error";

/// Wire response: `{ "message": "Accepted" | "Ignored" | "Error", "data": [...] }`.
#[derive(Debug, Clone, Serialize)]
pub struct ReceiveResponse {
    pub message: &'static str,
    pub data: Vec<ResponseData>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseData {
    Msg {
        channel_uuid: Uuid,
        urn: String,
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        external_id: Option<String>,
        received_on: DateTime<Utc>,
    },
    Event {
        channel_uuid: Uuid,
        urn: String,
        event_type: &'static str,
        occurred_on: DateTime<Utc>,
    },
    Info {
        info: String,
    },
    Error {
        error: String,
    },
}

impl From<&Event> for ResponseData {
    fn from(event: &Event) -> Self {
        match event {
            Event::NewConversation(e) => ResponseData::Event {
                channel_uuid: e.channel_uuid,
                urn: e.urn.to_string(),
                event_type: "new_conversation",
                occurred_on: e.occurred_on,
            },
            Event::IncomingMessage(m) => ResponseData::Msg {
                channel_uuid: m.channel_uuid,
                urn: m.urn.to_string(),
                text: m.text.clone(),
                external_id: m.external_id.clone(),
                received_on: m.received_on,
            },
        }
    }
}

impl ReceiveResponse {
    pub fn accepted(events: &[Event]) -> Self {
        Self {
            message: ACCEPTED,
            data: events.iter().map(ResponseData::from).collect(),
        }
    }

    pub fn ignored(info: impl Into<String>) -> Self {
        Self {
            message: IGNORED,
            data: vec![ResponseData::Info { info: info.into() }],
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self {
            message: ERROR,
            data: vec![ResponseData::Error {
                error: error.into(),
            }],
        }
    }
}
