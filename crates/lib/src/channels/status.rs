//! Message status and the recorder that turns one send attempt into (status, log).

use crate::channels::channel_log::ChannelLog;
use crate::channels::error::AdapterError;
use crate::channels::msg::MsgId;
use crate::channels::transport::RoundTrip;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const LOG_MESSAGE_SENT: &str = "Message Sent";
pub const LOG_MESSAGE_SEND_ERROR: &str = "Message Send Error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MsgStatusValue {
    #[serde(rename = "E")]
    Errored,
    #[serde(rename = "W")]
    Wired,
}

/// Result of a send attempt. Starts `Errored`; terminal once returned to the host.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MsgStatus {
    channel_uuid: Uuid,
    msg_id: MsgId,
    status: MsgStatusValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    external_id: Option<String>,
    logs: Vec<ChannelLog>,
}

impl MsgStatus {
    pub fn new(channel_uuid: Uuid, msg_id: MsgId) -> Self {
        Self {
            channel_uuid,
            msg_id,
            status: MsgStatusValue::Errored,
            external_id: None,
            logs: Vec::new(),
        }
    }

    pub fn set_status(&mut self, status: MsgStatusValue) {
        self.status = status;
    }

    pub fn set_external_id(&mut self, external_id: impl Into<String>) {
        self.external_id = Some(external_id.into());
    }

    pub fn add_log(&mut self, log: ChannelLog) {
        self.logs.push(log);
    }

    pub fn channel_uuid(&self) -> Uuid {
        self.channel_uuid
    }

    pub fn msg_id(&self) -> MsgId {
        self.msg_id
    }

    pub fn status(&self) -> MsgStatusValue {
        self.status
    }

    pub fn external_id(&self) -> Option<&str> {
        self.external_id.as_deref()
    }

    pub fn logs(&self) -> &[ChannelLog] {
        &self.logs
    }
}

/// What happened during one send: the round trip (absent when aborted before I/O)
/// and the validated external id or the failure.
#[derive(Debug)]
pub struct SendAttempt {
    pub channel_uuid: Uuid,
    pub msg_id: MsgId,
    pub round_trip: Option<RoundTrip>,
    pub outcome: Result<String, AdapterError>,
}

impl SendAttempt {
    /// Attempt that failed before reaching the transport.
    pub fn aborted(channel_uuid: Uuid, msg_id: MsgId, error: AdapterError) -> Self {
        Self {
            channel_uuid,
            msg_id,
            round_trip: None,
            outcome: Err(error),
        }
    }
}

/// Derive the status and its log. `Wired` only when the transport answered, the
/// provider acknowledged, and an external id came back; every other path still yields a log.
pub fn record(attempt: SendAttempt) -> (MsgStatus, ChannelLog) {
    let mut status = MsgStatus::new(attempt.channel_uuid, attempt.msg_id);
    let log = match attempt.round_trip {
        Some(ref rt) => ChannelLog::from_round_trip(
            LOG_MESSAGE_SENT,
            attempt.channel_uuid,
            Some(attempt.msg_id),
            rt,
        ),
        None => ChannelLog::new(LOG_MESSAGE_SEND_ERROR, attempt.channel_uuid).for_msg(attempt.msg_id),
    };
    let answered = attempt
        .round_trip
        .as_ref()
        .is_some_and(|rt| rt.response.is_some());
    let log = match attempt.outcome {
        Ok(external_id) if answered && !external_id.is_empty() => {
            status.set_external_id(external_id);
            status.set_status(MsgStatusValue::Wired);
            log
        }
        Ok(_) => log.with_error(AdapterError::MissingExternalId),
        // the round trip already copied transport errors into the log
        Err(AdapterError::Transport(_)) if log.is_error() => log,
        Err(e) => log.with_error(e),
    };
    (status, log)
}
