//! Rocket.Chat channel: inbound webhook normalization and `method.call/sendMessage` delivery.

pub mod inbound;
pub mod outbound;

use crate::channels::channel::{Channel, ChannelType};
use crate::channels::error::AdapterError;
use crate::channels::handler::{ChannelHandler, ReceiveOutcome, SendOutcome};
use crate::channels::channel_log::ChannelLog;
use crate::channels::msg::OutgoingMsg;
use crate::channels::status::{self, SendAttempt};
use crate::channels::transport::{self, HttpTransport, SendContext, Transport};
use async_trait::async_trait;
use std::sync::Arc;

pub use outbound::{RequestBuilder, RocketChatConfig, DEFAULT_API_URL};

/// Channel type tag for Rocket.Chat.
pub const CHANNEL_TYPE: &str = "RC";

pub const LOG_RECEIVE: &str = "Message Receive";
pub const LOG_IGNORED: &str = "Request Ignored";
pub const LOG_ERROR: &str = "Request Error";

/// Route path for a channel's inbound webhook.
pub fn receive_path(channel: &Channel) -> String {
    format!(
        "/c/{}/{}/receive",
        channel.channel_type.as_str().to_lowercase(),
        channel.uuid
    )
}

/// Rocket.Chat handler. Holds no per-request state; safe to share across tasks.
pub struct RocketChatHandler {
    builder: RequestBuilder,
    transport: Arc<dyn Transport>,
}

impl RocketChatHandler {
    pub fn new(api_url: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            builder: RequestBuilder::new(api_url),
            transport,
        }
    }

    /// Handler sending over a real HTTP client.
    pub fn with_http(api_url: impl Into<String>) -> Self {
        Self::new(api_url, Arc::new(HttpTransport::new()))
    }

    pub fn api_url(&self) -> &str {
        self.builder.api_url()
    }

    async fn attempt(&self, channel: &Channel, msg: &OutgoingMsg, ctx: &SendContext) -> SendAttempt {
        let prepared = RocketChatConfig::from_channel(channel)
            .and_then(|config| self.builder.build(&config, msg));
        let request = match prepared {
            Ok(r) => r,
            Err(e) => {
                log::warn!("rocketchat: send of msg {} aborted: {}", msg.id, e);
                return SendAttempt::aborted(channel.uuid, msg.id, e);
            }
        };
        let rt = transport::round_trip(self.transport.as_ref(), request, ctx).await;
        let outcome = match (&rt.response, &rt.error) {
            (_, Some(e)) => Err(AdapterError::Transport(e.clone())),
            (Some(res), None) => outbound::validate_response(&res.body),
            (None, None) => Err(AdapterError::NotAcknowledged),
        };
        SendAttempt {
            channel_uuid: channel.uuid,
            msg_id: msg.id,
            round_trip: Some(rt),
            outcome,
        }
    }
}

#[async_trait]
impl ChannelHandler for RocketChatHandler {
    fn channel_type(&self) -> ChannelType {
        ChannelType::new(CHANNEL_TYPE)
    }

    fn name(&self) -> &str {
        "Rocket.Chat"
    }

    fn validate_channel(&self, channel: &Channel) -> Result<(), AdapterError> {
        RocketChatConfig::from_channel(channel).map(|_| ())
    }

    fn receive(&self, channel: &Channel, body: &[u8]) -> ReceiveOutcome {
        let result = inbound::receive(channel.uuid, body);
        let label = match result {
            Ok(_) => LOG_RECEIVE,
            Err(ref e) if e.is_ignorable() => LOG_IGNORED,
            Err(_) => LOG_ERROR,
        };
        let entry = ChannelLog::new(label, channel.uuid).for_request(
            "POST",
            &receive_path(channel),
            &String::from_utf8_lossy(body),
        );
        let entry = match result {
            Err(ref e) => {
                if e.is_ignorable() {
                    log::debug!("rocketchat: channel {} {}", channel.uuid, e);
                } else {
                    log::warn!("rocketchat: channel {} rejected webhook: {}", channel.uuid, e);
                }
                entry.with_error(e)
            }
            Ok(_) => entry,
        };
        ReceiveOutcome {
            result: result.map(|event| vec![event]),
            log: entry,
        }
    }

    async fn send_msg(&self, channel: &Channel, msg: &OutgoingMsg, ctx: &SendContext) -> SendOutcome {
        let attempt = self.attempt(channel, msg, ctx).await;
        let error = attempt.outcome.as_ref().err().cloned();
        let (mut status, entry) = status::record(attempt);
        status.add_log(entry);
        log::info!(
            "rocketchat: msg {} on channel {} -> {:?}",
            msg.id,
            channel.uuid,
            status.status()
        );
        SendOutcome { status, error }
    }
}
