//! Adapter contract: what every provider handler exposes to the gateway and the host's dispatcher.

use crate::channels::channel::{Channel, ChannelType};
use crate::channels::channel_log::ChannelLog;
use crate::channels::error::AdapterError;
use crate::channels::msg::{Event, OutgoingMsg};
use crate::channels::status::MsgStatus;
use crate::channels::transport::SendContext;
use async_trait::async_trait;

/// Result of one inbound webhook: the events (or why there are none) plus the request's log.
#[derive(Debug)]
pub struct ReceiveOutcome {
    pub result: Result<Vec<Event>, AdapterError>,
    pub log: ChannelLog,
}

impl ReceiveOutcome {
    pub fn is_ignored(&self) -> bool {
        matches!(self.result, Err(ref e) if e.is_ignorable())
    }
}

/// Result of one send attempt. The status is always present; `error` says why it is not `Wired`.
#[derive(Debug)]
pub struct SendOutcome {
    pub status: MsgStatus,
    pub error: Option<AdapterError>,
}

#[async_trait]
pub trait ChannelHandler: Send + Sync {
    /// Channel type this handler serves (e.g. "RC").
    fn channel_type(&self) -> ChannelType;

    /// Human-readable provider name.
    fn name(&self) -> &str;

    /// Validate a channel's config when it is registered.
    fn validate_channel(&self, channel: &Channel) -> Result<(), AdapterError>;

    /// Normalize one raw webhook body. Pure: no I/O, no shared state.
    fn receive(&self, channel: &Channel, body: &[u8]) -> ReceiveOutcome;

    /// Single send attempt; never retries and never panics on provider failure.
    async fn send_msg(&self, channel: &Channel, msg: &OutgoingMsg, ctx: &SendContext) -> SendOutcome;
}
