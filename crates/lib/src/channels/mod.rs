//! Communication channels: the adapter contract and the Rocket.Chat adapter.
//!
//! Inbound webhooks are normalized into [`Event`]s; outgoing messages are sent once per
//! call and answered with a [`MsgStatus`] carrying the [`ChannelLog`] of the round trip.
//! Retries and scheduling belong to the host.

mod channel;
mod channel_log;
mod error;
mod handler;
mod msg;
mod registry;
pub mod rocketchat;
mod status;
pub mod transport;
pub mod urn;

pub use channel::{Channel, ChannelType, CONFIG_API_URL, CONFIG_AUTH_TOKEN, CONFIG_USER_ID};
pub use channel_log::ChannelLog;
pub use error::AdapterError;
pub use handler::{ChannelHandler, ReceiveOutcome, SendOutcome};
pub use msg::{Attachment, ChannelEvent, Event, IncomingMsg, MediaKind, MsgId, OutgoingMsg};
pub use registry::{ChannelRegistry, RegistryError};
pub use rocketchat::RocketChatHandler;
pub use status::{record, MsgStatus, MsgStatusValue, SendAttempt};
pub use transport::{CancellationToken, SendContext, Transport, TransportError};
pub use urn::Urn;
