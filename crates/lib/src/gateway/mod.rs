//! Gateway: HTTP surface for provider webhooks, plus the send entry point for the host.
//!
//! One port serves a health probe at `/` and each registered channel's webhook at
//! `/c/{type}/{uuid}/receive`.

mod protocol;
mod server;

pub use protocol::{ReceiveResponse, ResponseData};
pub use server::{router, run_gateway, GatewayState};
