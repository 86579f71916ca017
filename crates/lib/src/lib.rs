//! Relay core library: the Rocket.Chat channel adapter, its webhook gateway, and config,
//! shared by the CLI.

pub mod backend;
pub mod channels;
pub mod config;
pub mod gateway;
