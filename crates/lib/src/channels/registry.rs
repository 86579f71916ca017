//! Channel registry: handlers by channel type, validated channels by uuid.

use crate::channels::channel::{Channel, ChannelType};
use crate::channels::error::AdapterError;
use crate::channels::handler::ChannelHandler;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("no handler for channel type {0}")]
    UnknownType(ChannelType),
    #[error("channel {uuid} rejected: {source}")]
    InvalidChannel {
        uuid: Uuid,
        #[source]
        source: AdapterError,
    },
}

/// Registry shared across the gateway. Channels are read-only once registered.
pub struct ChannelRegistry {
    handlers: HashMap<ChannelType, Arc<dyn ChannelHandler>>,
    channels: Arc<RwLock<HashMap<Uuid, Arc<Channel>>>>,
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            channels: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Add a handler (at startup, before the registry is shared).
    pub fn with_handler(mut self, handler: Arc<dyn ChannelHandler>) -> Self {
        log::debug!("registering {} handler ({})", handler.name(), handler.channel_type());
        self.handlers.insert(handler.channel_type(), handler);
        self
    }

    pub fn handler(&self, channel_type: &ChannelType) -> Option<Arc<dyn ChannelHandler>> {
        self.handlers.get(channel_type).cloned()
    }

    /// Validate the channel against its handler, then store it. Replaces any channel with the same uuid.
    pub async fn register(&self, channel: Channel) -> Result<(), RegistryError> {
        let handler = self
            .handler(&channel.channel_type)
            .ok_or_else(|| RegistryError::UnknownType(channel.channel_type.clone()))?;
        handler
            .validate_channel(&channel)
            .map_err(|source| RegistryError::InvalidChannel {
                uuid: channel.uuid,
                source,
            })?;
        let mut g = self.channels.write().await;
        if g.insert(channel.uuid, Arc::new(channel.clone())).is_some() {
            log::debug!("channel {} replaced", channel.uuid);
        }
        Ok(())
    }

    pub async fn get(&self, uuid: &Uuid) -> Option<Arc<Channel>> {
        let g = self.channels.read().await;
        g.get(uuid).cloned()
    }

    pub async fn ids(&self) -> Vec<Uuid> {
        let g = self.channels.read().await;
        g.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::rocketchat::{RocketChatHandler, CHANNEL_TYPE, DEFAULT_API_URL};
    use serde_json::{json, Value};

    fn registry() -> ChannelRegistry {
        ChannelRegistry::new().with_handler(Arc::new(RocketChatHandler::with_http(DEFAULT_API_URL)))
    }

    fn channel(channel_type: &str, config: Value) -> Channel {
        let Value::Object(map) = config else {
            panic!("config must be an object");
        };
        Channel::new(Uuid::new_v4(), channel_type, "", "US", map)
    }

    #[tokio::test]
    async fn registers_valid_channels() {
        let r = registry();
        let c = channel(CHANNEL_TYPE, json!({ "auth_token": "a123", "user_id": "u1" }));
        let uuid = c.uuid;
        r.register(c).await.expect("register");
        assert_eq!(r.get(&uuid).await.map(|c| c.uuid), Some(uuid));
        assert_eq!(r.ids().await, vec![uuid]);
    }

    #[tokio::test]
    async fn rejects_channels_without_credentials() {
        let r = registry();
        let err = r.register(channel(CHANNEL_TYPE, json!({}))).await.unwrap_err();
        assert!(matches!(
            err,
            RegistryError::InvalidChannel {
                source: AdapterError::InvalidAuthConfig(_),
                ..
            }
        ));
        assert!(r.ids().await.is_empty());
    }

    #[tokio::test]
    async fn rejects_unknown_types() {
        let r = registry();
        let err = r.register(channel("TG", json!({}))).await.unwrap_err();
        assert!(matches!(err, RegistryError::UnknownType(_)));
    }
}
