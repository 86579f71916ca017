//! Channel: one configured provider account, owned by the host registry and read-only here.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

/// Config key holding the provider auth token.
pub const CONFIG_AUTH_TOKEN: &str = "auth_token";
/// Config key holding the provider user id sent alongside the token.
pub const CONFIG_USER_ID: &str = "user_id";
/// Optional per-channel override of the provider API base URL.
pub const CONFIG_API_URL: &str = "api_url";

/// Short channel type tag (e.g. "RC").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelType(String);

impl ChannelType {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ChannelType {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A configured provider account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub uuid: Uuid,
    pub channel_type: ChannelType,
    /// Provider-side address of the account (bot handle, number, ...).
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub config: Map<String, Value>,
}

impl Channel {
    pub fn new(
        uuid: Uuid,
        channel_type: impl Into<ChannelType>,
        address: impl Into<String>,
        country: impl Into<String>,
        config: Map<String, Value>,
    ) -> Self {
        Self {
            uuid,
            channel_type: channel_type.into(),
            address: address.into(),
            country: country.into(),
            config,
        }
    }

    pub fn config_for_key(&self, key: &str) -> Option<&Value> {
        self.config.get(key)
    }

    /// Trimmed, non-empty string value for `key`. Non-string values yield None.
    pub fn string_config_for_key(&self, key: &str) -> Option<&str> {
        self.config_for_key(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}
