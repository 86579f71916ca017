//! Outbound: typed channel config, `method.call/sendMessage` request builder, response validation.

use crate::channels::channel::{Channel, CONFIG_API_URL, CONFIG_AUTH_TOKEN, CONFIG_USER_ID};
use crate::channels::error::AdapterError;
use crate::channels::msg::OutgoingMsg;
use crate::channels::transport::HttpRequest;
use serde::Serialize;
use serde_json::Value;

pub const DEFAULT_API_URL: &str = "http://localhost:3000/api/v1";
pub const SEND_METHOD: &str = "sendMessage";

pub const HEADER_AUTH_TOKEN: &str = "X-Auth-Token";
pub const HEADER_REQUESTED_WITH: &str = "X-Requested-With";
pub const HEADER_USER_ID: &str = "X-User-Id";
const REQUESTED_WITH: &str = "XMLHttpRequest";

/// Channel credentials, checked once when the channel is registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RocketChatConfig {
    pub auth_token: String,
    pub user_id: String,
    pub api_url: Option<String>,
}

impl RocketChatConfig {
    pub fn from_channel(channel: &Channel) -> Result<Self, AdapterError> {
        let auth_token = channel
            .string_config_for_key(CONFIG_AUTH_TOKEN)
            .ok_or_else(|| {
                AdapterError::InvalidAuthConfig(format!("missing or non-string {}", CONFIG_AUTH_TOKEN))
            })?;
        let user_id = channel.string_config_for_key(CONFIG_USER_ID).ok_or_else(|| {
            AdapterError::InvalidAuthConfig(format!("missing or non-string {}", CONFIG_USER_ID))
        })?;
        Ok(Self {
            auth_token: auth_token.to_string(),
            user_id: user_id.to_string(),
            api_url: channel
                .string_config_for_key(CONFIG_API_URL)
                .map(|u| u.trim_end_matches('/').to_string()),
        })
    }
}

#[derive(Serialize)]
struct SendMessageParams<'a> {
    #[serde(rename = "_id")]
    id: String,
    rid: &'a str,
    msg: &'a str,
}

/// DDP method call carried as a JSON string inside the REST body.
#[derive(Serialize)]
struct MethodCall<'a> {
    msg: &'static str,
    method: &'static str,
    params: [SendMessageParams<'a>; 1],
    id: String,
}

#[derive(Serialize)]
struct MethodCallBody {
    message: String,
}

/// Builds send requests against one API base URL, scoped to an adapter instance.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    api_url: String,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

impl RequestBuilder {
    pub fn new(api_url: impl Into<String>) -> Self {
        let api_url: String = api_url.into();
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Request for `msg`; the room is the destination URN's path. No I/O.
    pub fn build(
        &self,
        config: &RocketChatConfig,
        msg: &OutgoingMsg,
    ) -> Result<HttpRequest, AdapterError> {
        let room = msg.urn.path();
        if room.is_empty() {
            return Err(AdapterError::InvalidIdentity(format!(
                "no room in urn '{}'",
                msg.urn
            )));
        }
        let call = MethodCall {
            msg: "method",
            method: SEND_METHOD,
            params: [SendMessageParams {
                id: msg.uuid.simple().to_string(),
                rid: room,
                msg: &msg.text,
            }],
            id: msg.id.to_string(),
        };
        let inner =
            serde_json::to_string(&call).map_err(|e| AdapterError::MalformedPayload(e.to_string()))?;
        let body = serde_json::to_string(&MethodCallBody { message: inner })
            .map_err(|e| AdapterError::MalformedPayload(e.to_string()))?;
        let base = config.api_url.as_deref().unwrap_or(&self.api_url);
        Ok(HttpRequest {
            method: "POST".to_string(),
            url: format!("{}/method.call/{}", base, SEND_METHOD),
            headers: vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                (HEADER_AUTH_TOKEN.to_string(), config.auth_token.clone()),
                (HEADER_REQUESTED_WITH.to_string(), REQUESTED_WITH.to_string()),
                (HEADER_USER_ID.to_string(), config.user_id.clone()),
            ],
            body,
        })
    }
}

/// Check the provider acknowledged the send and pull out its message id.
pub fn validate_response(body: &str) -> Result<String, AdapterError> {
    let value: Value = serde_json::from_str(body).map_err(|_| AdapterError::NotAcknowledged)?;
    if value.get("success").and_then(Value::as_bool) != Some(true) {
        return Err(AdapterError::NotAcknowledged);
    }
    match value.pointer("/result/message_id") {
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(AdapterError::MissingExternalId),
    }
}
