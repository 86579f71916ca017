//! Adapter error taxonomy shared by the inbound and outbound pipelines.

use crate::channels::transport::TransportError;

/// Failure of one adapter step. The router uses [`AdapterError::is_ignorable`] to decide
/// between a success-but-ignored response and a real error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdapterError {
    /// Webhook body could not be parsed into the expected shape.
    #[error("unable to parse request JSON: {0}")]
    MalformedPayload(String),

    /// Nothing to do for this request (no message, no text, no attachment).
    #[error("{0}")]
    EmptyMessage(String),

    /// Remote identity missing or not addressable by the provider.
    #[error("invalid identity: {0}")]
    InvalidIdentity(String),

    /// Channel config lacks a usable auth token or user id.
    #[error("invalid auth config: {0}")]
    InvalidAuthConfig(String),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Provider answered without `success: true`.
    #[error("response not 'success'")]
    NotAcknowledged,

    #[error("no 'result.message_id' in response")]
    MissingExternalId,
}

impl AdapterError {
    /// Ignorable conditions are answered with 200 so the provider does not retry.
    pub fn is_ignorable(&self) -> bool {
        matches!(self, AdapterError::EmptyMessage(_))
    }

    pub(crate) fn empty(reason: impl Into<String>) -> Self {
        AdapterError::EmptyMessage(reason.into())
    }
}
