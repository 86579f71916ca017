//! Canonical URNs: `<scheme>:<path>[#<handle>]`, the join key for contact resolution.

use crate::channels::error::AdapterError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// URN scheme for Rocket.Chat contacts.
pub const ROCKETCHAT_SCHEME: &str = "rocketchat";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Urn(String);

impl Urn {
    /// Parse an existing URN string (e.g. the destination of an outgoing message).
    pub fn parse(s: &str) -> Result<Self, AdapterError> {
        let s = s.trim();
        let (scheme, rest) = s
            .split_once(':')
            .ok_or_else(|| AdapterError::InvalidIdentity(format!("missing scheme in urn '{}'", s)))?;
        if scheme.is_empty() || !scheme.chars().all(|c| c.is_ascii_lowercase()) {
            return Err(AdapterError::InvalidIdentity(format!(
                "invalid scheme in urn '{}'",
                s
            )));
        }
        let path = rest.split_once('#').map(|(p, _)| p).unwrap_or(rest);
        if path.is_empty() {
            return Err(AdapterError::InvalidIdentity(format!("empty path in urn '{}'", s)));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn scheme(&self) -> &str {
        self.0.split_once(':').map(|(s, _)| s).unwrap_or("")
    }

    /// The addressable part: after the scheme, before any handle fragment.
    pub fn path(&self) -> &str {
        let rest = self.0.split_once(':').map(|(_, r)| r).unwrap_or("");
        rest.split_once('#').map(|(p, _)| p).unwrap_or(rest)
    }
}

impl fmt::Display for Urn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Urn {
    type Error = AdapterError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Urn::parse(&s)
    }
}

impl From<Urn> for String {
    fn from(urn: Urn) -> Self {
        urn.0
    }
}

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.'
}

/// Build the canonical Rocket.Chat URN for a remote user. The handle is lower-cased;
/// an empty or unaddressable handle is dropped. Only the remote id can fail.
/// Same inputs always give the same URN.
pub fn normalize(remote_id: &str, handle: Option<&str>) -> Result<Urn, AdapterError> {
    let id = remote_id.trim();
    if id.is_empty() {
        return Err(AdapterError::InvalidIdentity("missing remote id".to_string()));
    }
    if !id.chars().all(is_id_char) {
        return Err(AdapterError::InvalidIdentity(format!(
            "remote id '{}' is not addressable",
            id
        )));
    }
    let handle = handle
        .map(|h| h.trim().trim_start_matches('@').to_lowercase())
        .filter(|h| !h.is_empty());
    match handle {
        Some(h) if h.chars().all(is_id_char) => {
            Ok(Urn(format!("{}:{}#{}", ROCKETCHAT_SCHEME, id, h)))
        }
        Some(h) => {
            log::debug!("dropping unaddressable handle '{}' for remote id {}", h, id);
            Ok(Urn(format!("{}:{}", ROCKETCHAT_SCHEME, id)))
        }
        None => Ok(Urn(format!("{}:{}", ROCKETCHAT_SCHEME, id))),
    }
}
