//! Channel logs: the operator-facing audit record of one request/response round trip.

use crate::channels::msg::MsgId;
use crate::channels::transport::{Headers, RoundTrip};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// Header values never written to a log verbatim.
const REDACTED_HEADERS: &[&str] = &["x-auth-token", "authorization"];
const REDACTED: &str = "********";

fn redact(headers: &Headers) -> Headers {
    headers
        .iter()
        .map(|(k, v)| {
            if REDACTED_HEADERS.iter().any(|r| k.eq_ignore_ascii_case(r)) {
                (k.clone(), REDACTED.to_string())
            } else {
                (k.clone(), v.clone())
            }
        })
        .collect()
}

/// Immutable once attached; only the consuming builder methods below modify it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelLog {
    label: String,
    channel_uuid: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    msg_id: Option<MsgId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    request_headers: Headers,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status_code: Option<u16>,
    response_headers: Headers,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_body: Option<String>,
    elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    created_on: DateTime<Utc>,
}

impl ChannelLog {
    /// A log with no HTTP exchange (e.g. a send aborted by bad config).
    pub fn new(label: impl Into<String>, channel_uuid: Uuid) -> Self {
        Self {
            label: label.into(),
            channel_uuid,
            msg_id: None,
            method: None,
            url: None,
            request_headers: Vec::new(),
            request_body: None,
            status_code: None,
            response_headers: Vec::new(),
            response_body: None,
            elapsed_ms: 0,
            error: None,
            created_on: Utc::now(),
        }
    }

    /// Log of a transport round trip. Transport failures are copied into `error`.
    pub fn from_round_trip(
        label: impl Into<String>,
        channel_uuid: Uuid,
        msg_id: Option<MsgId>,
        rt: &RoundTrip,
    ) -> Self {
        let mut log = Self::new(label, channel_uuid)
            .for_request(&rt.request.method, &rt.request.url, &rt.request.body);
        log.msg_id = msg_id;
        log.request_headers = redact(&rt.request.headers);
        log.elapsed_ms = u64::try_from(rt.elapsed.as_millis()).unwrap_or(u64::MAX);
        if let Some(ref res) = rt.response {
            log.status_code = Some(res.status);
            log.response_headers = res.headers.clone();
            log.response_body = Some(res.body.clone());
        }
        match rt.error {
            Some(ref e) => log.with_error(e),
            None => log,
        }
    }

    pub fn for_msg(mut self, msg_id: MsgId) -> Self {
        self.msg_id = Some(msg_id);
        self
    }

    pub fn for_request(mut self, method: &str, url: &str, body: &str) -> Self {
        self.method = Some(method.to_string());
        self.url = Some(url.to_string());
        self.request_body = Some(body.to_string());
        self
    }

    /// Record a failure. A second error is appended, never replacing the first.
    pub fn with_error(mut self, error: impl fmt::Display) -> Self {
        let error = error.to_string();
        self.error = Some(match self.error.take() {
            Some(prev) => format!("{}; {}", prev, error),
            None => error,
        });
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn channel_uuid(&self) -> Uuid {
        self.channel_uuid
    }

    pub fn msg_id(&self) -> Option<MsgId> {
        self.msg_id
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn request_headers(&self) -> &Headers {
        &self.request_headers
    }

    pub fn request_body(&self) -> Option<&str> {
        self.request_body.as_deref()
    }

    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    pub fn response_body(&self) -> Option<&str> {
        self.response_body.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn created_on(&self) -> DateTime<Utc> {
        self.created_on
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::transport::{HttpRequest, RawResponse, TransportError};
    use std::time::Duration;

    fn rt(response: Option<RawResponse>, error: Option<TransportError>) -> RoundTrip {
        RoundTrip {
            request: HttpRequest {
                method: "POST".into(),
                url: "http://rc.test/api/v1/method.call/sendMessage".into(),
                headers: vec![
                    ("Content-Type".into(), "application/json".into()),
                    ("X-Auth-Token".into(), "secret-token".into()),
                    ("X-User-Id".into(), "LPCCTNijXfnTXz6pf".into()),
                ],
                body: "{}".into(),
            },
            response,
            elapsed: Duration::from_millis(12),
            error,
        }
    }

    #[test]
    fn round_trip_log_redacts_auth_token() {
        let log = ChannelLog::from_round_trip("Message Sent", Uuid::nil(), Some(MsgId(10)), &rt(None, None));
        let token = log
            .request_headers()
            .iter()
            .find(|(k, _)| k == "X-Auth-Token")
            .map(|(_, v)| v.as_str());
        assert_eq!(token, Some(REDACTED));
        assert!(log
            .request_headers()
            .contains(&("X-User-Id".to_string(), "LPCCTNijXfnTXz6pf".to_string())));
        assert_eq!(log.msg_id(), Some(MsgId(10)));
    }

    #[test]
    fn round_trip_log_keeps_response_verbatim() {
        let res = RawResponse {
            status: 502,
            headers: vec![("content-type".into(), "text/html".into())],
            body: "<html>bad gateway</html>".into(),
            body_error: None,
        };
        let log = ChannelLog::from_round_trip("Message Sent", Uuid::nil(), None, &rt(Some(res), None));
        assert_eq!(log.status_code(), Some(502));
        assert_eq!(log.response_body(), Some("<html>bad gateway</html>"));
        assert!(!log.is_error());
    }

    #[test]
    fn transport_failure_lands_in_error() {
        let log = ChannelLog::from_round_trip(
            "Message Sent",
            Uuid::nil(),
            None,
            &rt(None, Some(TransportError::Cancelled)),
        );
        assert_eq!(log.error(), Some("request cancelled"));
        assert_eq!(log.status_code(), None);
    }

    #[test]
    fn errors_accumulate() {
        let log = ChannelLog::new("Message Sent", Uuid::nil())
            .with_error("first")
            .with_error("second");
        assert_eq!(log.error(), Some("first; second"));
    }
}
