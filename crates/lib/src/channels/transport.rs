//! Transport: one HTTP round trip per call, captured verbatim for the channel log.
//!
//! No retries happen here. Deadlines and cancellation come from the caller's [`SendContext`].

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Ordered header list; order and bytes are kept exactly as built.
pub type Headers = Vec<(String, String)>;

/// Fully formed request descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: String,
    pub url: String,
    pub headers: Headers,
    pub body: String,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Raw provider response. Any status code counts as a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub headers: Headers,
    /// Body bytes as received, lossily decoded. Partial when `body_error` is set.
    pub body: String,
    /// Set when the connection failed after the status line arrived.
    pub body_error: Option<TransportError>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    #[error("request cancelled")]
    Cancelled,
    #[error("i/o error: {0}")]
    Io(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else {
            TransportError::Io(e.to_string())
        }
    }
}

/// Cooperative cancellation shared between the host and an in-flight send.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
    notify: Arc<tokio::sync::Notify>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            self.notify.notify_waiters();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    async fn cancelled(&self) {
        let notified = self.notify.notified();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}

/// Per-send deadline and cancellation, supplied by the host.
#[derive(Debug, Clone, Default)]
pub struct SendContext {
    pub timeout: Option<Duration>,
    pub cancel: CancellationToken,
}

impl SendContext {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            cancel: CancellationToken::new(),
        }
    }
}

/// Everything observed during one transport invocation.
#[derive(Debug, Clone)]
pub struct RoundTrip {
    pub request: HttpRequest,
    pub response: Option<RawResponse>,
    pub elapsed: Duration,
    pub error: Option<TransportError>,
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute exactly one request. Non-2xx statuses are returned as responses, not errors.
    async fn send(&self, request: &HttpRequest) -> Result<RawResponse, TransportError>;
}

/// Run one request through `transport`, honoring the context's deadline and cancellation.
/// Always returns a [`RoundTrip`], including on failure.
pub async fn round_trip(
    transport: &dyn Transport,
    request: HttpRequest,
    ctx: &SendContext,
) -> RoundTrip {
    let started = Instant::now();
    let result = {
        let call = async {
            match ctx.timeout {
                Some(limit) => tokio::time::timeout(limit, transport.send(&request))
                    .await
                    .unwrap_or(Err(TransportError::Timeout(limit))),
                None => transport.send(&request).await,
            }
        };
        tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => Err(TransportError::Cancelled),
            res = call => res,
        }
    };
    let elapsed = started.elapsed();
    match result {
        Ok(mut response) => {
            let error = response.body_error.take();
            match error {
                Some(ref e) => log::warn!(
                    "{} {} -> {} but reading the body failed: {}",
                    request.method,
                    request.url,
                    response.status,
                    e
                ),
                None => log::debug!(
                    "{} {} -> {} in {}ms",
                    request.method,
                    request.url,
                    response.status,
                    elapsed.as_millis()
                ),
            }
            RoundTrip {
                request,
                response: Some(response),
                elapsed,
                error,
            }
        }
        Err(e) => {
            log::warn!("{} {} failed: {}", request.method, request.url, e);
            RoundTrip {
                request,
                response: None,
                elapsed,
                error: Some(e),
            }
        }
    }
}

/// reqwest-backed transport.
#[derive(Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &HttpRequest) -> Result<RawResponse, TransportError> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|e| TransportError::Io(e.to_string()))?;
        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let mut res = builder.body(request.body.clone()).send().await?;
        let status = res.status().as_u16();
        let headers = res
            .headers()
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_string(),
                    String::from_utf8_lossy(v.as_bytes()).into_owned(),
                )
            })
            .collect();
        let mut body = Vec::new();
        let mut body_error = None;
        loop {
            match res.chunk().await {
                Ok(Some(chunk)) => body.extend_from_slice(&chunk),
                Ok(None) => break,
                Err(e) => {
                    body_error = Some(TransportError::from(e));
                    break;
                }
            }
        }
        Ok(RawResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&body).into_owned(),
            body_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Stalled;

    #[async_trait]
    impl Transport for Stalled {
        async fn send(&self, _request: &HttpRequest) -> Result<RawResponse, TransportError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Err(TransportError::Io("unreachable".into()))
        }
    }

    struct Fixed(u16);

    #[async_trait]
    impl Transport for Fixed {
        async fn send(&self, _request: &HttpRequest) -> Result<RawResponse, TransportError> {
            Ok(RawResponse {
                status: self.0,
                headers: vec![],
                body: "{}".into(),
                body_error: None,
            })
        }
    }

    fn request() -> HttpRequest {
        HttpRequest {
            method: "POST".into(),
            url: "http://localhost:3000/api/v1/method.call/sendMessage".into(),
            headers: vec![("X-Auth-Token".into(), "a123".into())],
            body: "{}".into(),
        }
    }

    #[tokio::test]
    async fn non_2xx_is_a_response_not_an_error() {
        let rt = round_trip(&Fixed(500), request(), &SendContext::default()).await;
        assert_eq!(rt.response.map(|r| r.status), Some(500));
        assert!(rt.error.is_none());
    }

    #[tokio::test]
    async fn deadline_aborts_and_still_records_the_request() {
        let ctx = SendContext::with_timeout(Duration::from_millis(10));
        let rt = round_trip(&Stalled, request(), &ctx).await;
        assert!(rt.response.is_none());
        assert_eq!(rt.error, Some(TransportError::Timeout(Duration::from_millis(10))));
        assert_eq!(rt.request.header("x-auth-token"), Some("a123"));
    }

    #[tokio::test]
    async fn cancellation_wins_over_a_pending_call() {
        let ctx = SendContext::default();
        let cancel = ctx.cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            cancel.cancel();
        });
        let rt = round_trip(&Stalled, request(), &ctx).await;
        assert_eq!(rt.error, Some(TransportError::Cancelled));
    }

    /// One-shot server: answers the first request with `reply` and closes the connection.
    fn serve_once(reply: &'static [u8]) -> u16 {
        use std::io::{Read, Write};

        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().expect("local_addr").port();
        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            while !buf.ends_with(b"\r\n\r\n{}") {
                match stream.read(&mut chunk) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => buf.extend_from_slice(&chunk[..n]),
                }
            }
            let _ = stream.write_all(reply);
            let _ = stream.flush();
            let _ = stream.shutdown(std::net::Shutdown::Both);
        });
        port
    }

    #[tokio::test]
    async fn truncated_body_keeps_status_and_partial_body() {
        let port = serve_once(
            b"HTTP/1.1 502 Bad Gateway\r\nContent-Type: text/plain\r\nContent-Length: 100\r\n\r\npartial",
        );
        let mut req = request();
        req.url = format!("http://127.0.0.1:{}/api/v1/method.call/sendMessage", port);

        let rt = round_trip(&HttpTransport::new(), req, &SendContext::default()).await;
        let res = rt.response.expect("status line was received");
        assert_eq!(res.status, 502);
        assert_eq!(res.body, "partial");
        assert!(res.body_error.is_none());
        assert!(res.headers.iter().any(|(k, v)| k == "content-type" && v == "text/plain"));
        assert!(matches!(rt.error, Some(TransportError::Io(_))));
    }

    #[tokio::test]
    async fn complete_body_is_kept_verbatim() {
        let port = serve_once(
            b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 16\r\n\r\n{\"success\":true}",
        );
        let mut req = request();
        req.url = format!("http://127.0.0.1:{}/api/v1/method.call/sendMessage", port);

        let rt = round_trip(&HttpTransport::new(), req, &SendContext::default()).await;
        assert!(rt.error.is_none());
        assert_eq!(rt.response.map(|r| r.body).as_deref(), Some(r#"{"success":true}"#));
    }

    #[tokio::test]
    async fn already_cancelled_context_never_sends() {
        let ctx = SendContext::default();
        ctx.cancel.cancel();
        let rt = round_trip(&Fixed(200), request(), &ctx).await;
        assert_eq!(rt.error, Some(TransportError::Cancelled));
    }
}
