//! HTTP transports for callback delivery.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use http::{Request, StatusCode};
use serde::Serialize;

use crate::error::CallbackError;

/// Issues one HTTP request and reports the response status.
///
/// Implementations resolve as soon as a status line is observed; the body
/// is never read. They must not retry.
#[async_trait]
pub trait CallbackTransport: Send + Sync {
    async fn send(&self, request: Request<Vec<u8>>) -> Result<StatusCode, CallbackError>;
}

#[async_trait]
impl<T: CallbackTransport + ?Sized> CallbackTransport for Arc<T> {
    async fn send(&self, request: Request<Vec<u8>>) -> Result<StatusCode, CallbackError> {
        (**self).send(request).await
    }
}

/// Production transport over `reqwest` with rustls.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport with a connect timeout.
    ///
    /// No total timeout is set: the invocation deadline bounds the send.
    /// Redirects are never followed, so a 3xx answer is the reported status
    /// and the body is PUT exactly once.
    pub fn new(connect_timeout: Duration) -> Result<Self, CallbackError> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| CallbackError::Transport(e.to_string()))?;
        Ok(Self { client })
    }

    /// Wrap an existing client.
    ///
    /// The client must be built with `redirect::Policy::none()`; following a
    /// redirect would send the callback body a second time.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CallbackTransport for ReqwestTransport {
    async fn send(&self, request: Request<Vec<u8>>) -> Result<StatusCode, CallbackError> {
        let request = reqwest::Request::try_from(request)
            .map_err(|e| CallbackError::Transport(e.to_string()))?;

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| CallbackError::Transport(e.to_string()))?;

        Ok(response.status())
    }
}

/// A request captured by [`RecordingTransport`].
#[derive(Debug, Clone, Serialize)]
pub struct RecordedRequest {
    pub method: String,
    pub uri: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    /// Get a header value (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Parse the body as JSON.
    pub fn body_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// In-memory transport that records every request.
///
/// Clones share the same log, so a test can keep one handle and give
/// another to the code under test.
#[derive(Debug, Clone)]
pub struct RecordingTransport {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    reply: Result<StatusCode, CallbackError>,
}

impl RecordingTransport {
    /// Create a transport that answers 200 OK.
    pub fn new() -> Self {
        Self {
            requests: Arc::new(Mutex::new(Vec::new())),
            reply: Ok(StatusCode::OK),
        }
    }

    /// Answer with a different status code.
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.reply = Ok(status);
        self
    }

    /// Fail every send with a transport error, after recording it.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.reply = Err(CallbackError::Transport(message.into()));
        self
    }

    /// Snapshot of all recorded requests.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().clone()
    }

    /// Number of requests sent so far.
    pub fn count(&self) -> usize {
        self.lock().len()
    }

    /// The most recent request.
    pub fn last(&self) -> Option<RecordedRequest> {
        self.lock().last().cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<RecordedRequest>> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for RecordingTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CallbackTransport for RecordingTransport {
    async fn send(&self, request: Request<Vec<u8>>) -> Result<StatusCode, CallbackError> {
        let headers = request
            .headers()
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_string(),
                    String::from_utf8_lossy(v.as_bytes()).into_owned(),
                )
            })
            .collect();

        let recorded = RecordedRequest {
            method: request.method().to_string(),
            uri: request.uri().to_string(),
            headers,
            body: String::from_utf8_lossy(request.body()).into_owned(),
        };
        self.lock().push(recorded);

        self.reply.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn put(body: &str) -> Request<Vec<u8>> {
        Request::builder()
            .method("PUT")
            .uri("https://responseurl.com/path?x=1")
            .header("content-type", "")
            .body(body.as_bytes().to_vec())
            .unwrap()
    }

    #[tokio::test]
    async fn test_recording_transport_records() {
        let transport = RecordingTransport::new();
        let status = transport.send(put(r#"{"a":1}"#)).await.unwrap();

        assert_eq!(status, StatusCode::OK);
        assert_eq!(transport.count(), 1);

        let recorded = transport.last().unwrap();
        assert_eq!(recorded.method, "PUT");
        assert_eq!(recorded.uri, "https://responseurl.com/path?x=1");
        assert_eq!(recorded.header("Content-Type"), Some(""));
        assert_eq!(recorded.body_json().unwrap()["a"], 1);
    }

    #[tokio::test]
    async fn test_recording_transport_clones_share_log() {
        let transport = RecordingTransport::new();
        let handle = transport.clone();

        transport.send(put("{}")).await.unwrap();
        transport.send(put("{}")).await.unwrap();

        assert_eq!(handle.count(), 2);
    }

    #[tokio::test]
    async fn test_recording_transport_failing() {
        let transport = RecordingTransport::new().failing("connection reset");
        let err = transport.send(put("{}")).await.unwrap_err();

        assert!(err.is_transport());
        assert_eq!(err.to_string(), "Transport error: connection reset");
        assert_eq!(transport.count(), 1);
    }

    #[tokio::test]
    async fn test_recording_transport_custom_status() {
        let transport = RecordingTransport::new().with_status(StatusCode::FORBIDDEN);
        let status = transport.send(put("{}")).await.unwrap();
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_arc_transport_delegates() {
        let transport = Arc::new(RecordingTransport::new());
        let shared: Arc<dyn CallbackTransport> = transport.clone();

        shared.send(put("{}")).await.unwrap();
        assert_eq!(transport.count(), 1);
    }

    #[test]
    fn test_reqwest_transport_builds() {
        assert!(ReqwestTransport::new(Duration::from_secs(5)).is_ok());
    }

    // === ReqwestTransport over a local listener ===

    use std::net::SocketAddr;

    use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    /// A request as seen on the wire.
    #[derive(Debug, Clone)]
    struct WireRequest {
        request_line: String,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
    }

    impl WireRequest {
        fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        }
    }

    fn find_head_end(buf: &[u8]) -> Option<usize> {
        buf.windows(4).position(|w| w == b"\r\n\r\n")
    }

    async fn read_request(stream: &mut TcpStream) -> Option<WireRequest> {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];

        let head_end = loop {
            if let Some(pos) = find_head_end(&buf) {
                break pos;
            }
            let n = stream.read(&mut chunk).await.ok()?;
            if n == 0 {
                return None;
            }
            buf.extend_from_slice(&chunk[..n]);
        };

        let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
        let mut lines = head.split("\r\n");
        let request_line = lines.next()?.to_string();
        let headers: Vec<(String, String)> = lines
            .filter_map(|line| line.split_once(':'))
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            .collect();

        let length = headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, v)| v.parse::<usize>().ok())
            .unwrap_or(0);

        let mut body = buf[head_end + 4..].to_vec();
        while body.len() < length {
            let n = stream.read(&mut chunk).await.ok()?;
            if n == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..n]);
        }

        Some(WireRequest {
            request_line,
            headers,
            body,
        })
    }

    /// Serve raw replies in order; the last one repeats. Connections stay
    /// open after replying, so a reply that promises a body and never sends
    /// it stalls any reader.
    async fn serve(replies: Vec<&'static str>) -> (SocketAddr, Arc<Mutex<Vec<WireRequest>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&hits);

        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let log = Arc::clone(&log);
                let replies = replies.clone();
                tokio::spawn(async move {
                    while let Some(request) = read_request(&mut stream).await {
                        let index = {
                            let mut log = log.lock().unwrap();
                            log.push(request);
                            log.len() - 1
                        };
                        let reply = replies[index.min(replies.len() - 1)];
                        if stream.write_all(reply.as_bytes()).await.is_err() {
                            return;
                        }
                    }
                });
            }
        });

        (addr, hits)
    }

    fn wire_put(addr: SocketAddr, path: &str, body: &str) -> Request<Vec<u8>> {
        let body = body.as_bytes().to_vec();
        Request::builder()
            .method("PUT")
            .uri(format!("http://{}{}", addr, path))
            .header(CONTENT_TYPE, "")
            .header(CONTENT_LENGTH, body.len())
            .body(body)
            .unwrap()
    }

    fn hits(log: &Arc<Mutex<Vec<WireRequest>>>) -> Vec<WireRequest> {
        log.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn test_reqwest_transport_sends_one_put_with_exact_headers() {
        let (addr, log) = serve(vec!["HTTP/1.1 200 OK\r\ncontent-length: 0\r\n\r\n"]).await;
        let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();
        let body = r#"{"Status":"FAILED","Reason":"échec"}"#;

        let status = transport.send(wire_put(addr, "/cb?sig=abc", body)).await.unwrap();

        assert_eq!(status, StatusCode::OK);
        let hits = hits(&log);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].request_line, "PUT /cb?sig=abc HTTP/1.1");
        assert_eq!(hits[0].header("content-type"), Some(""));
        assert_eq!(
            hits[0].header("content-length"),
            Some(body.len().to_string().as_str())
        );
        assert_eq!(hits[0].body, body.as_bytes());
    }

    #[tokio::test]
    async fn test_reqwest_transport_does_not_follow_redirects() {
        let (addr, log) = serve(vec![
            "HTTP/1.1 307 Temporary Redirect\r\nlocation: /other\r\ncontent-length: 0\r\n\r\n",
            "HTTP/1.1 200 OK\r\ncontent-length: 0\r\n\r\n",
        ])
        .await;
        let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();

        let status = transport.send(wire_put(addr, "/cb", "{}")).await.unwrap();

        assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
        let hits = hits(&log);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].request_line, "PUT /cb HTTP/1.1");
    }

    #[tokio::test]
    async fn test_reqwest_transport_returns_status_without_reading_body() {
        // Promises a body that never arrives.
        let (addr, log) =
            serve(vec!["HTTP/1.1 403 Forbidden\r\ncontent-length: 4096\r\n\r\n"]).await;
        let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();

        let status = tokio::time::timeout(
            Duration::from_secs(5),
            transport.send(wire_put(addr, "/cb", "{}")),
        )
        .await
        .expect("send must resolve on the status line")
        .unwrap();

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(hits(&log).len(), 1);
    }

    #[tokio::test]
    async fn test_reqwest_transport_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();
        let err = transport.send(wire_put(addr, "/cb", "{}")).await.unwrap_err();

        assert!(err.is_transport());
    }
}
