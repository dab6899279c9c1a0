//! Serializes a callback response and sends it exactly once.

use cfn_resource_core::CallbackResponse;
use cfn_resource_observability::ResourceLogger;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use http::{Method, Request, StatusCode, Uri};

use crate::error::CallbackError;
use crate::transport::CallbackTransport;

/// Delivers the single callback of an invocation.
///
/// There is no retry: one PUT is the contract with the orchestrator.
#[derive(Debug, Clone)]
pub struct CallbackSender<T> {
    transport: T,
}

impl<T: CallbackTransport> CallbackSender<T> {
    /// Create a sender over a transport.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Serialize `response` and PUT it to `url`.
    ///
    /// Resolves with the response status once the orchestrator answers.
    /// Non-2xx statuses are logged, not treated as failures.
    pub async fn send(
        &self,
        url: &str,
        response: &CallbackResponse,
        logger: &ResourceLogger,
    ) -> Result<StatusCode, CallbackError> {
        let request = build_request(url, response)?;

        logger
            .info_builder("Sending response to CloudFormation")
            .field("method", request.method().as_str())
            .field("host", request.uri().host().unwrap_or_default())
            .field("path", path_and_query(request.uri()))
            .field_u64("content_length", request.body().len() as u64)
            .field("body", String::from_utf8_lossy(request.body()))
            .emit();

        let status = match self.transport.send(request).await {
            Ok(status) => status,
            Err(e) => {
                logger
                    .error_builder("Callback send failed")
                    .field("error", e.to_string())
                    .emit();
                return Err(e);
            }
        };

        logger
            .debug_builder("HTTP response")
            .field_u64("status", u64::from(status.as_u16()))
            .emit();

        if !status.is_success() {
            logger
                .warn_builder("CloudFormation answered with a non-success status")
                .field_u64("status", u64::from(status.as_u16()))
                .emit();
        }

        Ok(status)
    }
}

/// Build the PUT request for a callback.
///
/// The `content-type` header is intentionally empty: the pre-signed URL is
/// signed without one and rejects any other value.
pub fn build_request(
    url: &str,
    response: &CallbackResponse,
) -> Result<Request<Vec<u8>>, CallbackError> {
    let uri = parse_response_url(url)?;
    let body = serde_json::to_vec(response)?;

    Request::builder()
        .method(Method::PUT)
        .uri(uri)
        .header(CONTENT_TYPE, "")
        .header(CONTENT_LENGTH, body.len())
        .body(body)
        .map_err(|e| CallbackError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })
}

/// Parse and validate a response URL.
pub fn parse_response_url(url: &str) -> Result<Uri, CallbackError> {
    let invalid = |reason: &str| CallbackError::InvalidUrl {
        url: url.to_string(),
        reason: reason.to_string(),
    };

    let uri: Uri = url.parse().map_err(|e: http::uri::InvalidUri| invalid(&e.to_string()))?;

    if uri.scheme_str() != Some("https") {
        return Err(invalid("scheme must be https"));
    }
    if uri.host().map_or(true, str::is_empty) {
        return Err(invalid("missing host"));
    }

    Ok(uri)
}

fn path_and_query(uri: &Uri) -> String {
    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string())
}
