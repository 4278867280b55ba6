//! HTTP transport for XML-RPC calls.
//!
//! # Design
//! Requests and responses are plain data, as before: `CobblerClient` builds an
//! `HttpRequest` and interprets an `HttpResponse`, and the round-trip in
//! between goes through the `Transport` trait. `UreqTransport` is the
//! blocking default; tests and embedders that already own an HTTP stack plug
//! in their own implementation.
//!
//! All fields use owned types so values can be stored, logged, or replayed
//! without lifetime concerns.

use std::error::Error;
use std::fmt;

/// Error produced by a `Transport`. Kept boxed and untouched so callers can
/// downcast it to the transport's concrete error type.
pub type TransportError = Box<dyn Error + Send + Sync + 'static>;

/// An XML-RPC HTTP request. Always sent as a POST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// Executes one HTTP round-trip.
pub trait Transport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Blocking transport backed by a `ureq` agent.
///
/// Non-2xx statuses are returned as data rather than `Err`, so the client can
/// report them as `ApiError::HttpError` with the body attached.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqTransport").finish_non_exhaustive()
    }
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }

    /// Use a caller-configured agent (proxies, TLS, timeouts).
    pub fn with_agent(agent: ureq::Agent) -> Self {
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self.agent.post(&request.url);
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        let mut response = builder.send(request.body.as_bytes())?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.body_mut().read_to_string()?;

        Ok(HttpResponse { status, headers, body })
    }
}
