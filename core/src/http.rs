//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe HTTP requests and responses as plain data. The
//! client builds `HttpRequest` values and parses `HttpResponse` values
//! without touching the network; a [`Transport`] performs the round-trip.
//! The default transport is a `ureq::Agent`.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::ApiError;

/// Query-string parameters. Inserting an existing key replaces its value.
pub type QueryParams = BTreeMap<String, String>;

/// Overall deadline applied by the default agent.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// An HTTP request described as plain data.
///
/// Built by `ScaleboxClient::build_*` methods. `url` is absolute and
/// already carries the encoded query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// First header value with the given name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// An HTTP response described as plain data.
///
/// The body is read in full before parsing, with no size cap; there is no
/// streaming. Bytes that are not valid UTF-8 are replaced with U+FFFD.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// Executes an `HttpRequest` and returns the complete response.
///
/// Implementations must return non-2xx responses as data, not as errors;
/// `Err` is reserved for transport failures and should be `ApiError::Network`.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// Build the agent used when the caller does not supply one.
///
/// Status codes are returned as data so that error bodies reach
/// `parse_response`.
pub fn default_agent(timeout: Duration) -> ureq::Agent {
    ureq::Agent::config_builder()
        .http_status_as_error(false)
        .timeout_global(Some(timeout))
        .build()
        .new_agent()
}

impl Transport for ureq::Agent {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        tracing::debug!(method = request.method.as_str(), url = %request.url, "dispatching request");

        let url = request.url.as_str();
        let headers = &request.headers;
        let result = match (request.method, request.body.as_deref()) {
            (HttpMethod::Get, None) => with_headers(self.get(url), headers).call(),
            (HttpMethod::Get, Some(body)) => with_headers(self.get(url), headers)
                .force_send_body()
                .send(body.as_bytes()),
            (HttpMethod::Delete, None) => with_headers(self.delete(url), headers).call(),
            (HttpMethod::Delete, Some(body)) => with_headers(self.delete(url), headers)
                .force_send_body()
                .send(body.as_bytes()),
            (HttpMethod::Post, Some(body)) => {
                with_headers(self.post(url), headers).send(body.as_bytes())
            }
            (HttpMethod::Post, None) => with_headers(self.post(url), headers).send_empty(),
            (HttpMethod::Put, Some(body)) => {
                with_headers(self.put(url), headers).send(body.as_bytes())
            }
            (HttpMethod::Put, None) => with_headers(self.put(url), headers).send_empty(),
        };

        let mut response = match result {
            Ok(response) => response,
            // An agent configured to treat statuses as errors drops the body.
            Err(ureq::Error::StatusCode(status)) => {
                return Ok(HttpResponse {
                    status,
                    headers: Vec::new(),
                    body: String::new(),
                })
            }
            Err(e) => return Err(ApiError::Network(e.to_string())),
        };

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let bytes = response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_vec()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        // Error bodies are embedded in messages as-is; bad UTF-8 is replaced.
        let body = String::from_utf8_lossy(&bytes).into_owned();

        tracing::debug!(status, body_len = body.len(), "received response");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}
