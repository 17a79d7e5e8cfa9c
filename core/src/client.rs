//! Request builder, executor and response parser for the sandbox API.
//!
//! # Design
//! `ScaleboxClient` holds only immutable configuration: a parsed base URL,
//! the API key and a transport. Every call goes through the same three
//! steps: `build_request` produces an `HttpRequest`, the transport
//! executes it, and `parse_response` classifies and decodes the
//! `HttpResponse`. Building and parsing are pure, so endpoint requests
//! can be checked without a network. The client carries no mutable state
//! and can be shared across threads.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::config::ClientConfig;
use crate::envelope;
use crate::error::ApiError;
use crate::http::{
    default_agent, HttpMethod, HttpRequest, HttpResponse, QueryParams, Transport, DEFAULT_TIMEOUT,
};

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Placeholder for requests without a body.
pub(crate) const NO_BODY: Option<&()> = None;

/// Blocking client for the sandbox API.
///
/// `T` executes requests; by default a `ureq::Agent` with a 30 second
/// global timeout.
#[derive(Clone)]
pub struct ScaleboxClient<T = ureq::Agent> {
    base_url: Url,
    api_key: String,
    transport: T,
}

impl ScaleboxClient {
    /// Client with the default agent. Fails with `ApiError::Configuration`
    /// if `base_url` is not an absolute URL.
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, ApiError> {
        Self::with_transport(base_url, api_key, default_agent(DEFAULT_TIMEOUT))
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        Self::with_transport(
            &config.base_url,
            &config.api_key,
            default_agent(config.timeout),
        )
    }
}

impl<T: Transport> ScaleboxClient<T> {
    /// Client with a caller-supplied transport, e.g. a `ureq::Agent` with
    /// a different timeout.
    pub fn with_transport(base_url: &str, api_key: &str, transport: T) -> Result<Self, ApiError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            api_key: api_key.to_string(),
            transport,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Build a request for `path` relative to the base URL.
    ///
    /// `path` replaces the base URL's path as-is. `query` is merged into
    /// the base URL's query string; nothing is added when it is empty.
    pub fn build_request<B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
        query: &QueryParams,
    ) -> Result<HttpRequest, ApiError> {
        let mut url = self.base_url.clone();
        url.set_path(path);

        if !query.is_empty() {
            let mut merged: QueryParams = url.query_pairs().into_owned().collect();
            merged.extend(query.iter().map(|(k, v)| (k.clone(), v.clone())));
            let mut pairs = url.query_pairs_mut();
            pairs.clear();
            for (key, value) in &merged {
                pairs.append_pair(key, value);
            }
        }

        let body = body
            .map(|b| serde_json::to_string(b))
            .transpose()
            .map_err(|e| ApiError::Encoding(e.to_string()))?;

        Ok(HttpRequest {
            method,
            url: url.into(),
            headers: vec![
                ("content-type".to_string(), "application/json".to_string()),
                (API_KEY_HEADER.to_string(), self.api_key.clone()),
            ],
            body,
        })
    }

    /// Run a request through the transport and return the raw response.
    pub fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        self.transport.execute(request)
    }

    /// Classify the status and decode the result document.
    pub fn parse_response<R: DeserializeOwned>(&self, response: &HttpResponse) -> Result<R, ApiError> {
        envelope::parse_response(response)
    }

    /// Classify the status and discard the body.
    pub fn check_response(&self, response: &HttpResponse) -> Result<(), ApiError> {
        envelope::check_status(response)
    }

    /// Execute a built request and decode its result.
    pub fn send<R: DeserializeOwned>(&self, request: &HttpRequest) -> Result<R, ApiError> {
        let response = self.execute(request)?;
        self.parse_response(&response)
    }

    /// Build, execute and decode in one step.
    pub fn invoke<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
        query: &QueryParams,
    ) -> Result<R, ApiError> {
        let request = self.build_request(method, path, body, query)?;
        self.send(&request)
    }
}

impl<T> fmt::Debug for ScaleboxClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScaleboxClient")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

fn parse_base_url(base_url: &str) -> Result<Url, ApiError> {
    let url =
        Url::parse(base_url).map_err(|e| ApiError::Configuration(format!("{base_url}: {e}")))?;
    if url.cannot_be_a_base() || url.host().is_none() {
        return Err(ApiError::Configuration(format!(
            "{base_url}: not an absolute URL"
        )));
    }
    Ok(url)
}
