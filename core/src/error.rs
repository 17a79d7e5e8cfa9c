//! Error types for the sandbox API client.
//!
//! # Design
//! Every call either succeeds or fails with exactly one variant. `Api` is
//! the only variant that carries a server status; the helpers below let
//! callers branch on the common statuses without matching the enum.

/// Errors returned by `ScaleboxClient`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The configured base URL is not an absolute URL.
    #[error("invalid base URL: {0}")]
    Configuration(String),

    /// The request payload could not be serialized to JSON.
    #[error("failed to encode request body: {0}")]
    Encoding(String),

    /// The request never produced an HTTP response (DNS, connect, TLS,
    /// timeout, or a failed body read).
    #[error("request failed: {0}")]
    Network(String),

    /// The server answered with a non-2xx status.
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// A 2xx response body did not match the expected result shape.
    #[error("failed to parse response: {0}")]
    Decoding(String),
}

impl ApiError {
    /// The HTTP status of an `Api` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    pub fn is_forbidden(&self) -> bool {
        self.status() == Some(403)
    }
}
