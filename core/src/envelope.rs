//! Response classification for the two body formats the service emits.
//!
//! # Design
//! The service is moving from a legacy flat format (`{"message": ...}` on
//! errors, bare documents on success) to a wrapped envelope
//! (`{"success", "data", "message", "error", "timestamp"}`). Both are
//! accepted. On success the envelope is tried first and is only honoured
//! when `success` is true and `data` is present; a bare document that
//! happens to carry those two fields is read as wrapped.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::http::HttpResponse;

/// The wrapped response format. Every field defaults when absent.
#[derive(Debug, Default, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// The legacy error body.
#[derive(Debug, Deserialize)]
struct LegacyError {
    #[serde(default)]
    message: Option<String>,
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.is_empty())
}

/// Map a non-2xx response to `ApiError::Api`. Returns `Ok(())` for 2xx.
pub fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    let status = response.status;
    if is_success(status) {
        return Ok(());
    }

    let message = match serde_json::from_str::<Envelope>(&response.body) {
        Ok(envelope) => non_empty(envelope.error).or_else(|| non_empty(envelope.message)),
        Err(_) => None,
    }
    .or_else(|| {
        serde_json::from_str::<LegacyError>(&response.body)
            .ok()
            .and_then(|legacy| non_empty(legacy.message))
    })
    .unwrap_or_else(|| {
        format!(
            "API request failed with status {status}: {}",
            response.body
        )
    });

    Err(ApiError::Api { status, message })
}

/// Classify the status, then decode the result document into `T`.
pub fn parse_response<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    check_status(response)?;

    if let Ok(Envelope {
        success: true,
        data: Some(data),
        ..
    }) = serde_json::from_str::<Envelope>(&response.body)
    {
        return serde_json::from_value(data).map_err(|e| ApiError::Decoding(e.to_string()));
    }

    serde_json::from_str(&response.body).map_err(|e| ApiError::Decoding(e.to_string()))
}
