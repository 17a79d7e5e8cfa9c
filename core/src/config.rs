//! Client configuration.
//!
//! Configuration is loaded from environment variables with sensible defaults.

use std::fmt;
use std::time::Duration;

use crate::http::DEFAULT_TIMEOUT;

pub const DEFAULT_BASE_URL: &str = "https://api.scalebox.dev";

/// Connection settings for `ScaleboxClient::from_config`.
#[derive(Clone)]
pub struct ClientConfig {
    /// Absolute base URL of the API.
    pub base_url: String,

    /// Sent as `X-API-KEY` on every request.
    pub api_key: String,

    /// Overall deadline for a single call.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `SCALEBOX_BASE_URL` | `https://api.scalebox.dev` |
    /// | `SCALEBOX_API_KEY` | empty |
    /// | `SCALEBOX_TIMEOUT_SECS` | `30` |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let default = Self::default();

        Self {
            base_url: lookup("SCALEBOX_BASE_URL")
                .filter(|v| !v.is_empty())
                .unwrap_or(default.base_url),
            api_key: lookup("SCALEBOX_API_KEY").unwrap_or(default.api_key),
            timeout: lookup("SCALEBOX_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(default.timeout),
        }
    }

    /// True when an API key has been provided.
    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &if self.has_api_key() { "<redacted>" } else { "" })
            .field("timeout", &self.timeout)
            .finish()
    }
}
