//! Data shapes for the sandbox API.
//!
//! # Design
//! These types mirror the service schema but are defined independently
//! from the mock-server crate; integration tests catch schema drift.
//! Result shapes use container-level `#[serde(default)]` so that sparse
//! documents decode, and collections accept `null` as empty. Request
//! shapes skip absent, zero or empty optional fields so the server applies
//! its own defaults.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::http::QueryParams;

/// Lifecycle state of a sandbox.
///
/// States this client does not know are kept verbatim in `Other`, so they
/// survive a decode/encode cycle and can be used as list filters. A
/// missing, `null` or empty status decodes as `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum SandboxState {
    Starting,
    Running,
    Pausing,
    Paused,
    Terminated,
    Failed,
    #[default]
    Unknown,
    Other(String),
}

impl SandboxState {
    pub fn as_str(&self) -> &str {
        match self {
            SandboxState::Starting => "starting",
            SandboxState::Running => "running",
            SandboxState::Pausing => "pausing",
            SandboxState::Paused => "paused",
            SandboxState::Terminated => "terminated",
            SandboxState::Failed => "failed",
            SandboxState::Unknown => "unknown",
            SandboxState::Other(raw) => raw,
        }
    }
}

impl From<&str> for SandboxState {
    fn from(raw: &str) -> Self {
        match raw {
            "starting" => SandboxState::Starting,
            "running" => SandboxState::Running,
            "pausing" => SandboxState::Pausing,
            "paused" => SandboxState::Paused,
            "terminated" => SandboxState::Terminated,
            "failed" => SandboxState::Failed,
            "" | "unknown" => SandboxState::Unknown,
            other => SandboxState::Other(other.to_string()),
        }
    }
}

impl From<Option<String>> for SandboxState {
    fn from(raw: Option<String>) -> Self {
        raw.as_deref().map(SandboxState::from).unwrap_or_default()
    }
}

impl From<SandboxState> for String {
    fn from(state: SandboxState) -> Self {
        match state {
            SandboxState::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for SandboxState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decode `null` as the empty value. Go servers encode nil maps and
/// slices as `null`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn is_unset_u32(value: &Option<u32>) -> bool {
    matches!(value, None | Some(0))
}

fn is_unset_str(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// A sandbox instance as returned by the API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sandbox {
    pub sandbox_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub template_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_exists: Option<bool>,
    pub owner_user_id: String,
    pub project_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    pub cpu_count: u32,
    pub memory_mb: u32,
    pub storage_gb: u32,
    /// Lifetime in seconds.
    pub timeout: u32,
    pub auto_pause: bool,
    pub secure: bool,
    pub allow_internet_access: bool,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "HashMap::is_empty")]
    pub env_vars: HashMap<String, String>,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "HashMap::is_empty")]
    pub object_storage: HashMap<String, String>,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<PortConfig>,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub template_ports: Vec<PortConfig>,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub custom_ports: Vec<PortConfig>,
    pub status: SandboxState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub substatus: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sandbox_domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sandbox_domain_internal: Option<String>,
    pub web_terminal_available: bool,
    pub web_files_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub envd_access_token: Option<String>,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "HashMap::is_empty")]
    pub network_proxy: HashMap<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stopped_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paused_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pausing_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resumed_at: Option<DateTime<Utc>>,
    pub total_paused_seconds: i64,
    pub total_running_seconds: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_total_paused_seconds: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_total_running_seconds: Option<i64>,
    pub uptime: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistence_days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistence_expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistence_days_remaining: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<Owner>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_owner: Option<AccountOwner>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<Resources>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Owner {
    pub user_id: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountOwner {
    pub account_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Resources {
    pub cpu: u32,
    pub memory: u32,
    pub storage: u32,
    pub bandwidth: u32,
}

/// A port exposed by a sandbox, or requested on creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortConfig {
    pub port: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_port: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub is_protected: bool,
}

/// Lightweight status returned by `GET /v1/sandboxes/{id}/status`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxStatus {
    pub sandbox_id: String,
    pub status: SandboxState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub substatus: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxListResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub sandboxes: Vec<Sandbox>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeletionResponse {
    pub sandbox_id: String,
    pub status: String,
    pub note: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminationResponse {
    pub sandbox_id: String,
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxMetricsResponse {
    pub sandbox_id: String,
    pub timestamp: DateTime<Utc>,
    pub status: SandboxState,
    pub uptime_seconds: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub metrics: Vec<MetricsDataPoint>,
}

/// One sample. Sizes are in bytes, CPU usage in percent (0-100).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsDataPoint {
    pub timestamp: DateTime<Utc>,
    pub cpu_count: u32,
    pub cpu_used_pct: f64,
    pub disk_total: i64,
    pub disk_used: i64,
    pub mem_total: i64,
    pub mem_used: i64,
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Request payload for `POST /v1/sandboxes`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateSandboxRequest {
    pub name: String,
    pub description: String,
    /// Template name or ID; the server uses `base` when empty.
    pub template: String,
    #[serde(skip_serializing_if = "is_unset_str")]
    pub project_id: Option<String>,
    pub cpu_count: u32,
    pub memory_mb: u32,
    pub storage_gb: u32,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
    /// Seconds; the server default is 300. Zero is not sent.
    #[serde(skip_serializing_if = "is_unset_u32")]
    pub timeout: Option<u32>,
    /// When set, hitting the timeout pauses instead of terminating.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_pause: Option<bool>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env_vars: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_internet_access: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_storage: Option<ObjectStorageConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_ports: Vec<PortConfig>,
    /// Preferred proxy country (ISO code).
    #[serde(skip_serializing_if = "is_unset_str")]
    pub net_proxy_country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locality: Option<LocalityRequest>,
}

/// S3-compatible storage mounted into the sandbox.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectStorageConfig {
    /// `s3://bucket/object-path`
    pub uri: String,
    pub mount_point: String,
    pub access_key: String,
    pub secret_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

/// Scheduling preference. `region` takes precedence over `auto_detect`;
/// `force` fails creation instead of falling back to another region.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocalityRequest {
    pub auto_detect: bool,
    pub region: String,
    pub force: bool,
}

/// Extend the lifetime of a sandbox, counted from `started_at`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSandboxRequest {
    pub timeout: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SandboxTimeoutRequest {
    pub timeout: u32,
}

/// Connect to (and resume, if paused) a sandbox, optionally resetting its timeout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectSandboxRequest {
    #[serde(skip_serializing_if = "is_unset_u32")]
    pub timeout: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PauseSandboxRequest {}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResumeSandboxRequest {}

// ---------------------------------------------------------------------------
// Query options
// ---------------------------------------------------------------------------

/// Filters for `GET /v1/sandboxes`. Empty strings and zero limit/offset
/// are not sent.
#[derive(Debug, Clone, Default)]
pub struct ListSandboxesOptions {
    pub project_id: Option<String>,
    pub status: Option<SandboxState>,
    pub owner_user_id: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub limit: u32,
    pub offset: u32,
}

impl ListSandboxesOptions {
    pub fn to_query(&self) -> QueryParams {
        let mut query = QueryParams::new();
        let strings = [
            ("project_id", &self.project_id),
            ("owner_user_id", &self.owner_user_id),
            ("search", &self.search),
            ("sort_by", &self.sort_by),
            ("sort_order", &self.sort_order),
        ];
        for (key, value) in strings {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                query.insert(key.to_string(), value.to_string());
            }
        }
        if let Some(status) = self
            .status
            .as_ref()
            .filter(|s| **s != SandboxState::Unknown && !s.as_str().is_empty())
        {
            query.insert("status".to_string(), status.to_string());
        }
        if self.limit > 0 {
            query.insert("limit".to_string(), self.limit.to_string());
        }
        if self.offset > 0 {
            query.insert("offset".to_string(), self.offset.to_string());
        }
        query
    }
}

/// Window and resolution for `GET /v1/sandboxes/{id}/metrics`.
#[derive(Debug, Clone, Default)]
pub struct GetSandboxMetricsOptions {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    /// Sampling step in seconds.
    pub step: Option<u32>,
}

impl GetSandboxMetricsOptions {
    pub fn to_query(&self) -> QueryParams {
        let mut query = QueryParams::new();
        if let Some(start) = self.start {
            query.insert("start".to_string(), format_time(start));
        }
        if let Some(end) = self.end {
            query.insert("end".to_string(), format_time(end));
        }
        if let Some(step) = self.step {
            query.insert("step".to_string(), step.to_string());
        }
        query
    }
}

/// RFC 3339 in UTC with whole seconds, e.g. `2024-01-02T03:04:05Z`.
fn format_time(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}
