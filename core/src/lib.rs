//! Blocking API client for the Scalebox sandbox service.
//!
//! # Overview
//! Creates, inspects, updates and tears down sandboxes over HTTP. Requests
//! and responses are plain data (`HttpRequest` / `HttpResponse`); a
//! `Transport` performs the round-trip, by default a `ureq::Agent`.
//!
//! # Design
//! - `ScaleboxClient` is stateless: base URL, API key and transport.
//! - Each endpoint has a `build_*` method (pure) and an executing method.
//! - Responses may arrive bare or wrapped in a `{success, data, ...}`
//!   envelope; errors may carry `error`, `message`, or neither. `envelope`
//!   normalises all of them into `Result<T, ApiError>`.
//! - DTOs are defined independently from the mock-server crate;
//!   integration tests catch schema drift.
//!
//! ```no_run
//! use scalebox_core::{CreateSandboxRequest, ScaleboxClient};
//!
//! let client = ScaleboxClient::new("https://api.scalebox.dev", "sk-...")?;
//! let sandbox = client.create_sandbox(&CreateSandboxRequest {
//!     name: "demo".to_string(),
//!     template: "base".to_string(),
//!     cpu_count: 2,
//!     memory_mb: 512,
//!     storage_gb: 10,
//!     ..Default::default()
//! })?;
//! println!("{} is {}", sandbox.sandbox_id, sandbox.status);
//! # Ok::<(), scalebox_core::ApiError>(())
//! ```

pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod http;
pub mod sandboxes;
pub mod types;

pub use client::{ScaleboxClient, API_KEY_HEADER};
pub use config::ClientConfig;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, QueryParams, Transport};
pub use types::{
    AccountOwner, ConnectSandboxRequest, CreateSandboxRequest, DeletionResponse,
    GetSandboxMetricsOptions, ListSandboxesOptions, LocalityRequest, MetricsDataPoint,
    ObjectStorageConfig, Owner, PauseSandboxRequest, PortConfig, Resources, ResumeSandboxRequest,
    Sandbox, SandboxListResponse, SandboxMetricsResponse, SandboxState, SandboxStatus,
    SandboxTimeoutRequest, TerminationResponse, UpdateSandboxRequest,
};
