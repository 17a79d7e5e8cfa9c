//! Sandbox endpoints.
//!
//! Each endpoint has a pure `build_*` method producing the `HttpRequest`
//! and an executing method that sends it and decodes the result.
//! Sandbox identifiers are substituted into paths as given.

use crate::client::{ScaleboxClient, NO_BODY};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, QueryParams, Transport};
use crate::types::{
    ConnectSandboxRequest, CreateSandboxRequest, DeletionResponse, GetSandboxMetricsOptions,
    ListSandboxesOptions, PauseSandboxRequest, ResumeSandboxRequest, Sandbox,
    SandboxListResponse, SandboxMetricsResponse, SandboxStatus, SandboxTimeoutRequest,
    TerminationResponse, UpdateSandboxRequest,
};

const SANDBOXES: &str = "/v1/sandboxes";

fn sandbox_path(sandbox_id: &str) -> String {
    format!("{SANDBOXES}/{sandbox_id}")
}

fn action_path(sandbox_id: &str, action: &str) -> String {
    format!("{SANDBOXES}/{sandbox_id}/{action}")
}

fn force_query(value: &str) -> QueryParams {
    QueryParams::from([("force".to_string(), value.to_string())])
}

impl<T: Transport> ScaleboxClient<T> {
    // -----------------------------------------------------------------------
    // Build
    // -----------------------------------------------------------------------

    pub fn build_create_sandbox(&self, input: &CreateSandboxRequest) -> Result<HttpRequest, ApiError> {
        self.build_request(HttpMethod::Post, SANDBOXES, Some(input), &QueryParams::new())
    }

    pub fn build_list_sandboxes(
        &self,
        opts: Option<&ListSandboxesOptions>,
    ) -> Result<HttpRequest, ApiError> {
        let query = opts.map(ListSandboxesOptions::to_query).unwrap_or_default();
        self.build_request(HttpMethod::Get, SANDBOXES, NO_BODY, &query)
    }

    pub fn build_get_sandbox(&self, sandbox_id: &str) -> Result<HttpRequest, ApiError> {
        self.build_request(HttpMethod::Get, &sandbox_path(sandbox_id), NO_BODY, &QueryParams::new())
    }

    pub fn build_get_sandbox_status(&self, sandbox_id: &str) -> Result<HttpRequest, ApiError> {
        self.build_request(
            HttpMethod::Get,
            &action_path(sandbox_id, "status"),
            NO_BODY,
            &QueryParams::new(),
        )
    }

    pub fn build_update_sandbox(
        &self,
        sandbox_id: &str,
        input: &UpdateSandboxRequest,
    ) -> Result<HttpRequest, ApiError> {
        self.build_request(HttpMethod::Put, &sandbox_path(sandbox_id), Some(input), &QueryParams::new())
    }

    /// `force = Some(false)` asks the server for a graceful delete; any
    /// other value leaves the server default in place.
    pub fn build_delete_sandbox(
        &self,
        sandbox_id: &str,
        force: Option<bool>,
    ) -> Result<HttpRequest, ApiError> {
        let query = match force {
            Some(false) => force_query("false"),
            _ => QueryParams::new(),
        };
        self.build_request(HttpMethod::Delete, &sandbox_path(sandbox_id), NO_BODY, &query)
    }

    /// `force = Some(true)` skips graceful shutdown.
    pub fn build_terminate_sandbox(
        &self,
        sandbox_id: &str,
        force: Option<bool>,
    ) -> Result<HttpRequest, ApiError> {
        let query = match force {
            Some(true) => force_query("true"),
            _ => QueryParams::new(),
        };
        self.build_request(
            HttpMethod::Post,
            &action_path(sandbox_id, "terminate"),
            NO_BODY,
            &query,
        )
    }

    pub fn build_pause_sandbox(&self, sandbox_id: &str) -> Result<HttpRequest, ApiError> {
        self.build_request(
            HttpMethod::Post,
            &action_path(sandbox_id, "pause"),
            Some(&PauseSandboxRequest {}),
            &QueryParams::new(),
        )
    }

    pub fn build_resume_sandbox(&self, sandbox_id: &str) -> Result<HttpRequest, ApiError> {
        self.build_request(
            HttpMethod::Post,
            &action_path(sandbox_id, "resume"),
            Some(&ResumeSandboxRequest {}),
            &QueryParams::new(),
        )
    }

    pub fn build_connect_sandbox(
        &self,
        sandbox_id: &str,
        input: Option<&ConnectSandboxRequest>,
    ) -> Result<HttpRequest, ApiError> {
        let default = ConnectSandboxRequest::default();
        self.build_request(
            HttpMethod::Post,
            &action_path(sandbox_id, "connect"),
            Some(input.unwrap_or(&default)),
            &QueryParams::new(),
        )
    }

    pub fn build_set_sandbox_timeout(
        &self,
        sandbox_id: &str,
        input: &SandboxTimeoutRequest,
    ) -> Result<HttpRequest, ApiError> {
        self.build_request(
            HttpMethod::Post,
            &action_path(sandbox_id, "timeout"),
            Some(input),
            &QueryParams::new(),
        )
    }

    pub fn build_get_sandbox_metrics(
        &self,
        sandbox_id: &str,
        opts: Option<&GetSandboxMetricsOptions>,
    ) -> Result<HttpRequest, ApiError> {
        let query = opts
            .map(GetSandboxMetricsOptions::to_query)
            .unwrap_or_default();
        self.build_request(
            HttpMethod::Get,
            &action_path(sandbox_id, "metrics"),
            NO_BODY,
            &query,
        )
    }

    // -----------------------------------------------------------------------
    // Execute
    // -----------------------------------------------------------------------

    pub fn create_sandbox(&self, input: &CreateSandboxRequest) -> Result<Sandbox, ApiError> {
        self.send(&self.build_create_sandbox(input)?)
    }

    pub fn list_sandboxes(
        &self,
        opts: Option<&ListSandboxesOptions>,
    ) -> Result<SandboxListResponse, ApiError> {
        self.send(&self.build_list_sandboxes(opts)?)
    }

    pub fn get_sandbox(&self, sandbox_id: &str) -> Result<Sandbox, ApiError> {
        self.send(&self.build_get_sandbox(sandbox_id)?)
    }

    pub fn get_sandbox_status(&self, sandbox_id: &str) -> Result<SandboxStatus, ApiError> {
        self.send(&self.build_get_sandbox_status(sandbox_id)?)
    }

    pub fn update_sandbox(
        &self,
        sandbox_id: &str,
        input: &UpdateSandboxRequest,
    ) -> Result<Sandbox, ApiError> {
        self.send(&self.build_update_sandbox(sandbox_id, input)?)
    }

    pub fn delete_sandbox(
        &self,
        sandbox_id: &str,
        force: Option<bool>,
    ) -> Result<DeletionResponse, ApiError> {
        self.send(&self.build_delete_sandbox(sandbox_id, force)?)
    }

    pub fn terminate_sandbox(
        &self,
        sandbox_id: &str,
        force: Option<bool>,
    ) -> Result<TerminationResponse, ApiError> {
        self.send(&self.build_terminate_sandbox(sandbox_id, force)?)
    }

    pub fn pause_sandbox(&self, sandbox_id: &str) -> Result<Sandbox, ApiError> {
        self.send(&self.build_pause_sandbox(sandbox_id)?)
    }

    pub fn resume_sandbox(&self, sandbox_id: &str) -> Result<Sandbox, ApiError> {
        self.send(&self.build_resume_sandbox(sandbox_id)?)
    }

    /// Connect to a sandbox, resuming it first if it is paused.
    pub fn connect_sandbox(
        &self,
        sandbox_id: &str,
        input: Option<&ConnectSandboxRequest>,
    ) -> Result<Sandbox, ApiError> {
        self.send(&self.build_connect_sandbox(sandbox_id, input)?)
    }

    pub fn set_sandbox_timeout(
        &self,
        sandbox_id: &str,
        input: &SandboxTimeoutRequest,
    ) -> Result<Sandbox, ApiError> {
        self.send(&self.build_set_sandbox_timeout(sandbox_id, input)?)
    }

    pub fn get_sandbox_metrics(
        &self,
        sandbox_id: &str,
        opts: Option<&GetSandboxMetricsOptions>,
    ) -> Result<SandboxMetricsResponse, ApiError> {
        self.send(&self.build_get_sandbox_metrics(sandbox_id, opts)?)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::types::SandboxState;

    fn client() -> ScaleboxClient {
        ScaleboxClient::new("http://localhost:3000", "test-key").unwrap()
    }

    fn body(req: &HttpRequest) -> serde_json::Value {
        serde_json::from_str(req.body.as_deref().unwrap()).unwrap()
    }

    #[test]
    fn build_create_sandbox_produces_correct_request() {
        let input = CreateSandboxRequest {
            name: "demo".to_string(),
            template: "base".to_string(),
            cpu_count: 2,
            memory_mb: 512,
            storage_gb: 10,
            timeout: Some(300),
            ..Default::default()
        };
        let req = client().build_create_sandbox(&input).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:3000/v1/sandboxes");
        assert_eq!(req.header("x-api-key"), Some("test-key"));
        let body = body(&req);
        assert_eq!(body["name"], "demo");
        assert_eq!(body["timeout"], 300);
    }

    #[test]
    fn build_list_sandboxes_without_options() {
        let req = client().build_list_sandboxes(None).unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:3000/v1/sandboxes");
        assert!(req.body.is_none());
    }

    #[test]
    fn build_list_sandboxes_with_filters() {
        let opts = ListSandboxesOptions {
            status: Some(SandboxState::Running),
            project_id: Some("p-1".to_string()),
            sort_by: Some("created_at".to_string()),
            sort_order: Some("desc".to_string()),
            limit: 20,
            offset: 40,
            ..Default::default()
        };
        let req = client().build_list_sandboxes(Some(&opts)).unwrap();
        assert_eq!(
            req.url,
            "http://localhost:3000/v1/sandboxes?limit=20&offset=40&project_id=p-1&sort_by=created_at&sort_order=desc&status=running"
        );
    }

    #[test]
    fn build_get_and_status() {
        let req = client().build_get_sandbox("sbx-1").unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:3000/v1/sandboxes/sbx-1");

        let req = client().build_get_sandbox_status("sbx-1").unwrap();
        assert_eq!(req.url, "http://localhost:3000/v1/sandboxes/sbx-1/status");
    }

    #[test]
    fn build_update_sandbox_uses_put() {
        let req = client()
            .build_update_sandbox("sbx-1", &UpdateSandboxRequest { timeout: 900 })
            .unwrap();
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.url, "http://localhost:3000/v1/sandboxes/sbx-1");
        assert_eq!(body(&req), serde_json::json!({"timeout": 900}));
    }

    #[test]
    fn delete_sends_force_only_when_false() {
        let url = |force| client().build_delete_sandbox("sbx-1", force).unwrap().url;
        assert_eq!(url(None), "http://localhost:3000/v1/sandboxes/sbx-1");
        assert_eq!(url(Some(true)), "http://localhost:3000/v1/sandboxes/sbx-1");
        assert_eq!(
            url(Some(false)),
            "http://localhost:3000/v1/sandboxes/sbx-1?force=false"
        );
        let req = client().build_delete_sandbox("sbx-1", None).unwrap();
        assert_eq!(req.method, HttpMethod::Delete);
        assert!(req.body.is_none());
    }

    #[test]
    fn terminate_sends_force_only_when_true() {
        let url = |force| client().build_terminate_sandbox("sbx-1", force).unwrap().url;
        assert_eq!(url(None), "http://localhost:3000/v1/sandboxes/sbx-1/terminate");
        assert_eq!(url(Some(false)), "http://localhost:3000/v1/sandboxes/sbx-1/terminate");
        assert_eq!(
            url(Some(true)),
            "http://localhost:3000/v1/sandboxes/sbx-1/terminate?force=true"
        );
        let req = client().build_terminate_sandbox("sbx-1", None).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert!(req.body.is_none());
    }

    #[test]
    fn pause_and_resume_send_empty_objects() {
        let req = client().build_pause_sandbox("sbx-1").unwrap();
        assert_eq!(req.url, "http://localhost:3000/v1/sandboxes/sbx-1/pause");
        assert_eq!(req.body.as_deref(), Some("{}"));

        let req = client().build_resume_sandbox("sbx-1").unwrap();
        assert_eq!(req.url, "http://localhost:3000/v1/sandboxes/sbx-1/resume");
        assert_eq!(req.body.as_deref(), Some("{}"));
    }

    #[test]
    fn connect_defaults_to_empty_request() {
        let req = client().build_connect_sandbox("sbx-1", None).unwrap();
        assert_eq!(req.url, "http://localhost:3000/v1/sandboxes/sbx-1/connect");
        assert_eq!(req.body.as_deref(), Some("{}"));

        let input = ConnectSandboxRequest { timeout: Some(120) };
        let req = client().build_connect_sandbox("sbx-1", Some(&input)).unwrap();
        assert_eq!(body(&req), serde_json::json!({"timeout": 120}));
    }

    #[test]
    fn build_set_timeout() {
        let req = client()
            .build_set_sandbox_timeout("sbx-1", &SandboxTimeoutRequest { timeout: 600 })
            .unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:3000/v1/sandboxes/sbx-1/timeout");
        assert_eq!(body(&req), serde_json::json!({"timeout": 600}));
    }

    #[test]
    fn build_metrics_with_window() {
        let opts = GetSandboxMetricsOptions {
            start: Some(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()),
            end: None,
            step: Some(15),
        };
        let req = client().build_get_sandbox_metrics("sbx-1", Some(&opts)).unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(
            req.url,
            "http://localhost:3000/v1/sandboxes/sbx-1/metrics?start=2024-01-02T03%3A04%3A05Z&step=15"
        );

        let req = client().build_get_sandbox_metrics("sbx-1", None).unwrap();
        assert_eq!(req.url, "http://localhost:3000/v1/sandboxes/sbx-1/metrics");
    }
}
