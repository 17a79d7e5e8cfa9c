use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const DEFAULT_API_KEY: &str = "test-api-key";

/// Body format the server answers with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResponseFormat {
    /// `{"success": true, "data": ...}` / `{"success": false, "error": ...}`
    #[default]
    Wrapped,
    /// Bare documents / `{"message": ...}`
    Legacy,
}

impl ResponseFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "legacy" | "flat" => Self::Legacy,
            _ => Self::Wrapped,
        }
    }
}

#[derive(Clone, Debug)]
pub struct MockOptions {
    pub api_key: String,
    pub format: ResponseFormat,
}

impl Default for MockOptions {
    fn default() -> Self {
        Self {
            api_key: DEFAULT_API_KEY.to_string(),
            format: ResponseFormat::Wrapped,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Running,
    Paused,
    Terminated,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Running => "running",
            Status::Paused => "paused",
            Status::Terminated => "terminated",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Sandbox {
    pub sandbox_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub template_id: String,
    pub project_id: String,
    pub owner_user_id: String,
    pub cpu_count: u32,
    pub memory_mb: u32,
    pub storage_gb: u32,
    pub timeout: u32,
    pub auto_pause: bool,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paused_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct CreateSandbox {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub template: String,
    pub project_id: Option<String>,
    pub cpu_count: u32,
    pub memory_mb: u32,
    pub storage_gb: u32,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    pub timeout: Option<u32>,
    pub auto_pause: Option<bool>,
}

#[derive(Deserialize)]
pub struct TimeoutBody {
    pub timeout: u32,
}

#[derive(Deserialize)]
pub struct ConnectBody {
    pub timeout: Option<u32>,
}

#[derive(Deserialize, Default)]
pub struct ListQuery {
    pub project_id: Option<String>,
    pub status: Option<String>,
    pub owner_user_id: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Deserialize)]
pub struct ForceQuery {
    pub force: Option<bool>,
}

#[derive(Deserialize)]
pub struct MetricsQuery {
    pub start: Option<String>,
    pub end: Option<String>,
    pub step: Option<i64>,
}

type Db = Arc<RwLock<HashMap<String, Sandbox>>>;

#[derive(Clone)]
struct AppState {
    db: Db,
    options: Arc<MockOptions>,
}

const OWNER: &str = "user-mock";
const DEFAULT_PROJECT: &str = "proj-default";
const DEFAULT_TIMEOUT: u32 = 300;

pub fn app() -> Router {
    app_with(MockOptions::default())
}

pub fn app_with(options: MockOptions) -> Router {
    let state = AppState {
        db: Arc::new(RwLock::new(HashMap::new())),
        options: Arc::new(options),
    };
    Router::new()
        .route("/v1/sandboxes", get(list_sandboxes).post(create_sandbox))
        .route(
            "/v1/sandboxes/{id}",
            get(get_sandbox).put(update_sandbox).delete(delete_sandbox),
        )
        .route("/v1/sandboxes/{id}/status", get(get_status))
        .route("/v1/sandboxes/{id}/terminate", post(terminate_sandbox))
        .route("/v1/sandboxes/{id}/pause", post(pause_sandbox))
        .route("/v1/sandboxes/{id}/resume", post(resume_sandbox))
        .route("/v1/sandboxes/{id}/connect", post(connect_sandbox))
        .route("/v1/sandboxes/{id}/timeout", post(set_timeout))
        .route("/v1/sandboxes/{id}/metrics", get(get_metrics))
        .layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .with_state(state)
}

pub async fn run_with(listener: TcpListener, options: MockOptions) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(options)).await
}

// --- envelope ---

fn reply<T: Serialize>(format: ResponseFormat, status: StatusCode, data: T) -> Response {
    let body = match format {
        ResponseFormat::Wrapped => json!({
            "success": true,
            "data": data,
            "timestamp": Utc::now(),
        }),
        ResponseFormat::Legacy => json!(data),
    };
    (status, Json(body)).into_response()
}

fn reject(format: ResponseFormat, status: StatusCode, message: &str) -> Response {
    let body = match format {
        ResponseFormat::Wrapped => json!({
            "success": false,
            "error": message,
            "timestamp": Utc::now(),
        }),
        ResponseFormat::Legacy => json!({ "message": message }),
    };
    (status, Json(body)).into_response()
}

fn not_found(format: ResponseFormat) -> Response {
    reject(format, StatusCode::NOT_FOUND, "sandbox not found")
}

async fn require_api_key(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let authorized = request
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|key| key == state.options.api_key);
    if !authorized {
        return reject(state.options.format, StatusCode::UNAUTHORIZED, "invalid api key");
    }
    next.run(request).await
}

// --- handlers ---

async fn create_sandbox(State(state): State<AppState>, Json(input): Json<CreateSandbox>) -> Response {
    let format = state.options.format;
    if input.cpu_count == 0 || input.memory_mb == 0 {
        return reject(
            format,
            StatusCode::BAD_REQUEST,
            "cpu_count and memory_mb must be positive",
        );
    }

    let now = Utc::now();
    let template = if input.template.is_empty() {
        "base".to_string()
    } else {
        input.template
    };
    let sandbox = Sandbox {
        sandbox_id: format!("sbx-{}", Uuid::new_v4().simple()),
        name: input.name,
        description: Some(input.description).filter(|d| !d.is_empty()),
        template_id: template,
        project_id: input
            .project_id
            .unwrap_or_else(|| DEFAULT_PROJECT.to_string()),
        owner_user_id: OWNER.to_string(),
        cpu_count: input.cpu_count,
        memory_mb: input.memory_mb,
        storage_gb: input.storage_gb,
        timeout: input.timeout.unwrap_or(DEFAULT_TIMEOUT),
        auto_pause: input.auto_pause.unwrap_or(false),
        metadata: input.metadata,
        status: Status::Running,
        created_at: now,
        updated_at: now,
        started_at: Some(now),
        paused_at: None,
        ended_at: None,
    };
    tracing::info!(sandbox_id = %sandbox.sandbox_id, "created sandbox");
    state
        .db
        .write()
        .await
        .insert(sandbox.sandbox_id.clone(), sandbox.clone());
    reply(format, StatusCode::CREATED, sandbox)
}

async fn list_sandboxes(State(state): State<AppState>, Query(query): Query<ListQuery>) -> Response {
    let db = state.db.read().await;
    let mut sandboxes: Vec<Sandbox> = db
        .values()
        .filter(|s| query.project_id.as_ref().map_or(true, |p| &s.project_id == p))
        .filter(|s| query.owner_user_id.as_ref().map_or(true, |o| &s.owner_user_id == o))
        .filter(|s| query.status.as_deref().map_or(true, |st| s.status.as_str() == st))
        .filter(|s| {
            query
                .search
                .as_ref()
                .map_or(true, |q| s.name.to_lowercase().contains(&q.to_lowercase()))
        })
        .cloned()
        .collect();

    match query.sort_by.as_deref() {
        Some("name") => sandboxes.sort_by(|a, b| a.name.cmp(&b.name)),
        _ => sandboxes.sort_by_key(|s| s.created_at),
    }
    if query.sort_order.as_deref() != Some("asc") {
        sandboxes.reverse();
    }

    let sandboxes: Vec<Sandbox> = sandboxes
        .into_iter()
        .skip(query.offset.unwrap_or(0))
        .take(query.limit.unwrap_or(usize::MAX))
        .collect();
    reply(
        state.options.format,
        StatusCode::OK,
        json!({ "sandboxes": sandboxes }),
    )
}

async fn get_sandbox(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let format = state.options.format;
    match state.db.read().await.get(&id) {
        Some(sandbox) => reply(format, StatusCode::OK, sandbox),
        None => not_found(format),
    }
}

async fn get_status(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let format = state.options.format;
    match state.db.read().await.get(&id) {
        Some(s) => reply(
            format,
            StatusCode::OK,
            json!({
                "sandbox_id": s.sandbox_id,
                "status": s.status,
                "updated_at": s.updated_at,
            }),
        ),
        None => not_found(format),
    }
}

async fn update_sandbox(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<TimeoutBody>,
) -> Response {
    let format = state.options.format;
    let mut db = state.db.write().await;
    let Some(sandbox) = db.get_mut(&id) else {
        return not_found(format);
    };
    if input.timeout <= sandbox.timeout {
        return reject(
            format,
            StatusCode::BAD_REQUEST,
            "timeout must be greater than the current timeout",
        );
    }
    sandbox.timeout = input.timeout;
    sandbox.updated_at = Utc::now();
    reply(format, StatusCode::OK, &*sandbox)
}

async fn delete_sandbox(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ForceQuery>,
) -> Response {
    let format = state.options.format;
    let Some(sandbox) = state.db.write().await.remove(&id) else {
        return not_found(format);
    };
    let note = if query.force == Some(false) {
        "graceful shutdown requested"
    } else {
        "sandbox deleted"
    };
    tracing::info!(sandbox_id = %sandbox.sandbox_id, note, "deleted sandbox");
    reply(
        format,
        StatusCode::OK,
        json!({ "sandbox_id": sandbox.sandbox_id, "status": "deleted", "note": note }),
    )
}

async fn terminate_sandbox(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ForceQuery>,
) -> Response {
    let format = state.options.format;
    let mut db = state.db.write().await;
    let Some(sandbox) = db.get_mut(&id) else {
        return not_found(format);
    };
    let now = Utc::now();
    sandbox.status = Status::Terminated;
    sandbox.ended_at = Some(now);
    sandbox.updated_at = now;
    tracing::info!(sandbox_id = %sandbox.sandbox_id, force = query.force.unwrap_or(false), "terminated sandbox");
    reply(
        format,
        StatusCode::OK,
        json!({ "sandbox_id": sandbox.sandbox_id, "status": sandbox.status }),
    )
}

async fn pause_sandbox(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    transition(&state, &id, Status::Running, Status::Paused).await
}

async fn resume_sandbox(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    transition(&state, &id, Status::Paused, Status::Running).await
}

async fn transition(state: &AppState, id: &str, from: Status, to: Status) -> Response {
    let format = state.options.format;
    let mut db = state.db.write().await;
    let Some(sandbox) = db.get_mut(id) else {
        return not_found(format);
    };
    if sandbox.status != from {
        return reject(
            format,
            StatusCode::CONFLICT,
            &format!("sandbox is {}", sandbox.status.as_str()),
        );
    }
    let now = Utc::now();
    sandbox.status = to;
    sandbox.updated_at = now;
    sandbox.paused_at = (to == Status::Paused).then_some(now);
    reply(format, StatusCode::OK, &*sandbox)
}

async fn connect_sandbox(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<ConnectBody>,
) -> Response {
    let format = state.options.format;
    let mut db = state.db.write().await;
    let Some(sandbox) = db.get_mut(&id) else {
        return not_found(format);
    };
    if sandbox.status == Status::Terminated {
        return reject(format, StatusCode::CONFLICT, "sandbox is terminated");
    }
    sandbox.status = Status::Running;
    sandbox.paused_at = None;
    if let Some(timeout) = input.timeout {
        sandbox.timeout = timeout;
    }
    sandbox.updated_at = Utc::now();
    reply(format, StatusCode::OK, &*sandbox)
}

async fn set_timeout(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<TimeoutBody>,
) -> Response {
    let format = state.options.format;
    let mut db = state.db.write().await;
    let Some(sandbox) = db.get_mut(&id) else {
        return not_found(format);
    };
    if input.timeout == 0 {
        return reject(format, StatusCode::BAD_REQUEST, "timeout must be positive");
    }
    sandbox.timeout = input.timeout;
    sandbox.updated_at = Utc::now();
    reply(format, StatusCode::OK, &*sandbox)
}

async fn get_metrics(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<MetricsQuery>,
) -> Response {
    let format = state.options.format;
    let db = state.db.read().await;
    let Some(sandbox) = db.get(&id) else {
        return not_found(format);
    };

    let parse = |raw: &Option<String>| -> Result<Option<DateTime<Utc>>, ()> {
        raw.as_deref()
            .map(|s| DateTime::parse_from_rfc3339(s).map(|t| t.with_timezone(&Utc)))
            .transpose()
            .map_err(|_| ())
    };
    let (Ok(start), Ok(end)) = (parse(&query.start), parse(&query.end)) else {
        return reject(format, StatusCode::BAD_REQUEST, "invalid time format");
    };
    let step = query.step.unwrap_or(60);
    if step <= 0 {
        return reject(format, StatusCode::BAD_REQUEST, "step must be positive");
    }

    let now = Utc::now();
    let start = start.unwrap_or(sandbox.created_at);
    let end = end.unwrap_or(now);
    let metrics: Vec<_> = (0..3)
        .map(|i| start + Duration::seconds(step * i))
        .filter(|t| *t <= end)
        .map(|timestamp| {
            json!({
                "timestamp": timestamp,
                "cpu_count": sandbox.cpu_count,
                "cpu_used_pct": 12.5,
                "disk_total": u64::from(sandbox.storage_gb) << 30,
                "disk_used": 1u64 << 20,
                "mem_total": u64::from(sandbox.memory_mb) << 20,
                "mem_used": u64::from(sandbox.memory_mb) << 19,
            })
        })
        .collect();

    reply(
        format,
        StatusCode::OK,
        json!({
            "sandbox_id": sandbox.sandbox_id,
            "timestamp": now,
            "status": sandbox.status,
            "uptime_seconds": (now - sandbox.created_at).num_seconds(),
            "metrics": metrics,
        }),
    )
}
