//! HTTP API handlers.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::Json;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use serde_json::{json, Value};

use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::health::HealthRegistry;
use crate::metrics;
use crate::storage::{FileEntry, Storage};
use crate::utils;

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Immutable startup configuration.
    pub config: Arc<Config>,
    /// Dependency probes consulted by /health and /ready.
    pub health: Arc<HealthRegistry>,
    /// Counter and payload files (storage profile).
    pub storage: Arc<Storage>,
    /// Recorder handle rendered by /metrics.
    pub prometheus: PrometheusHandle,
    /// Process start, for uptime reporting.
    pub started: Instant,
}

impl AppState {
    /// Create new app state.
    pub fn new(config: Config, health: HealthRegistry, prometheus: PrometheusHandle) -> Self {
        let storage = Arc::new(Storage::new(config.data_dir.clone()));
        Self {
            config: Arc::new(config),
            health: Arc::new(health),
            storage,
            prometheus,
            started: Instant::now(),
        }
    }
}

/// Application info returned by the root route.
#[derive(Debug, Serialize)]
pub struct InfoResponse {
    /// Service name.
    pub application: String,
    /// Application version.
    pub version: String,
    /// Build metadata.
    pub build: BuildSummary,
    /// Deployment environment label.
    pub environment: String,
    /// Hostname of the serving machine.
    pub hostname: String,
    /// Response time, RFC 3339.
    pub timestamp: String,
}

/// Build metadata in the root response.
#[derive(Debug, Serialize)]
pub struct BuildSummary {
    /// CI build number.
    pub number: String,
    /// CI build identifier.
    pub id: String,
    /// Abbreviated VCS commit.
    pub commit: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "healthy" or "unhealthy".
    pub status: &'static str,
    /// Service name.
    pub service: String,
    /// Application version.
    pub version: String,
    /// Time since process start.
    pub uptime: String,
    /// Individual check outcomes.
    pub checks: BTreeMap<String, bool>,
}

/// Readiness check response.
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    /// Whether the service can accept traffic.
    pub ready: bool,
    /// Individual check outcomes.
    pub checks: BTreeMap<String, bool>,
}

/// Filtered environment dump.
#[derive(Debug, Serialize)]
pub struct EnvResponse {
    /// Variables that passed the sensitivity filter.
    pub environment_variables: BTreeMap<String, String>,
    /// Total variables in the process environment.
    pub total_vars: usize,
    /// Number of variables removed by the filter.
    pub filtered_vars: usize,
}

/// Echoed request body plus receipt metadata.
#[derive(Debug, Serialize)]
pub struct EchoResponse {
    /// The request body, reflected unchanged.
    pub echo: Value,
    /// Receipt time, RFC 3339.
    pub received_at: String,
    /// Hostname that handled the request.
    pub processed_by: String,
}

/// Build-time information.
#[derive(Debug, Serialize)]
pub struct BuildInfoResponse {
    /// Image build metadata.
    pub build: BuildDetails,
    /// Runtime host details.
    pub runtime: RuntimeDetails,
}

/// Image build metadata.
#[derive(Debug, Serialize)]
pub struct BuildDetails {
    /// Application version.
    pub version: String,
    /// Image build date.
    pub date: String,
    /// Full VCS commit.
    pub commit: String,
    /// Base image the container was built from.
    pub base_image: String,
}

/// Runtime host details.
#[derive(Debug, Serialize)]
pub struct RuntimeDetails {
    /// Hostname of the serving machine.
    pub hostname: String,
    /// Operating system.
    pub os: &'static str,
    /// CPU architecture.
    pub arch: &'static str,
}

/// API status response.
#[derive(Debug, Serialize)]
pub struct ApiStatusResponse {
    /// API version label.
    pub api_version: &'static str,
    /// Service status.
    pub status: &'static str,
    /// Routes mounted for the active profile.
    pub endpoints: Vec<EndpointInfo>,
}

/// One route in the API status catalog.
#[derive(Debug, Serialize)]
pub struct EndpointInfo {
    /// Route path.
    pub path: &'static str,
    /// HTTP method.
    pub method: &'static str,
    /// Short description.
    pub description: &'static str,
}

/// Persistent counter response.
#[derive(Debug, Serialize)]
pub struct CounterResponse {
    /// New counter value.
    pub count: u64,
    /// Visit message.
    pub message: String,
    /// Always true; the counter lives on the mounted volume.
    pub persistent: bool,
    /// Data directory holding the counter file.
    pub data_dir: String,
}

/// Write-route response.
#[derive(Debug, Serialize)]
pub struct WriteResponse {
    /// "success".
    pub status: &'static str,
    /// Path of the written file.
    pub file: String,
    /// The payload that was written.
    pub data: Value,
}

/// Read-route response.
#[derive(Debug, Serialize)]
pub struct ReadResponse {
    /// Payload files in the data directory.
    pub files: Vec<FileEntry>,
    /// Number of files.
    pub total: usize,
    /// The data directory that was listed.
    pub directory: String,
}

/// Key-name markers that keep a variable out of the /env dump.
const SENSITIVE_MARKERS: [&str; 4] = ["SECRET", "PASSWORD", "KEY", "TOKEN"];

fn is_sensitive(key: &str) -> bool {
    let upper = key.to_uppercase();
    SENSITIVE_MARKERS.iter().any(|marker| upper.contains(marker))
}

/// Lenient JSON body parse: empty is `None`, malformed JSON is a 400.
fn parse_body(body: &Bytes) -> Result<Option<Value>> {
    if body.is_empty() {
        return Ok(None);
    }

    serde_json::from_slice(body)
        .map(Some)
        .map_err(|e| ApiError::BadRequest(e.to_string()))
}

/// Root handler - application and build information, always 200.
pub async fn info(State(state): State<AppState>) -> Result<Json<InfoResponse>> {
    let config = &state.config;

    Ok(Json(InfoResponse {
        application: config.app_name.clone(),
        version: config.app_version.clone(),
        build: BuildSummary {
            number: config.build_number.clone(),
            id: config.build_id.clone(),
            commit: config.short_commit(),
        },
        environment: config.environment_label().to_string(),
        hostname: utils::hostname(),
        timestamp: utils::rfc3339_now()?,
    }))
}

/// Health check handler - 200 if every check passes, 503 otherwise.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let mut checks = state.health.results();
    checks.insert("app".to_string(), true);

    let healthy = checks.values().all(|&ok| ok);
    let body = HealthResponse {
        status: if healthy { "healthy" } else { "unhealthy" },
        service: state.config.app_name.clone(),
        version: state.config.app_version.clone(),
        uptime: utils::format_uptime(state.started.elapsed()),
        checks,
    };

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

/// Readiness handler - 200 if every check passes, 503 otherwise.
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let mut checks = BTreeMap::new();
    checks.insert("initialized".to_string(), true);
    for (name, healthy) in state.health.results() {
        checks.insert(format!("{name}_connected"), healthy);
    }

    let is_ready = checks.values().all(|&ok| ok);
    let body = ReadyResponse {
        ready: is_ready,
        checks,
    };

    let status = if is_ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

/// Prometheus exposition, rendered from the installed recorder.
pub async fn prometheus_metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(
            header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        state.prometheus.render(),
    )
}

/// Environment dump with sensitive keys removed.
pub async fn env_vars() -> Json<EnvResponse> {
    let mut environment_variables = BTreeMap::new();
    let mut total_vars = 0usize;

    for (key, value) in std::env::vars() {
        total_vars += 1;
        if !is_sensitive(&key) {
            environment_variables.insert(key, value);
        }
    }

    let filtered_vars = total_vars - environment_variables.len();
    Json(EnvResponse {
        environment_variables,
        total_vars,
        filtered_vars,
    })
}

/// Build-info handler.
pub async fn build_info(State(state): State<AppState>) -> Json<BuildInfoResponse> {
    let config = &state.config;

    Json(BuildInfoResponse {
        build: BuildDetails {
            version: config.app_version.clone(),
            date: config.build_date.clone(),
            commit: config.commit().to_string(),
            base_image: config.base_image.clone(),
        },
        runtime: RuntimeDetails {
            hostname: utils::hostname(),
            os: std::env::consts::OS,
            arch: std::env::consts::ARCH,
        },
    })
}

/// API status handler - catalog of the routes mounted for this profile.
pub async fn api_status(State(state): State<AppState>) -> Json<ApiStatusResponse> {
    let mut endpoints = vec![
        EndpointInfo {
            path: "/",
            method: "GET",
            description: "Application info",
        },
        EndpointInfo {
            path: "/health",
            method: "GET",
            description: "Health check",
        },
        EndpointInfo {
            path: "/ready",
            method: "GET",
            description: "Readiness probe",
        },
        EndpointInfo {
            path: "/metrics",
            method: "GET",
            description: "Prometheus metrics",
        },
        EndpointInfo {
            path: "/env",
            method: "GET",
            description: "Filtered environment variables",
        },
        EndpointInfo {
            path: "/build-info",
            method: "GET",
            description: "Build-time information",
        },
        EndpointInfo {
            path: "/api/v1/status",
            method: "GET",
            description: "API status",
        },
        EndpointInfo {
            path: "/echo",
            method: "POST",
            description: "Echo service",
        },
        EndpointInfo {
            path: "/api/v1/echo",
            method: "POST",
            description: "Echo service",
        },
    ];

    if state.config.service_profile.storage_enabled() {
        endpoints.extend([
            EndpointInfo {
                path: "/counter",
                method: "GET",
                description: "Persistent visit counter",
            },
            EndpointInfo {
                path: "/write",
                method: "POST",
                description: "Write payload to the data volume",
            },
            EndpointInfo {
                path: "/read",
                method: "GET",
                description: "List written payload files",
            },
        ]);
    }

    Json(ApiStatusResponse {
        api_version: "v1",
        status: "operational",
        endpoints,
    })
}

/// Echo handler - reflects the JSON body. An empty body echoes `{}`.
pub async fn echo(body: Bytes) -> Result<Json<EchoResponse>> {
    let echo = parse_body(&body)?.unwrap_or_else(|| Value::Object(Default::default()));

    Ok(Json(EchoResponse {
        echo,
        received_at: utils::rfc3339_now()?,
        processed_by: utils::hostname(),
    }))
}

/// Counter handler - read-increment-write on the persistent counter.
pub async fn counter(State(state): State<AppState>) -> Result<Json<CounterResponse>> {
    let count = state.storage.increment_counter().await?;
    metrics::inc_counter_hits();

    Ok(Json(CounterResponse {
        count,
        message: format!("This page has been visited {count} times"),
        persistent: true,
        data_dir: state.storage.data_dir().display().to_string(),
    }))
}

/// Write handler - persist the JSON body to a timestamp-named file.
pub async fn write(State(state): State<AppState>, body: Bytes) -> Result<Json<WriteResponse>> {
    let data = parse_body(&body)?.unwrap_or_else(|| json!({"message": "test"}));

    let file = state.storage.write_payload(&data).await?;
    metrics::inc_files_written();

    Ok(Json(WriteResponse {
        status: "success",
        file,
        data,
    }))
}

/// Read handler - list the payload files written so far.
pub async fn read(State(state): State<AppState>) -> Result<Json<ReadResponse>> {
    let files = state.storage.list_files().await?;

    Ok(Json(ReadResponse {
        total: files.len(),
        directory: state.storage.data_dir().display().to_string(),
        files,
    }))
}

/// Fallback for unmatched routes.
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound {
        path: uri.path().to_string(),
    }
}
