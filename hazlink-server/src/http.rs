//! Hazlink HTTP REST API
//!
//! Axum-based HTTP server that exposes the safety-correlation analysis.
//!
//! Architecture: each endpoint has a thin axum handler that delegates to an
//! inner function. The inner functions are directly testable without axum
//! dispatch machinery.
//!
//! Endpoints:
//! - GET  /health           — health check with report-dir status
//! - GET  /version          — server version info
//! - POST /analyze          — multipart upload of the three datasets
//! - GET  /download/{file}  — fetch a previously exported report workbook

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use axum::extract::{Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use hazlink_core::HazlinkConfig;
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::subsystems::analyze::{run_analysis, AnalyzeError, Upload};

/// Multipart field names for the three dataset files.
pub const FIELD_SO: &str = "safety_observations";
pub const FIELD_NM: &str = "near_misses";
pub const FIELD_INC: &str = "incidents";

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Shared state for all HTTP handlers
#[derive(Clone)]
pub struct HttpState {
    pub config: HazlinkConfig,
}

impl HttpState {
    pub fn report_dir(&self) -> PathBuf {
        PathBuf::from(&self.config.service.report_dir)
    }
}

/// Build the Axum router with all endpoints
pub fn build_router(state: Arc<HttpState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        .route("/analyze", post(analyze_handler))
        .route("/download/:file", get(download_handler))
        .with_state(state)
}

/// Start the HTTP server on the configured address.
/// Gracefully shuts down when the broadcast shutdown signal fires.
pub async fn start_http_server(
    config: HazlinkConfig,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let addr = format!("{}:{}", config.http.host, config.http.port);
    let state = Arc::new(HttpState { config });

    let app = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Hazlink HTTP API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTP server shutting down...");
        })
        .await?;

    Ok(())
}

// ============================================================================
// Request / Response DTOs
// ============================================================================

/// Standard HTTP error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub status: String,
}

impl ErrorResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            error: msg.into(),
            status: "error".to_string(),
        }
    }
}

// ============================================================================
// Inner (directly testable) business logic functions
// ============================================================================

/// Inner health check — verifies the report directory is usable.
pub fn health_inner(report_dir: &Path) -> (StatusCode, serde_json::Value) {
    if let Err(e) = std::fs::create_dir_all(report_dir) {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            serde_json::json!({
                "status": "unhealthy",
                "error": format!("report dir unavailable: {}", e),
            }),
        );
    }

    (
        StatusCode::OK,
        serde_json::json!({
            "status": "healthy",
            "version": env!("CARGO_PKG_VERSION"),
            "report_dir": report_dir.display().to_string(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }),
    )
}

/// Inner version — returns version info (pure, no IO).
pub fn version_inner() -> serde_json::Value {
    serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "protocol": "hazlink/1",
    })
}

/// Inner analyze — validates the three dataset parts and runs the pipeline.
pub fn analyze_inner(
    config: &HazlinkConfig,
    report_dir: &Path,
    mut uploads: HashMap<String, Upload>,
) -> (StatusCode, serde_json::Value) {
    let mut take = |field: &str| -> Result<Upload, (StatusCode, serde_json::Value)> {
        uploads.remove(field).ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                serde_json::json!({
                    "error": format!("missing multipart file field: {}", field),
                    "status": "error",
                }),
            )
        })
    };

    let (so, nm, inc) = match (take(FIELD_SO), take(FIELD_NM), take(FIELD_INC)) {
        (Ok(so), Ok(nm), Ok(inc)) => (so, nm, inc),
        (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => return e,
    };

    let start = Instant::now();
    match run_analysis(&so, &nm, &inc, config, report_dir) {
        Ok(mut data) => {
            let took_ms = start.elapsed().as_millis() as u64;
            if let Some(obj) = data.as_object_mut() {
                obj.insert("took_ms".to_string(), serde_json::json!(took_ms));
            }
            (StatusCode::OK, data)
        }
        Err(e @ AnalyzeError::BadDataset { .. }) => (
            StatusCode::BAD_REQUEST,
            serde_json::json!({
                "error": e.to_string(),
                "status": "error",
            }),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            serde_json::json!({
                "error": e.to_string(),
                "status": "error",
            }),
        ),
    }
}

/// Inner download — resolves a report file name inside the report dir.
/// Rejects anything that could escape the directory.
pub fn download_inner(
    report_dir: &Path,
    file: &str,
) -> Result<Vec<u8>, (StatusCode, serde_json::Value)> {
    if file.is_empty() || file.contains('/') || file.contains('\\') || file.contains("..") {
        return Err((
            StatusCode::BAD_REQUEST,
            serde_json::json!({
                "error": "invalid report file name",
                "status": "error",
            }),
        ));
    }

    std::fs::read(report_dir.join(file)).map_err(|_| {
        (
            StatusCode::NOT_FOUND,
            serde_json::json!({
                "error": format!("no such report: {}", file),
                "status": "error",
            }),
        )
    })
}

// ============================================================================
// Axum handler wrappers (thin — delegate to inner functions)
// ============================================================================

pub async fn health_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = health_inner(&state.report_dir());
    (status, Json(body))
}

pub async fn version_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(version_inner()))
}

pub async fn analyze_handler(
    State(state): State<Arc<HttpState>>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let mut uploads: HashMap<String, Upload> = HashMap::new();
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                let name = field.name().unwrap_or_default().to_string();
                let filename = field.file_name().unwrap_or("upload.xlsx").to_string();
                match field.bytes().await {
                    Ok(bytes) => {
                        uploads.insert(name, Upload { filename, bytes });
                    }
                    Err(e) => {
                        return (
                            StatusCode::BAD_REQUEST,
                            Json(serde_json::json!(ErrorResponse::new(format!(
                                "failed to read multipart field: {}",
                                e
                            )))),
                        )
                            .into_response();
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::json!(ErrorResponse::new(format!(
                        "malformed multipart body: {}",
                        e
                    )))),
                )
                    .into_response();
            }
        }
    }

    let (status, body) = analyze_inner(&state.config, &state.report_dir(), uploads);
    (status, Json(body)).into_response()
}

pub async fn download_handler(
    State(state): State<Arc<HttpState>>,
    axum::extract::Path(file): axum::extract::Path<String>,
) -> impl IntoResponse {
    match download_inner(&state.report_dir(), &file) {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, XLSX_MIME.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", file),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err((status, body)) => (status, Json(body)).into_response(),
    }
}

// ============================================================================
// Unit Tests — call inner functions directly
// ============================================================================
