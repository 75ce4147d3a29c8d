use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::{net::SocketAddr, sync::Arc};

use crate::orchestrator::{SeparationResult, Separator, StemFile};
use crate::params::{ResolvedParameters, SeparationRequest};

pub const SERVICE_NAME: &str = "stemify-sieve-api";
pub const API_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Clone)]
struct AppState {
    separator: Arc<Separator>,
}

/// Routes of the public API
pub fn router(separator: Separator) -> Router {
    let state = AppState {
        separator: Arc::new(separator),
    };

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/separate", post(separate))
        .route("/status/:job_id", get(job_status))
        .with_state(state)
}

pub async fn run_server(addr: SocketAddr, separator: Separator) -> Result<(), std::io::Error> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Stemify HTTP server listening");
    serve(listener, separator).await
}

/// Serve on an already-bound listener
pub async fn serve(listener: tokio::net::TcpListener, separator: Separator) -> Result<(), std::io::Error> {
    axum::serve(listener, router(separator)).await
}

fn detail(status: StatusCode, detail: impl Into<String>) -> Response {
    (status, Json(json!({ "detail": detail.into() }))).into_response()
}

// ═══════════════════════════════════════════════════════════════
// GET / , GET /health
// ═══════════════════════════════════════════════════════════════

async fn root() -> impl IntoResponse {
    Json(json!({
        "message": "Stemify Sieve API is running",
        "version": API_VERSION,
    }))
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
    }))
}

// ═══════════════════════════════════════════════════════════════
// POST /separate
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Serialize, Deserialize)]
pub struct SeparateResponse {
    pub status: String,
    pub message: String,
    pub output_files: Vec<StemFile>,
    pub parameters: ResolvedParameters,
}

impl From<SeparationResult> for SeparateResponse {
    fn from(result: SeparationResult) -> Self {
        Self {
            status: "completed".into(),
            message: "Separation completed successfully".into(),
            output_files: result.output_files,
            parameters: result.parameters,
        }
    }
}

async fn separate(
    State(st): State<AppState>,
    body: Result<Json<SeparationRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match body {
        Ok(req) => req,
        Err(rejection) => return detail(StatusCode::UNPROCESSABLE_ENTITY, rejection.body_text()),
    };

    match st.separator.separate(&req).await {
        Ok(result) => (StatusCode::OK, Json(SeparateResponse::from(result))).into_response(),
        Err(e) => {
            tracing::error!(error = %e, audio_url = %req.audio_url, "Separation failed");
            detail(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to complete separation: {e}"),
            )
        }
    }
}

// ═══════════════════════════════════════════════════════════════
// GET /status/:job_id
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub job_id: String,
    pub status: String,
    pub result: Option<Value>,
    pub error: Option<String>,
}

// Jobs run synchronously inside /separate, so there is nothing to look up.
async fn job_status(Path(job_id): Path<String>) -> impl IntoResponse {
    Json(JobStatusResponse {
        job_id,
        status: "completed".into(),
        result: None,
        error: Some("Synchronous processing - no job tracking needed".into()),
    })
}
