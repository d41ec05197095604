//! HTTP API server.
//!
//! Exposes the pipeline as `POST /process-video` for browser front-ends.

use crate::cli::preflight;
use crate::cli::Output;
use crate::config::{ServerSettings, Settings};
use crate::error::PipelineError;
use crate::orchestrator::{Orchestrator, PipelineOutcome, ProcessRequest};
use axum::{
    extract::{Query, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{error, warn};

/// Shared application state.
struct AppState {
    orchestrator: Orchestrator,
}

/// Run the HTTP API server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> anyhow::Result<()> {
    for warning in preflight::check(&settings) {
        Output::warning(&warning);
    }

    let orchestrator = Orchestrator::new(&settings)?;
    let state = Arc::new(AppState { orchestrator });

    let app = Router::new()
        .route("/health", get(health))
        .route("/process-video", post(process_video))
        .route("/process-video/", post(process_video))
        .layer(cors_layer(&settings.server)?)
        .with_state(state);

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Skriv API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Process video", "POST /process-video?video_id=...&output_format=markdown|html");
    Output::kv("CORS origins", &settings.server.allowed_origins.join(", "));
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

fn cors_layer(server: &ServerSettings) -> anyhow::Result<CorsLayer> {
    let origin = if server.allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let origins = server
            .allowed_origins
            .iter()
            .map(|o| {
                HeaderValue::from_str(o)
                    .map_err(|e| anyhow::anyhow!("Invalid CORS origin '{}': {}", o, e))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        AllowOrigin::list(origins)
    };

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any))
}

// === Request/Response Types ===

#[derive(Debug, Deserialize)]
struct ProcessQuery {
    video_id: String,
    #[serde(default = "default_format")]
    output_format: String,
    #[serde(default)]
    tone: Option<String>,
    #[serde(default)]
    audience: Option<String>,
}

fn default_format() -> String {
    "markdown".to_string()
}

impl From<ProcessQuery> for ProcessRequest {
    fn from(query: ProcessQuery) -> Self {
        Self {
            video: query.video_id,
            output_format: query.output_format,
            tone: query.tone,
            audience: query.audience,
        }
    }
}

/// A pipeline failure rendered as a JSON error body.
struct ApiError(PipelineError);

fn status_for(err: &PipelineError) -> StatusCode {
    match err {
        PipelineError::BadRequest(_) => StatusCode::BAD_REQUEST,
        PipelineError::TranscriptionUnavailable { .. } | PipelineError::GenerationUnavailable { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_body(err: &PipelineError) -> serde_json::Value {
    let mut body = serde_json::json!({
        "error": err.to_string(),
        "kind": err.kind(),
    });

    if let PipelineError::TranscriptionUnavailable { primary, fallback }
    | PipelineError::GenerationUnavailable { primary, fallback } = err
    {
        body["primary"] = serde_json::to_value(primary).unwrap_or_default();
        body["fallback"] = serde_json::to_value(fallback).unwrap_or_default();
    }

    body
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        } else {
            warn!("Request rejected: {}", self.0);
        }
        (status, Json(error_body(&self.0))).into_response()
    }
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn process_video(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProcessQuery>,
) -> Result<Json<PipelineOutcome>, ApiError> {
    let request = ProcessRequest::from(query);
    state
        .orchestrator
        .process_video(&request)
        .await
        .map(Json)
        .map_err(ApiError)
}
