//! The REST surface: axum router and JSON endpoint handlers.
//!
//! Error bodies use the `{"detail": "..."}` shape the frontend already
//! consumes. The service answers 503 on every data endpoint until the
//! assistant is initialised.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use griot_rag::corpus::CorpusStats;

use crate::assistant::{Assistant, SourceRef};
use crate::composer::ConversationTurn;

/// Shared state: the indexed assistant, absent until startup finishes.
#[derive(Clone, Default)]
pub struct AppState {
    /// The assistant, or `None` while the service is initialising.
    pub assistant: Option<Arc<Assistant>>,
}

/// Bind address for [`run_server`].
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// TCP port to bind.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 8000 }
    }
}

/// Request body of `POST /api/chat`.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// The question to answer.
    pub question: String,
    /// Whether the LLM tier may be used (the extractive fallback always
    /// remains available).
    #[serde(default = "default_use_llm")]
    pub use_llm: bool,
    /// Number of passages to retrieve.
    #[serde(default = "default_n_results")]
    pub n_results: usize,
    /// Conversation turns preceding this question; never persisted.
    #[serde(default)]
    pub conversation_history: Vec<ConversationTurn>,
}

fn default_use_llm() -> bool {
    true
}

fn default_n_results() -> usize {
    5
}

/// Response body of `POST /api/chat`.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub question: String,
    pub answer: String,
    pub sources: Vec<SourceRef>,
    pub timestamp: String,
    pub processing_time_ms: u64,
}

/// Response body of `GET /api/health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub rag_initialized: bool,
    pub total_documents: usize,
    pub timestamp: String,
}

/// Error body shape shared by all endpoints.
#[derive(Debug, Serialize)]
struct ErrorDetail {
    detail: String,
}

fn error_response(status: StatusCode, detail: impl Into<String>) -> (StatusCode, Json<ErrorDetail>) {
    (status, Json(ErrorDetail { detail: detail.into() }))
}

/// Build the application router with permissive CORS and request tracing.
pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/api/health", get(health))
        .route("/api/stats", get(stats))
        .route("/api/chat", post(chat))
        .route("/api/clear", delete(clear))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve the application until shutdown.
pub async fn run_server(config: ServerConfig, state: AppState) -> anyhow::Result<()> {
    let app = app_router(state);
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| "invalid host/port for the griot server")?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("griot-server listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

/// `GET /` — service metadata.
async fn root() -> impl IntoResponse {
    Json(json!({
        "message": "🇧🇫 Griot API",
        "description": "Assistant culturel sur le patrimoine du Burkina Faso",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "chat": "POST /api/chat",
            "health": "GET /api/health",
            "stats": "GET /api/stats",
            "clear": "DELETE /api/clear"
        }
    }))
}

/// `GET /api/health` — liveness plus corpus size.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let initialized = state.assistant.is_some();
    Json(HealthResponse {
        status: if initialized { "healthy".to_string() } else { "error".to_string() },
        message: if initialized {
            "Système RAG opérationnel".to_string()
        } else {
            "RAG non initialisé".to_string()
        },
        rag_initialized: initialized,
        total_documents: state.assistant.as_ref().map_or(0, |a| a.corpus().len()),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// `GET /api/stats` — corpus statistics.
async fn stats(
    State(state): State<AppState>,
) -> Result<Json<CorpusStats>, (StatusCode, Json<ErrorDetail>)> {
    let assistant = state.assistant.as_ref().ok_or_else(|| {
        error_response(StatusCode::SERVICE_UNAVAILABLE, "Système RAG non initialisé")
    })?;
    Ok(Json(assistant.corpus().stats()))
}

/// `POST /api/chat` — answer a question.
async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<ErrorDetail>)> {
    let assistant = state.assistant.as_ref().ok_or_else(|| {
        error_response(StatusCode::SERVICE_UNAVAILABLE, "Système RAG non initialisé")
    })?;

    if request.question.trim().chars().count() < 3 {
        return Err(error_response(StatusCode::BAD_REQUEST, "Question trop courte"));
    }

    let n_results = request.n_results.clamp(1, 10);
    let start = Instant::now();

    let outcome = assistant
        .ask(&request.question, n_results, request.use_llm, &request.conversation_history)
        .await
        .map_err(|e| {
            error!(error = %e, "chat request failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("Erreur: {e}"))
        })?;

    Ok(Json(ChatResponse {
        question: outcome.question,
        answer: outcome.answer,
        sources: outcome.sources,
        timestamp: chrono::Utc::now().to_rfc3339(),
        processing_time_ms: start.elapsed().as_millis() as u64,
    }))
}

/// `DELETE /api/clear` — stateless acknowledgement kept for frontend
/// compatibility; history lives entirely client-side.
async fn clear() -> impl IntoResponse {
    Json(json!({"status": "success", "message": "Historique effacé"}))
}
