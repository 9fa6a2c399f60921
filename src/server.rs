//! HTTP façade over the query router and memory store.
//!
//! Three question/health endpoints plus the memory API. A missing
//! `question` field is a 400 with a descriptive body; a failed
//! `AgentResult` surfaces as a 500 carrying the result. Stack traces
//! never reach the caller.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Query, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::AppState;
use crate::agent::{Agent, AgentResult, QueryContext};
use crate::config::AppConfig;
use crate::llm::GeminiClient;
use crate::memory::{MemoryStore, PineconeIndex};
use crate::youtube::YouTubeClient;

/// Build the real remote clients from the environment and serve until
/// shutdown. Any missing configuration aborts startup.
///
/// # Errors
///
/// Returns an error for invalid configuration, an unreachable vector
/// index, or a failure to bind the listen address.
pub async fn start_server(config: AppConfig) -> anyhow::Result<()> {
    let llm_settings = crate::config::load_llm_settings()?;
    let pinecone_settings = crate::config::load_pinecone_settings()?;
    let youtube_api_key = crate::config::load_youtube_api_key()?;

    let gemini = Arc::new(GeminiClient::new(llm_settings)?);
    let platform = Arc::new(YouTubeClient::new(youtube_api_key)?);
    let index = Arc::new(PineconeIndex::connect(pinecone_settings).await?);

    let state = AppState {
        agent: Arc::new(Agent::new(Arc::clone(&gemini), platform)),
        memory: Arc::new(MemoryStore::new(gemini, index)),
    };
    let app = router(state, config.server.request_timeout_secs);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(name: "server.started", address = %addr, "Server started");
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

/// Assemble the HTTP surface over the given state.
///
/// Kept separate from [`start_server`] so tests can wire the router with
/// trait doubles.
pub fn router(state: AppState, request_timeout_secs: u64) -> Router {
    let timeout = Duration::from_secs(request_timeout_secs);
    Router::new()
        .route("/youtube", post(youtube_question))
        .route("/chat", post(chat_question))
        .route("/health", get(health))
        .route("/memory", post(save_memory).get(search_memory))
        .layer(axum::middleware::from_fn(
            move |req: Request, next: Next| async move {
                match tokio::time::timeout(timeout, next.run(req)).await {
                    Ok(res) => res,
                    Err(_) => (StatusCode::REQUEST_TIMEOUT, "Request timed out").into_response(),
                }
            },
        ))
        .layer(DefaultBodyLimit::max(1024 * 1024)) // 1MB limit
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Request body for the question endpoints. `question` is optional at the
/// deserialization layer so its absence maps to a 400, not a 422.
#[derive(Debug, Deserialize)]
struct AskRequest {
    #[serde(default)]
    question: Option<String>,
}

fn require_question(req: AskRequest) -> Result<String, Response> {
    match req.question {
        Some(q) if !q.trim().is_empty() => Ok(q),
        _ => Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "missing required field: question" })),
        )
            .into_response()),
    }
}

fn agent_response(result: AgentResult) -> Response {
    let status = if result.is_failure() {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    };
    (status, Json(result)).into_response()
}

/// POST /youtube - answer through the channel-enrichment path.
async fn youtube_question(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Response {
    let question = match require_question(req) {
        Ok(q) => q,
        Err(resp) => return resp,
    };
    info!(question = %question, "Received YouTube question");
    agent_response(state.agent.answer(&question, QueryContext::Youtube).await)
}

/// POST /chat - answer via the LLM directly.
async fn chat_question(State(state): State<AppState>, Json(req): Json<AskRequest>) -> Response {
    let question = match require_question(req) {
        Ok(q) => q,
        Err(resp) => return resp,
    };
    info!(question = %question, "Received chat question");
    agent_response(state.agent.answer(&question, QueryContext::General).await)
}

/// GET /health - static liveness payload.
async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Deserialize)]
struct SaveMemoryRequest {
    text: String,
    #[serde(default)]
    metadata: Map<String, Value>,
}

/// POST /memory - embed and append one memory record.
async fn save_memory(
    State(state): State<AppState>,
    Json(payload): Json<SaveMemoryRequest>,
) -> Response {
    if payload.text.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "missing required field: text" })),
        )
            .into_response();
    }
    match state.memory.store(&payload.text, payload.metadata).await {
        Ok(id) => Json(json!({ "id": id })).into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": err.to_string() })),
        )
            .into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct SearchMemoryQuery {
    q: String,
    top_k: Option<usize>,
}

/// GET /memory?q=...&top_k=... - similarity search over stored memories.
async fn search_memory(
    State(state): State<AppState>,
    Query(query): Query<SearchMemoryQuery>,
) -> Response {
    let top_k = query.top_k.unwrap_or(5);
    match state.memory.retrieve(&query.q, top_k).await {
        Ok(matches) => Json(json!({ "matches": matches })).into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": err.to_string() })),
        )
            .into_response(),
    }
}
