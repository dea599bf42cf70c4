//! HTTP server exposing the agent.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/chat?query=...` | Ask the agent a question |
//! | `POST` | `/csv` | Analyze CSV content (`{ "content": ..., "query": ... }`) |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! Error responses use a JSON body:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "query must not be empty" } }
//! ```
//!
//! Downstream model and lookup failures never surface as HTTP errors; the
//! agent folds them into its answer text, so `/chat` and `/csv` return 200
//! for any well-formed request.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser-based
//! clients.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::agent::Agent;
use crate::config::Config;

/// Shared application state passed to all route handlers via Axum's `State`
/// extractor.
#[derive(Clone)]
struct AppState {
    agent: Arc<Agent>,
}

/// Starts the HTTP server over an already-wired agent.
///
/// Binds to the address configured in `[server].bind` and runs until the
/// process is terminated.
///
/// # Errors
///
/// Returns an error if binding fails.
pub async fn run_server(config: &Config, agent: Arc<Agent>) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/chat", get(handle_chat))
        .route("/csv", post(handle_csv))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(AppState { agent });

    info!(addr = bind_addr.as_str(), "server listening");
    println!("Server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g., `"bad_request"`).
    code: String,
    /// Human-readable error message.
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

/// Constructs a 400 Bad Request error.
fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

// ============ GET /chat ============

#[derive(Deserialize)]
struct ChatParams {
    query: String,
}

/// JSON response body for `GET /chat` and `POST /csv`.
#[derive(Serialize)]
struct AnswerResponse {
    answer: String,
}

/// Handler for `GET /chat?query=...`.
async fn handle_chat(
    State(state): State<AppState>,
    Query(params): Query<ChatParams>,
) -> Result<Json<AnswerResponse>, AppError> {
    if params.query.trim().is_empty() {
        return Err(bad_request("query must not be empty"));
    }

    let answer = state.agent.answer(&params.query).await;
    Ok(Json(AnswerResponse { answer }))
}

// ============ POST /csv ============

#[derive(Deserialize)]
struct CsvRequest {
    content: String,
    query: String,
}

/// Handler for `POST /csv`.
async fn handle_csv(
    State(state): State<AppState>,
    Json(request): Json<CsvRequest>,
) -> Result<Json<AnswerResponse>, AppError> {
    if request.query.trim().is_empty() {
        return Err(bad_request("query must not be empty"));
    }
    if request.content.trim().is_empty() {
        return Err(bad_request("content must not be empty"));
    }

    let answer = state.agent.analyze_csv(&request.content, &request.query).await;
    Ok(Json(AnswerResponse { answer }))
}

// ============ GET /health ============

/// JSON response body for `GET /health`.
#[derive(Serialize)]
struct HealthResponse {
    /// Always `"ok"` when the server is running.
    status: String,
    /// The crate version from `Cargo.toml`.
    version: String,
}

/// Handler for `GET /health`.
async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
