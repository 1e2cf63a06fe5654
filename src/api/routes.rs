//! HTTP route handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::agent::{Agent, AgentError};
use crate::config::Config;
use crate::tools::ToolSpec;

use super::sessions::{SessionStore, SubmitError};
use super::types::{
    CreateSessionResponse, HealthResponse, SessionState, SubmitMessageRequest,
    SubmitMessageResponse,
};

/// Shared application state.
pub struct AppState {
    pub agent: Arc<Agent>,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(agent: Arc<Agent>) -> Self {
        Self {
            agent,
            sessions: SessionStore::new(),
        }
    }
}

/// Build the router for the given state.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/tools", get(list_tools))
        .route("/api/sessions", post(create_session))
        .route(
            "/api/sessions/:id",
            get(get_session).delete(delete_session),
        )
        .route("/api/sessions/:id/messages", post(submit_message))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let agent = Agent::from_config(&config)?;
    let state = Arc::new(AppState::new(Arc::new(agent)));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app(state)).await?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
    r#type: String,
    code: Option<String>,
}

fn error_response(status: StatusCode, message: String, code: &str) -> Response {
    let body = ErrorResponse {
        error: ErrorBody {
            message,
            r#type: "error".to_string(),
            code: Some(code.to_string()),
        },
    };
    (status, Json(body)).into_response()
}

fn session_not_found(id: Uuid) -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        format!("Session {} not found", id),
        "session_not_found",
    )
}

fn submit_error_response(err: SubmitError) -> Response {
    let message = err.to_string();
    match err {
        SubmitError::Busy => error_response(StatusCode::CONFLICT, message, "session_busy"),
        SubmitError::Agent(AgentError::ReasoningEngine(_)) => {
            error_response(StatusCode::BAD_GATEWAY, message, "reasoning_engine_error")
        }
        SubmitError::Agent(AgentError::LoopBoundExceeded { .. }) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            message,
            "loop_bound_exceeded",
        ),
        SubmitError::Agent(AgentError::Cancelled) => {
            error_response(StatusCode::GONE, message, "cancelled")
        }
        SubmitError::Agent(AgentError::Conversation(_)) | SubmitError::Task(_) => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, message, "internal_error")
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn list_tools(State(state): State<Arc<AppState>>) -> Json<Vec<ToolSpec>> {
    Json(state.agent.tools().list().to_vec())
}

async fn create_session(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<CreateSessionResponse>) {
    let session = state.sessions.create().await;
    (
        StatusCode::CREATED,
        Json(CreateSessionResponse { id: session.id }),
    )
}

async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionState>, Response> {
    let session = state.sessions.get(id).await.ok_or_else(|| session_not_found(id))?;
    Ok(Json(session.snapshot().await))
}

async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, Response> {
    if state.sessions.remove(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(session_not_found(id))
    }
}

async fn submit_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<SubmitMessageRequest>,
) -> Result<Json<SubmitMessageResponse>, Response> {
    let message = req.message.trim().to_string();
    if message.is_empty() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "message is required".to_string(),
            "invalid_request_error",
        ));
    }

    let session = state.sessions.get(id).await.ok_or_else(|| session_not_found(id))?;

    tracing::info!(
        session_id = %id,
        content_len = message.len(),
        "Received chat message"
    );

    let reply = session
        .submit(state.agent.clone(), message)
        .await
        .map_err(submit_error_response)?;

    Ok(Json(SubmitMessageResponse { reply }))
}
