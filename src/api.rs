//! HTTP API handlers.

use axum::extract::{Path, State};
use axum::http::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use subtle::ConstantTimeEq;

use crate::error::RapportError;
use crate::policy::LayerCounts;
use crate::record::{FollowupSignal, MemoryFragment, Record, Role};
use crate::AppState;

/// Auth middleware: checks Bearer token if RAPPORT_API_KEY is configured.
async fn require_auth(
    State(state): State<AppState>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, RapportError> {
    let Some(ref expected) = state.api_key else {
        return Ok(next.run(req).await);
    };

    let unauthorized = || RapportError::Unauthorized;

    let header = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(unauthorized)?;

    let token = header.strip_prefix("Bearer ").ok_or_else(unauthorized)?;

    // constant-time comparison to prevent timing attacks
    if token.as_bytes().ct_eq(expected.as_bytes()).into() {
        Ok(next.run(req).await)
    } else {
        Err(unauthorized())
    }
}

pub fn router(state: AppState) -> Router {
    // Public routes (no auth)
    let public = Router::new()
        .route("/", get(health))
        .route("/stats", get(stats));

    // Protected routes
    let protected = Router::new()
        .route("/sessions/{id}", get(get_session))
        .route("/sessions/{id}/layers", get(get_layers))
        .route("/sessions/{id}/turns", post(append_turn))
        .route("/sessions/{id}/memory", post(ingest_memory))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    public.merge(protected).with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "rapport",
        "version": env!("CARGO_PKG_VERSION"),
        "sessions": state.engine.session_count(),
        "uptime_secs": state.started_at.elapsed().as_secs(),
    }))
}

async fn stats(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "sessions": state.engine.session_count(),
        "active_locks": state.engine.active_locks(),
    }))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Record>, RapportError> {
    state.engine.get(&id).await.map(Json)
}

async fn get_layers(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LayerCounts>, RapportError> {
    state.engine.layer_counts(&id).await.map(Json)
}

#[derive(Deserialize)]
struct TurnBody {
    role: Role,
    content: String,
    #[serde(default)]
    timestamp: Option<i64>,
}

async fn append_turn(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<TurnBody>,
) -> Result<Json<Record>, RapportError> {
    state
        .engine
        .append_turn(&id, body.role, body.content, body.timestamp)
        .await
        .map(Json)
}

#[derive(Deserialize)]
struct MemoryBody {
    #[serde(flatten)]
    fragment: MemoryFragment,
    #[serde(default)]
    followup: Option<FollowupSignal>,
}

async fn ingest_memory(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<MemoryBody>,
) -> Result<Json<Record>, RapportError> {
    state
        .engine
        .ingest(&id, body.fragment, body.followup)
        .await
        .map(Json)
}
