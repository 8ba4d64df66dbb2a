use crate::error::ApiError;
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use axum::{Router, routing::get};
use serde::{Deserialize, Serialize};
use std::time::Instant;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(health))
        .route("/db", get(db_health))
}

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_seconds: i64,
}

#[derive(Serialize, Deserialize)]
pub struct DbHealthResponse {
    pub rtt: u128,
}

#[tracing::instrument(name = "GET /health", skip(state))]
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        uptime_seconds: (chrono::Utc::now() - state.started_at).num_seconds(),
    }))
}

#[tracing::instrument(name = "GET /health/db", skip(state))]
pub async fn db_health(
    State(state): State<AppState>,
) -> Result<Json<DbHealthResponse>, ApiError> {
    let now = Instant::now();
    state
        .store
        .ping()
        .await
        .map_err(|e| ApiError::service_unavailable(format!("Store ping failed: {}", e)))?;
    let elapsed = now.elapsed();
    Ok(Json(DbHealthResponse {
        rtt: elapsed.as_millis(),
    }))
}
