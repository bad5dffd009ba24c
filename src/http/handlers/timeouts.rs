use crate::service::timeout_monitor::DEFAULT_EVENT_LIMIT;
use crate::AppState;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

pub async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.timeout_monitor.stats()))
}

pub async fn recent(State(state): State<AppState>, Query(q): Query<LimitQuery>) -> impl IntoResponse {
    let limit = q.limit.unwrap_or(DEFAULT_EVENT_LIMIT);
    (StatusCode::OK, Json(state.timeout_monitor.recent(limit)))
}

pub async fn exceeded(State(state): State<AppState>, Query(q): Query<LimitQuery>) -> impl IntoResponse {
    let limit = q.limit.unwrap_or(DEFAULT_EVENT_LIMIT);
    (StatusCode::OK, Json(state.timeout_monitor.exceeded(limit)))
}

pub async fn clear(State(state): State<AppState>) -> impl IntoResponse {
    state.timeout_monitor.clear();
    tracing::info!("timeout monitor cleared");
    (StatusCode::OK, Json(serde_json::json!({"cleared": true})))
}
