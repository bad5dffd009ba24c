use crate::AppState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

pub async fn health() -> impl IntoResponse {
    (axum::http::StatusCode::OK, "ok")
}

pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let ledger_ok = state.recharge_service.ledger.ping().await;
    let prepared_orders_ok = state.recharge_service.prepared_orders.ping().await;

    let ok = ledger_ok && prepared_orders_ok;
    let status = if ok {
        axum::http::StatusCode::OK
    } else {
        axum::http::StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(serde_json::json!({
            "ready": ok,
            "ledger": ledger_ok,
            "prepared_orders": prepared_orders_ok,
            "gateway": state.recharge_service.gateway.name()
        })),
    )
        .into_response()
}

pub async fn liveness() -> impl IntoResponse {
    (axum::http::StatusCode::OK, Json(serde_json::json!({"alive": true}))).into_response()
}
