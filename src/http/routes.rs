use crate::http::handlers::{ops, timeouts, wallet};
use crate::http::middleware::admin_auth::require_internal_api_key;
use crate::http::middleware::timeout::{enforce, TimeoutPolicy, TimeoutState};
use crate::AppState;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;

pub fn router(state: AppState, internal_api_key: String) -> Router {
    let payment_timeout = TimeoutState::new(TimeoutPolicy::payment(), state.timeout_monitor.clone());
    let report_timeout = TimeoutState::new(TimeoutPolicy::analytics(), state.timeout_monitor.clone());
    let export_timeout = TimeoutState::new(TimeoutPolicy::export(), state.timeout_monitor.clone());

    let payment_routes = Router::new()
        .route("/api/wallet/payment-links", post(wallet::prepare_payment_link))
        .route(
            "/api/wallet/payment-links/:reference_id/execute",
            post(wallet::execute_payment_link),
        )
        .route("/api/wallet/payment-callback", get(wallet::payment_callback))
        .route("/api/wallet/create-order", post(wallet::create_order))
        .route("/api/wallet/verify-payment", post(wallet::verify_payment))
        .layer(from_fn_with_state(payment_timeout, enforce));

    let wallet_routes = Router::new()
        .route(
            "/api/wallet/business-units/:business_unit_id/balance",
            get(wallet::get_balance),
        )
        .route(
            "/api/wallet/business-units/:business_unit_id/transactions",
            get(wallet::list_transactions),
        )
        .route("/api/wallet/transactions", get(wallet::list_user_transactions))
        .layer(from_fn_with_state(report_timeout, enforce));

    let export_routes = Router::new()
        .route(
            "/api/wallet/business-units/:business_unit_id/transactions/export",
            get(wallet::export_transactions),
        )
        .layer(from_fn_with_state(export_timeout, enforce));

    let admin_routes = Router::new()
        .route("/ops/timeouts/stats", get(timeouts::stats))
        .route("/ops/timeouts/recent", get(timeouts::recent))
        .route("/ops/timeouts/exceeded", get(timeouts::exceeded))
        .route("/ops/timeouts/clear", post(timeouts::clear))
        .layer(from_fn_with_state(internal_api_key, require_internal_api_key));

    Router::new()
        .route("/health", get(ops::health))
        .route("/ops/readiness", get(ops::readiness))
        .route("/ops/liveness", get(ops::liveness))
        .merge(payment_routes)
        .merge(wallet_routes)
        .merge(export_routes)
        .merge(admin_routes)
        .with_state(state)
}
