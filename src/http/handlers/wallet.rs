use crate::domain::payment::{CreateOrderRequest, PaymentLinkCallback, PreparePaymentRequest, VerifyCheckoutRequest};
use crate::domain::wallet::DateRange;
use crate::error::RechargeError;
use crate::http::caller::Caller;
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

pub async fn prepare_payment_link(
    State(state): State<AppState>,
    caller: Caller,
    Json(req): Json<PreparePaymentRequest>,
) -> impl IntoResponse {
    match state
        .recharge_service
        .prepare(&caller, req, chrono::Utc::now())
        .await
    {
        Ok(order) => (StatusCode::CREATED, Json(order)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn execute_payment_link(
    State(state): State<AppState>,
    caller: Caller,
    Path(reference_id): Path<String>,
) -> impl IntoResponse {
    match state
        .recharge_service
        .execute(&caller, &reference_id, chrono::Utc::now())
        .await
    {
        Ok(resp) => (StatusCode::OK, Json(resp)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Redirect target of the hosted checkout page. Authenticated by the gateway
/// signature rather than the caller identity.
pub async fn payment_callback(
    State(state): State<AppState>,
    Query(params): Query<PaymentLinkCallback>,
) -> impl IntoResponse {
    match state.recharge_service.verify_callback(&params).await {
        Ok(receipt) => (StatusCode::OK, Json(receipt)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn create_order(
    State(state): State<AppState>,
    caller: Caller,
    Json(req): Json<CreateOrderRequest>,
) -> impl IntoResponse {
    match state.recharge_service.create_order(&caller, req).await {
        Ok(resp) => (StatusCode::OK, Json(resp)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn verify_payment(
    State(state): State<AppState>,
    caller: Caller,
    Json(req): Json<VerifyCheckoutRequest>,
) -> impl IntoResponse {
    match state.recharge_service.verify_checkout(&caller, req).await {
        Ok(receipt) => (StatusCode::OK, Json(receipt)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn get_balance(
    State(state): State<AppState>,
    caller: Caller,
    Path(business_unit_id): Path<String>,
) -> impl IntoResponse {
    match state.recharge_service.balance(&caller, &business_unit_id).await {
        Ok(balance) => (StatusCode::OK, Json(balance)).into_response(),
        Err(e) => e.into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl HistoryQuery {
    fn range(&self) -> Result<DateRange, RechargeError> {
        DateRange::from_dates(self.start_date, self.end_date).ok_or(RechargeError::InvalidDateRange)
    }
}

pub async fn list_transactions(
    State(state): State<AppState>,
    caller: Caller,
    Path(business_unit_id): Path<String>,
    Query(q): Query<HistoryQuery>,
) -> impl IntoResponse {
    let range = match q.range() {
        Ok(range) => range,
        Err(e) => return e.into_response(),
    };
    match state
        .recharge_service
        .transactions(
            &caller,
            &business_unit_id,
            &range,
            q.page.unwrap_or(1),
            q.limit.unwrap_or(20),
        )
        .await
    {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn list_user_transactions(
    State(state): State<AppState>,
    caller: Caller,
    Query(q): Query<HistoryQuery>,
) -> impl IntoResponse {
    let range = match q.range() {
        Ok(range) => range,
        Err(e) => return e.into_response(),
    };
    match state
        .recharge_service
        .user_transactions(&caller, &range, q.page.unwrap_or(1), q.limit.unwrap_or(20))
        .await
    {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => e.into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

pub async fn export_transactions(
    State(state): State<AppState>,
    caller: Caller,
    Path(business_unit_id): Path<String>,
    Query(q): Query<ExportQuery>,
) -> Response {
    let Some(range) = DateRange::from_dates(q.start_date, q.end_date) else {
        return RechargeError::InvalidDateRange.into_response();
    };
    let export = match state
        .recharge_service
        .export(&caller, &business_unit_id, &range, chrono::Utc::now())
        .await
    {
        Ok(export) => export,
        Err(e) => return e.into_response(),
    };

    let disposition = match HeaderValue::from_str(&format!("attachment; filename=\"{}\"", export.filename)) {
        Ok(v) => v,
        Err(e) => return RechargeError::Internal(e.into()).into_response(),
    };
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("text/csv; charset=utf-8")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export.content,
    )
        .into_response()
}
