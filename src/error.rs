use crate::domain::payment::{ErrorEnvelope, ErrorPayload};
use crate::gateways::GatewayError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum RechargeError {
    #[error("caller identity is required")]
    Unauthenticated,
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("access denied to business unit {0}")]
    BusinessUnitAccessDenied(String),
    #[error(
        "cannot recharge {business_unit}: maximum wallet balance is {max_balance}, current balance is {current_balance}"
    )]
    WalletLimitExceeded {
        business_unit: String,
        max_balance: Decimal,
        current_balance: Decimal,
    },
    #[error("prepared order {0} not found or already used")]
    PreparedOrderNotFound(String),
    #[error("prepared order {reference_id} expired at {expired_at}")]
    PreparedOrderExpired {
        reference_id: String,
        expired_at: DateTime<Utc>,
    },
    #[error("{0}")]
    Forbidden(String),
    #[error("invalid payment callback: {0}")]
    InvalidCallback(String),
    #[error("payment signature verification failed")]
    SignatureInvalid,
    #[error("payment status is {0}, expected paid")]
    PaymentNotPaid(String),
    #[error("no recharge found for reference {0}")]
    RechargeNotFound(String),
    #[error("start date must not be after end date")]
    InvalidDateRange,
    #[error("no recharge data found for the requested range")]
    NoRechargeData,
    #[error("payments are not configured: gateway secret missing")]
    PaymentsUnavailable,
    #[error("amount {received} does not match the order amount {expected}")]
    AmountMismatch { expected: Decimal, received: Decimal },
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl RechargeError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::InvalidAmount(_)
            | Self::WalletLimitExceeded { .. }
            | Self::InvalidCallback(_)
            | Self::SignatureInvalid
            | Self::AmountMismatch { .. }
            | Self::InvalidDateRange => StatusCode::BAD_REQUEST,
            Self::BusinessUnitAccessDenied(_) | Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::PreparedOrderNotFound(_) | Self::RechargeNotFound(_) | Self::NoRechargeData => {
                StatusCode::NOT_FOUND
            }
            Self::PaymentsUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::PreparedOrderExpired { .. } => StatusCode::GONE,
            Self::PaymentNotPaid(_) => StatusCode::PAYMENT_REQUIRED,
            Self::Gateway(GatewayError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
            Self::Gateway(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::BusinessUnitAccessDenied(_) => "BUSINESS_UNIT_ACCESS_DENIED",
            Self::WalletLimitExceeded { .. } => "WALLET_LIMIT_EXCEEDED",
            Self::PreparedOrderNotFound(_) => "PREPARED_ORDER_NOT_FOUND",
            Self::PreparedOrderExpired { .. } => "PREPARED_ORDER_EXPIRED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::InvalidCallback(_) => "INVALID_CALLBACK",
            Self::SignatureInvalid => "SIGNATURE_INVALID",
            Self::PaymentNotPaid(_) => "PAYMENT_NOT_PAID",
            Self::RechargeNotFound(_) => "RECHARGE_NOT_FOUND",
            Self::AmountMismatch { .. } => "AMOUNT_MISMATCH",
            Self::InvalidDateRange => "INVALID_DATE_RANGE",
            Self::NoRechargeData => "NO_RECHARGE_DATA",
            Self::PaymentsUnavailable => "PAYMENTS_UNAVAILABLE",
            Self::Gateway(GatewayError::Timeout { .. }) => "GATEWAY_TIMEOUT",
            Self::Gateway(_) => "GATEWAY_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::WalletLimitExceeded {
                max_balance,
                current_balance,
                ..
            } => Some(json!({
                "max_balance": max_balance,
                "current_balance": current_balance,
                "max_allowed_recharge": (*max_balance - *current_balance).max(Decimal::ZERO),
            })),
            Self::PreparedOrderExpired { expired_at, .. } => Some(json!({ "expired_at": expired_at })),
            _ => None,
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            error: ErrorPayload {
                code: self.error_code().to_string(),
                message: self.to_string(),
                details: self.details(),
            },
        }
    }
}

impl IntoResponse for RechargeError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        } else {
            tracing::warn!(code = self.error_code(), error = %self, "request rejected");
        }
        (status, Json(self.envelope())).into_response()
    }
}
