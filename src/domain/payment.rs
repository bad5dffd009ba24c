use crate::domain::wallet::Transaction;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const PREPARED_ORDER_TTL_MINUTES: i64 = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserDetails {
    pub user_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub contact: Option<String>,
}

/// Hosted checkout link returned by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentLink {
    pub id: String,
    pub short_url: String,
    pub status: String,
}

/// A payment link created ahead of the user's click, so the click itself only
/// has to redirect. Consumed exactly once by execution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PreparedPaymentOrder {
    pub payment_link: PaymentLink,
    pub amount: Decimal,
    pub business_unit_id: String,
    pub reference_id: String,
    pub user_details: UserDetails,
    pub prepared_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl PreparedPaymentOrder {
    pub fn new(
        payment_link: PaymentLink,
        amount: Decimal,
        business_unit_id: String,
        reference_id: String,
        user_details: UserDetails,
        prepared_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            payment_link,
            amount,
            business_unit_id,
            reference_id,
            user_details,
            prepared_at,
            expires_at: prepared_at + ttl,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PreparePaymentRequest {
    pub business_unit_id: String,
    pub amount: Decimal,
    pub contact: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutePaymentResponse {
    pub reference_id: String,
    pub redirect_url: String,
}

/// Query string the gateway appends when redirecting back from a payment link.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PaymentLinkCallback {
    pub razorpay_payment_id: Option<String>,
    pub razorpay_payment_link_id: Option<String>,
    pub razorpay_payment_link_reference_id: Option<String>,
    pub razorpay_payment_link_status: Option<String>,
    pub razorpay_signature: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateOrderRequest {
    pub business_unit_id: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GatewayOrder {
    pub id: String,
    pub amount_minor: i64,
    pub currency: String,
    pub receipt: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateOrderResponse {
    pub success: bool,
    pub order: GatewayOrder,
    pub key_id: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VerifyCheckoutRequest {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
    pub amount: Decimal,
    pub business_unit_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RechargeReceipt {
    pub transaction: Transaction,
    pub wallet_balance: Decimal,
    pub already_credited: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: ErrorPayload,
}

#[derive(Debug, Serialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}
