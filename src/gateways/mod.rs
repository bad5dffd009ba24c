use crate::domain::payment::{GatewayOrder, PaymentLink};

pub mod mock;
pub mod razorpay;
pub mod signature;

pub const DEFAULT_CURRENCY: &str = "INR";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerDetails {
    pub name: Option<String>,
    pub email: Option<String>,
    pub contact: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PaymentLinkRequest {
    pub amount_minor: i64,
    pub currency: String,
    pub description: String,
    pub reference_id: String,
    pub customer: Option<CustomerDetails>,
    pub callback_url: Option<String>,
    /// Unix seconds after which the link can no longer be paid.
    pub expire_by: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub amount_minor: i64,
    pub currency: String,
    pub receipt: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("gateway {operation} timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },
    #[error("gateway rejected {operation} with HTTP {status}: {body}")]
    Rejected {
        operation: String,
        status: u16,
        body: String,
    },
    #[error("gateway {operation} failed: {message}")]
    Network { operation: String, message: String },
    #[error("gateway returned an unreadable {operation} response: {message}")]
    Decode { operation: String, message: String },
}

#[async_trait::async_trait]
pub trait PaymentGateway: Send + Sync {
    fn name(&self) -> &'static str;

    /// Public key handed to the embedded checkout widget.
    fn key_id(&self) -> &str;

    async fn create_payment_link(&self, request: PaymentLinkRequest) -> Result<PaymentLink, GatewayError>;

    async fn create_order(&self, request: OrderRequest) -> Result<GatewayOrder, GatewayError>;
}
