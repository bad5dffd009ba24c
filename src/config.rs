use crate::gateways::razorpay::DEFAULT_TIMEOUT_MS;
use crate::service::wallet_ledger::default_max_wallet_balance;
use rust_decimal::Decimal;
use std::str::FromStr;

#[derive(Clone)]
pub struct RazorpayConfig {
    pub base_url: String,
    pub key_id: String,
    pub key_secret: String,
    pub timeout_ms: u64,
}

impl RazorpayConfig {
    pub fn has_credentials(&self) -> bool {
        !self.key_id.is_empty() && !self.key_secret.is_empty()
    }
}

#[derive(Clone)]
pub struct AppConfig {
    /// Unset selects the in-memory ledger.
    pub database_url: Option<String>,
    /// Unset selects the in-memory prepared-order store.
    pub redis_url: Option<String>,
    pub bind_addr: String,
    pub internal_api_key: String,
    pub razorpay: RazorpayConfig,
    pub payment_callback_url: String,
    pub prepared_order_ttl_secs: i64,
    pub default_max_wallet_balance: Decimal,
    pub mock_gateway_behavior: String,
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: non_empty_var("DATABASE_URL"),
            redis_url: non_empty_var("REDIS_URL"),
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            internal_api_key: std::env::var("INTERNAL_API_KEY")
                .unwrap_or_else(|_| "dev-internal-key".to_string()),
            razorpay: RazorpayConfig {
                base_url: std::env::var("RAZORPAY_BASE_URL")
                    .unwrap_or_else(|_| "https://api.razorpay.com".to_string()),
                key_id: std::env::var("RAZORPAY_KEY_ID").unwrap_or_default(),
                key_secret: std::env::var("RAZORPAY_KEY_SECRET").unwrap_or_default(),
                timeout_ms: std::env::var("GATEWAY_TIMEOUT_MS")
                    .ok()
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(DEFAULT_TIMEOUT_MS),
            },
            payment_callback_url: std::env::var("PAYMENT_CALLBACK_URL")
                .unwrap_or_else(|_| "http://localhost:3000/api/wallet/payment-callback".to_string()),
            prepared_order_ttl_secs: std::env::var("PREPARED_ORDER_TTL_SECS")
                .ok()
                .and_then(|s| s.parse::<i64>().ok())
                .filter(|s| *s > 0)
                .unwrap_or(600),
            default_max_wallet_balance: std::env::var("MAX_WALLET_BALANCE")
                .ok()
                .and_then(|s| Decimal::from_str(s.trim()).ok())
                .unwrap_or(default_max_wallet_balance()),
            mock_gateway_behavior: std::env::var("MOCK_GATEWAY_BEHAVIOR")
                .unwrap_or_else(|_| "ALWAYS_SUCCESS".to_string()),
        }
    }
}
