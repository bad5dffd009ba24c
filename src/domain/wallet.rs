use chrono::{DateTime, Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Recharge,
    Deduction,
    Refund,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Recharge => "recharge",
            TransactionType::Deduction => "deduction",
            TransactionType::Refund => "refund",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "recharge" => Some(TransactionType::Recharge),
            "deduction" => Some(TransactionType::Deduction),
            "refund" => Some(TransactionType::Refund),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TransactionStatus::Pending),
            "completed" => Some(TransactionStatus::Completed),
            "failed" => Some(TransactionStatus::Failed),
            _ => None,
        }
    }
}

/// Wallet movement. Never updated once `status` is completed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: String,
    pub business_unit_id: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: Decimal,
    pub status: TransactionStatus,
    pub razorpay_order_id: Option<String>,
    pub razorpay_payment_id: Option<String>,
    pub reference_id: Option<String>,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntentStatus {
    Pending,
    Credited,
}

impl IntentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentStatus::Pending => "PENDING",
            IntentStatus::Credited => "CREDITED",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "CREDITED" => IntentStatus::Credited,
            _ => IntentStatus::Pending,
        }
    }
}

/// Server-side record of a recharge the user was redirected to pay. The
/// callback credits against this, never against client-supplied amounts.
///
/// `gateway_ref` is the payment link id for hosted checkout and the order id
/// for embedded checkout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RechargeIntent {
    pub reference_id: String,
    pub business_unit_id: String,
    pub user_id: String,
    pub amount: Decimal,
    pub gateway_ref: String,
    pub status: IntentStatus,
    pub transaction_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl RechargeIntent {
    pub fn pending(
        reference_id: &str,
        business_unit_id: &str,
        user_id: &str,
        amount: Decimal,
        gateway_ref: &str,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            reference_id: reference_id.to_string(),
            business_unit_id: business_unit_id.to_string(),
            user_id: user_id.to_string(),
            amount,
            gateway_ref: gateway_ref.to_string(),
            status: IntentStatus::Pending,
            transaction_id: None,
            created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BusinessUnit {
    pub id: String,
    pub name: String,
    pub wallet_balance: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CreditOutcome {
    Credited {
        transaction: Transaction,
        wallet_balance: Decimal,
    },
    AlreadyCredited {
        transaction: Transaction,
        wallet_balance: Decimal,
    },
}

impl CreditOutcome {
    pub fn transaction(&self) -> &Transaction {
        match self {
            CreditOutcome::Credited { transaction, .. }
            | CreditOutcome::AlreadyCredited { transaction, .. } => transaction,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WalletBalance {
    pub business_unit_id: String,
    pub name: String,
    pub wallet_balance: Decimal,
    pub max_wallet_balance: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionPage {
    pub transactions: Vec<Transaction>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

/// Whose transactions a history query covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryScope {
    BusinessUnit(String),
    User(String),
}

/// Half-open `[from, until)` window on `created_at`. Either side may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl DateRange {
    /// Calendar days in UTC; `end` is inclusive.
    pub fn from_dates(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Option<Self> {
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return None;
            }
        }
        Some(Self {
            from: start.and_then(|d| d.and_hms_opt(0, 0, 0)).map(|d| d.and_utc()),
            until: end
                .and_then(|d| d.checked_add_days(Days::new(1)))
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|d| d.and_utc()),
        })
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from.map_or(true, |from| at >= from) && self.until.map_or(true, |until| at < until)
    }
}
