use crate::domain::wallet::{
    BusinessUnit, CreditOutcome, DateRange, HistoryScope, RechargeIntent, Transaction, TransactionPage,
};
use anyhow::Result;
use rust_decimal::Decimal;

/// Cap applied when no `max_wallet_balance` system setting exists.
pub fn default_max_wallet_balance() -> Decimal {
    Decimal::new(500_000, 2)
}

/// Storage for business-unit wallets and the recharges credited to them.
#[async_trait::async_trait]
pub trait WalletLedger: Send + Sync {
    /// The unit, if `user_id` is allowed to act on it.
    async fn business_unit_for_user(&self, user_id: &str, business_unit_id: &str) -> Result<Option<BusinessUnit>>;

    async fn max_wallet_balance(&self) -> Result<Decimal>;

    async fn open_intent(&self, intent: &RechargeIntent) -> Result<()>;

    async fn find_intent(&self, reference_id: &str) -> Result<Option<RechargeIntent>>;

    /// Credits the intent's amount to its business unit. Only the first call
    /// for a reference moves money; later calls return the same transaction
    /// as `AlreadyCredited`. `None` when no intent exists.
    async fn credit_recharge(&self, reference_id: &str, payment_id: &str) -> Result<Option<CreditOutcome>>;

    /// Newest first. `page` is 1-based.
    async fn list_transactions(
        &self,
        scope: &HistoryScope,
        range: &DateRange,
        page: i64,
        limit: i64,
    ) -> Result<TransactionPage>;

    /// Every transaction of the unit inside `range`, newest first.
    async fn export_transactions(&self, business_unit_id: &str, range: &DateRange) -> Result<Vec<Transaction>>;

    async fn ping(&self) -> bool {
        true
    }
}

/// Rows to skip for a 1-based page. Saturates instead of overflowing.
pub fn page_offset(page: i64, limit: i64) -> i64 {
    page.saturating_sub(1).max(0).saturating_mul(limit.max(0))
}

pub(crate) fn recharge_description(business_unit_name: &str) -> String {
    format!("Business unit wallet recharge via Razorpay for {}", business_unit_name)
}
