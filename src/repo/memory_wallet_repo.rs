use crate::domain::wallet::{
    BusinessUnit, CreditOutcome, DateRange, HistoryScope, IntentStatus, RechargeIntent, Transaction, TransactionPage,
    TransactionStatus, TransactionType,
};
use crate::service::wallet_ledger::{page_offset, recharge_description, WalletLedger};
use anyhow::{anyhow, Result};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Default)]
struct LedgerState {
    units: HashMap<String, BusinessUnit>,
    access: HashSet<(String, String)>,
    intents: HashMap<String, RechargeIntent>,
    transactions: Vec<Transaction>,
}

/// Process-local ledger used when no database is configured.
#[derive(Clone)]
pub struct InMemoryWalletRepo {
    state: Arc<Mutex<LedgerState>>,
    max_wallet_balance: Decimal,
}

impl InMemoryWalletRepo {
    pub fn new(max_wallet_balance: Decimal) -> Self {
        Self {
            state: Arc::new(Mutex::new(LedgerState::default())),
            max_wallet_balance,
        }
    }

    pub fn add_business_unit(&self, unit: BusinessUnit) {
        self.state.lock().units.insert(unit.id.clone(), unit);
    }

    pub fn grant_access(&self, user_id: &str, business_unit_id: &str) {
        self.state
            .lock()
            .access
            .insert((user_id.to_string(), business_unit_id.to_string()));
    }

    pub fn balance(&self, business_unit_id: &str) -> Option<Decimal> {
        self.state
            .lock()
            .units
            .get(business_unit_id)
            .map(|u| u.wallet_balance)
    }

    pub fn transaction_count(&self) -> usize {
        self.state.lock().transactions.len()
    }
}

#[async_trait::async_trait]
impl WalletLedger for InMemoryWalletRepo {
    async fn business_unit_for_user(&self, user_id: &str, business_unit_id: &str) -> Result<Option<BusinessUnit>> {
        let state = self.state.lock();
        if !state
            .access
            .contains(&(user_id.to_string(), business_unit_id.to_string()))
        {
            return Ok(None);
        }
        Ok(state.units.get(business_unit_id).cloned())
    }

    async fn max_wallet_balance(&self) -> Result<Decimal> {
        Ok(self.max_wallet_balance)
    }

    async fn open_intent(&self, intent: &RechargeIntent) -> Result<()> {
        self.state
            .lock()
            .intents
            .entry(intent.reference_id.clone())
            .or_insert_with(|| intent.clone());
        Ok(())
    }

    async fn find_intent(&self, reference_id: &str) -> Result<Option<RechargeIntent>> {
        Ok(self.state.lock().intents.get(reference_id).cloned())
    }

    async fn credit_recharge(&self, reference_id: &str, payment_id: &str) -> Result<Option<CreditOutcome>> {
        let mut state = self.state.lock();
        let Some(intent) = state.intents.get(reference_id).cloned() else {
            return Ok(None);
        };

        if intent.status == IntentStatus::Credited {
            let transaction = state
                .transactions
                .iter()
                .find(|t| t.reference_id.as_deref() == Some(reference_id))
                .cloned()
                .ok_or_else(|| anyhow!("credited intent {} has no transaction", reference_id))?;
            let wallet_balance = state
                .units
                .get(&intent.business_unit_id)
                .map(|u| u.wallet_balance)
                .unwrap_or_default();
            return Ok(Some(CreditOutcome::AlreadyCredited {
                transaction,
                wallet_balance,
            }));
        }

        let unit = state
            .units
            .get_mut(&intent.business_unit_id)
            .ok_or_else(|| anyhow!("business unit {} not found", intent.business_unit_id))?;
        unit.wallet_balance += intent.amount;
        let wallet_balance = unit.wallet_balance;
        let description = recharge_description(&unit.name);

        let transaction = Transaction {
            id: Uuid::new_v4(),
            user_id: intent.user_id.clone(),
            business_unit_id: intent.business_unit_id.clone(),
            kind: TransactionType::Recharge,
            amount: intent.amount,
            status: TransactionStatus::Completed,
            razorpay_order_id: Some(intent.gateway_ref.clone()),
            razorpay_payment_id: Some(payment_id.to_string()),
            reference_id: Some(reference_id.to_string()),
            description,
            created_at: chrono::Utc::now(),
        };
        state.transactions.push(transaction.clone());

        if let Some(stored) = state.intents.get_mut(reference_id) {
            stored.status = IntentStatus::Credited;
            stored.transaction_id = Some(transaction.id);
        }

        Ok(Some(CreditOutcome::Credited {
            transaction,
            wallet_balance,
        }))
    }

    async fn list_transactions(
        &self,
        scope: &HistoryScope,
        range: &DateRange,
        page: i64,
        limit: i64,
    ) -> Result<TransactionPage> {
        let state = self.state.lock();
        let mut matching: Vec<&Transaction> = state
            .transactions
            .iter()
            .filter(|t| match scope {
                HistoryScope::BusinessUnit(id) => &t.business_unit_id == id,
                HistoryScope::User(id) => &t.user_id == id,
            })
            .filter(|t| range.contains(t.created_at))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let offset = usize::try_from(page_offset(page, limit)).unwrap_or(usize::MAX);
        Ok(TransactionPage {
            total: matching.len() as i64,
            transactions: matching
                .into_iter()
                .skip(offset)
                .take(usize::try_from(limit).unwrap_or(0))
                .cloned()
                .collect(),
            page,
            limit,
        })
    }

    async fn export_transactions(&self, business_unit_id: &str, range: &DateRange) -> Result<Vec<Transaction>> {
        let state = self.state.lock();
        let mut matching: Vec<Transaction> = state
            .transactions
            .iter()
            .filter(|t| t.business_unit_id == business_unit_id && range.contains(t.created_at))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }
}
