use crate::domain::wallet::{
    BusinessUnit, CreditOutcome, DateRange, HistoryScope, IntentStatus, RechargeIntent, Transaction, TransactionPage,
    TransactionStatus, TransactionType,
};
use crate::service::wallet_ledger::{
    default_max_wallet_balance, page_offset, recharge_description, WalletLedger,
};
use anyhow::{anyhow, Result};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Clone)]
pub struct WalletRepo {
    pub pool: PgPool,
}

const TRANSACTION_COLUMNS: &str = "id, user_id, business_unit_id, type, amount, status, razorpay_order_id, \
     razorpay_payment_id, reference_id, description, created_at";

/// Binds `$2` (inclusive start) and `$3` (exclusive end); NULL leaves a side open.
const RANGE_FILTER: &str =
    "AND ($2::timestamptz IS NULL OR created_at >= $2) AND ($3::timestamptz IS NULL OR created_at < $3)";

fn map_transaction(r: &PgRow) -> Result<Transaction> {
    let kind: String = r.get("type");
    let status: String = r.get("status");
    Ok(Transaction {
        id: r.get("id"),
        user_id: r.get("user_id"),
        business_unit_id: r.get("business_unit_id"),
        kind: TransactionType::parse(&kind).ok_or_else(|| anyhow!("unknown transaction type {}", kind))?,
        amount: r.get("amount"),
        status: TransactionStatus::parse(&status).ok_or_else(|| anyhow!("unknown transaction status {}", status))?,
        razorpay_order_id: r.get("razorpay_order_id"),
        razorpay_payment_id: r.get("razorpay_payment_id"),
        reference_id: r.get("reference_id"),
        description: r.get("description"),
        created_at: r.get("created_at"),
    })
}

impl WalletRepo {
    async fn credited_outcome(&self, reference_id: &str) -> Result<Option<CreditOutcome>> {
        let row = sqlx::query(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE reference_id = $1"
        ))
        .bind(reference_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let transaction = map_transaction(&row)?;
        let wallet_balance: Decimal = sqlx::query("SELECT wallet_balance FROM business_units WHERE id = $1")
            .bind(&transaction.business_unit_id)
            .fetch_one(&self.pool)
            .await?
            .get("wallet_balance");

        Ok(Some(CreditOutcome::AlreadyCredited {
            transaction,
            wallet_balance,
        }))
    }
}

#[async_trait::async_trait]
impl WalletLedger for WalletRepo {
    async fn business_unit_for_user(&self, user_id: &str, business_unit_id: &str) -> Result<Option<BusinessUnit>> {
        let row = sqlx::query(
            r#"
            SELECT bu.id, bu.name, bu.wallet_balance
            FROM business_units bu
            JOIN user_business_units ubu ON ubu.business_unit_id = bu.id
            WHERE ubu.user_id = $1 AND bu.id = $2
            "#,
        )
        .bind(user_id)
        .bind(business_unit_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| BusinessUnit {
            id: r.get("id"),
            name: r.get("name"),
            wallet_balance: r.get("wallet_balance"),
        }))
    }

    async fn max_wallet_balance(&self) -> Result<Decimal> {
        let value: Option<String> = sqlx::query("SELECT value FROM system_settings WHERE key = 'max_wallet_balance'")
            .fetch_optional(&self.pool)
            .await?
            .map(|r| r.get("value"));

        Ok(value
            .and_then(|v| Decimal::from_str(v.trim()).ok())
            .unwrap_or(default_max_wallet_balance()))
    }

    async fn open_intent(&self, intent: &RechargeIntent) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO recharge_intents (reference_id, business_unit_id, user_id, amount, gateway_ref, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (reference_id) DO NOTHING
            "#,
        )
        .bind(&intent.reference_id)
        .bind(&intent.business_unit_id)
        .bind(&intent.user_id)
        .bind(intent.amount)
        .bind(&intent.gateway_ref)
        .bind(intent.status.as_str())
        .bind(intent.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_intent(&self, reference_id: &str) -> Result<Option<RechargeIntent>> {
        let row = sqlx::query(
            r#"
            SELECT reference_id, business_unit_id, user_id, amount, gateway_ref, status, transaction_id, created_at
            FROM recharge_intents
            WHERE reference_id = $1
            "#,
        )
        .bind(reference_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| {
            let status: String = r.get("status");
            RechargeIntent {
                reference_id: r.get("reference_id"),
                business_unit_id: r.get("business_unit_id"),
                user_id: r.get("user_id"),
                amount: r.get("amount"),
                gateway_ref: r.get("gateway_ref"),
                status: IntentStatus::parse(&status),
                transaction_id: r.get("transaction_id"),
                created_at: r.get("created_at"),
            }
        }))
    }

    async fn credit_recharge(&self, reference_id: &str, payment_id: &str) -> Result<Option<CreditOutcome>> {
        let mut tx = self.pool.begin().await?;

        // The row lock taken here serialises concurrent callbacks for the
        // same reference; the loser sees CREDITED and claims nothing.
        let claimed = sqlx::query(
            r#"
            UPDATE recharge_intents
            SET status = 'CREDITED', updated_at = now()
            WHERE reference_id = $1 AND status = 'PENDING'
            RETURNING business_unit_id, user_id, amount, gateway_ref
            "#,
        )
        .bind(reference_id)
        .fetch_optional(tx.as_mut())
        .await?;

        let Some(claimed) = claimed else {
            tx.rollback().await?;
            return self.credited_outcome(reference_id).await;
        };

        let business_unit_id: String = claimed.get("business_unit_id");
        let user_id: String = claimed.get("user_id");
        let amount: Decimal = claimed.get("amount");
        let gateway_ref: String = claimed.get("gateway_ref");

        let unit = sqlx::query(
            r#"
            UPDATE business_units
            SET wallet_balance = wallet_balance + $2, updated_at = now()
            WHERE id = $1
            RETURNING name, wallet_balance
            "#,
        )
        .bind(&business_unit_id)
        .bind(amount)
        .fetch_one(tx.as_mut())
        .await?;
        let name: String = unit.get("name");
        let wallet_balance: Decimal = unit.get("wallet_balance");

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO transactions (
                id, user_id, business_unit_id, type, amount, status,
                razorpay_order_id, razorpay_payment_id, reference_id, description, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, now())
            RETURNING {TRANSACTION_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&user_id)
        .bind(&business_unit_id)
        .bind(TransactionType::Recharge.as_str())
        .bind(amount)
        .bind(TransactionStatus::Completed.as_str())
        .bind(&gateway_ref)
        .bind(payment_id)
        .bind(reference_id)
        .bind(recharge_description(&name))
        .fetch_one(tx.as_mut())
        .await?;
        let transaction = map_transaction(&row)?;

        sqlx::query("UPDATE recharge_intents SET transaction_id = $2 WHERE reference_id = $1")
            .bind(reference_id)
            .bind(transaction.id)
            .execute(tx.as_mut())
            .await?;

        tx.commit().await?;

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
        let (column, key) = match scope {
            HistoryScope::BusinessUnit(id) => ("business_unit_id", id),
            HistoryScope::User(id) => ("user_id", id),
        };

        let total: i64 = sqlx::query(&format!(
            r#"
            SELECT COUNT(*) AS total
            FROM transactions
            WHERE {column} = $1 {RANGE_FILTER}
            "#
        ))
        .bind(key)
        .bind(range.from)
        .bind(range.until)
        .fetch_one(&self.pool)
        .await?
        .get("total");

        let rows = sqlx::query(&format!(
            r#"
            SELECT {TRANSACTION_COLUMNS}
            FROM transactions
            WHERE {column} = $1 {RANGE_FILTER}
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#
        ))
        .bind(key)
        .bind(range.from)
        .bind(range.until)
        .bind(limit)
        .bind(page_offset(page, limit))
        .fetch_all(&self.pool)
        .await?;

        let transactions = rows.iter().map(map_transaction).collect::<Result<Vec<_>>>()?;
        Ok(TransactionPage {
            transactions,
            total,
            page,
            limit,
        })
    }

    async fn export_transactions(&self, business_unit_id: &str, range: &DateRange) -> Result<Vec<Transaction>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {TRANSACTION_COLUMNS}
            FROM transactions
            WHERE business_unit_id = $1 {RANGE_FILTER}
            ORDER BY created_at DESC
            "#
        ))
        .bind(business_unit_id)
        .bind(range.from)
        .bind(range.until)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_transaction).collect()
    }

    async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}
