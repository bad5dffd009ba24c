use crate::domain::payment::{
    CreateOrderRequest, CreateOrderResponse, ExecutePaymentResponse, PaymentLinkCallback, PreparePaymentRequest,
    PreparedPaymentOrder, RechargeReceipt, VerifyCheckoutRequest, PREPARED_ORDER_TTL_MINUTES,
};
use crate::domain::wallet::{
    BusinessUnit, CreditOutcome, DateRange, HistoryScope, RechargeIntent, TransactionPage, WalletBalance,
};
use crate::error::RechargeError;
use crate::gateways::signature::{verify_order_signature, verify_payment_link_signature};
use crate::gateways::{CustomerDetails, OrderRequest, PaymentGateway, PaymentLinkRequest, DEFAULT_CURRENCY};
use crate::http::caller::Caller;
use crate::prepared::store::PreparedOrderStore;
use crate::service::recharge_export::{export_filename, render_csv, RechargeExport};
use crate::service::wallet_ledger::WalletLedger;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;

pub const PAID_STATUS: &str = "paid";
pub const MAX_PAGE_SIZE: i64 = 100;

/// How long a payment link stays payable after its prepared order expires.
/// Razorpay rejects an `expire_by` less than 15 minutes away.
pub const PAYMENT_LINK_EXPIRY_MARGIN_MINUTES: i64 = 10;

#[derive(Clone)]
pub struct RechargeSettings {
    pub key_secret: String,
    pub callback_url: Option<String>,
    pub prepared_order_ttl: Duration,
}

impl RechargeSettings {
    pub fn new(key_secret: &str, callback_url: Option<String>) -> Self {
        Self {
            key_secret: key_secret.to_string(),
            callback_url,
            prepared_order_ttl: Duration::minutes(PREPARED_ORDER_TTL_MINUTES),
        }
    }
}

/// Wallet recharge saga: prepare a payment link, execute it once, then credit
/// the wallet when the gateway calls back with a valid signature.
///
/// The recharge intent is recorded when the link is created, so a paid link is
/// always creditable even if the redirect never happened.
#[derive(Clone)]
pub struct RechargeService {
    pub gateway: Arc<dyn PaymentGateway>,
    pub prepared_orders: Arc<dyn PreparedOrderStore>,
    pub ledger: Arc<dyn WalletLedger>,
    pub settings: RechargeSettings,
}

impl RechargeService {
    pub async fn prepare(
        &self,
        caller: &Caller,
        req: PreparePaymentRequest,
        now: DateTime<Utc>,
    ) -> Result<PreparedPaymentOrder, RechargeError> {
        let amount_minor = validate_amount(req.amount)?;
        let unit = self.accessible_unit(caller, &req.business_unit_id).await?;
        self.check_wallet_limit(&unit, req.amount).await?;

        let reference_id = format!("ref_{}", uuid::Uuid::new_v4().simple());
        let user_details = caller.user_details(req.contact.clone());
        let link_expires_at =
            now + self.settings.prepared_order_ttl + Duration::minutes(PAYMENT_LINK_EXPIRY_MARGIN_MINUTES);
        let link = self
            .gateway
            .create_payment_link(PaymentLinkRequest {
                amount_minor,
                currency: DEFAULT_CURRENCY.to_string(),
                description: "Wallet Recharge".to_string(),
                reference_id: reference_id.clone(),
                customer: Some(CustomerDetails {
                    name: user_details.name.clone(),
                    email: user_details.email.clone(),
                    contact: user_details.contact.clone(),
                }),
                callback_url: self.settings.callback_url.clone(),
                expire_by: Some(link_expires_at.timestamp()),
            })
            .await?;

        let order = PreparedPaymentOrder::new(
            link,
            req.amount,
            unit.id.clone(),
            reference_id,
            user_details,
            now,
            self.settings.prepared_order_ttl,
        );

        let intent = RechargeIntent::pending(
            &order.reference_id,
            &order.business_unit_id,
            &order.user_details.user_id,
            order.amount,
            &order.payment_link.id,
            now,
        );
        self.ledger.open_intent(&intent).await?;
        self.prepared_orders.save(&order).await?;

        tracing::info!(
            reference_id = %order.reference_id,
            business_unit_id = %order.business_unit_id,
            amount = %order.amount,
            payment_link_id = %order.payment_link.id,
            "payment link prepared"
        );
        Ok(order)
    }

    pub async fn execute(
        &self,
        caller: &Caller,
        reference_id: &str,
        now: DateTime<Utc>,
    ) -> Result<ExecutePaymentResponse, RechargeError> {
        let order = self
            .prepared_orders
            .get(reference_id)
            .await?
            .ok_or_else(|| RechargeError::PreparedOrderNotFound(reference_id.to_string()))?;

        if order.user_details.user_id != caller.user_id {
            return Err(RechargeError::Forbidden(
                "prepared order belongs to another user".to_string(),
            ));
        }

        if order.is_expired(now) {
            return Err(RechargeError::PreparedOrderExpired {
                reference_id: order.reference_id,
                expired_at: order.expires_at,
            });
        }

        // A concurrent execution by the owner may have consumed it first.
        let order = self
            .prepared_orders
            .take(reference_id)
            .await?
            .ok_or_else(|| RechargeError::PreparedOrderNotFound(reference_id.to_string()))?;

        tracing::info!(reference_id = %order.reference_id, "redirecting to hosted checkout");
        Ok(ExecutePaymentResponse {
            reference_id: order.reference_id,
            redirect_url: order.payment_link.short_url,
        })
    }

    pub async fn verify_callback(&self, params: &PaymentLinkCallback) -> Result<RechargeReceipt, RechargeError> {
        self.ensure_verifiable()?;
        let payment_id = required(&params.razorpay_payment_id, "razorpay_payment_id")?;
        let link_id = required(&params.razorpay_payment_link_id, "razorpay_payment_link_id")?;
        let reference_id = required(
            &params.razorpay_payment_link_reference_id,
            "razorpay_payment_link_reference_id",
        )?;
        let status = required(&params.razorpay_payment_link_status, "razorpay_payment_link_status")?;
        let signature = required(&params.razorpay_signature, "razorpay_signature")?;

        if !verify_payment_link_signature(
            &self.settings.key_secret,
            link_id,
            reference_id,
            status,
            payment_id,
            signature,
        ) {
            tracing::warn!(reference_id, payment_id, "payment link signature mismatch");
            return Err(RechargeError::SignatureInvalid);
        }

        if status != PAID_STATUS {
            return Err(RechargeError::PaymentNotPaid(status.to_string()));
        }

        let intent = self
            .ledger
            .find_intent(reference_id)
            .await?
            .ok_or_else(|| RechargeError::RechargeNotFound(reference_id.to_string()))?;

        if intent.gateway_ref != link_id {
            tracing::warn!(
                reference_id,
                expected = %intent.gateway_ref,
                received = link_id,
                "payment link id does not match recharge"
            );
            return Err(RechargeError::SignatureInvalid);
        }

        self.credit(reference_id, payment_id).await
    }

    pub async fn create_order(
        &self,
        caller: &Caller,
        req: CreateOrderRequest,
    ) -> Result<CreateOrderResponse, RechargeError> {
        let amount_minor = validate_amount(req.amount)?;
        let unit = self.accessible_unit(caller, &req.business_unit_id).await?;
        self.check_wallet_limit(&unit, req.amount).await?;

        let order = self
            .gateway
            .create_order(OrderRequest {
                amount_minor,
                currency: DEFAULT_CURRENCY.to_string(),
                receipt: format!("receipt_{}", Utc::now().timestamp_millis()),
            })
            .await?;

        let intent = RechargeIntent::pending(
            &order.id,
            &unit.id,
            &caller.user_id,
            req.amount,
            &order.id,
            Utc::now(),
        );
        self.ledger.open_intent(&intent).await?;

        tracing::info!(order_id = %order.id, business_unit_id = %unit.id, amount = %req.amount, "checkout order created");
        Ok(CreateOrderResponse {
            success: true,
            key_id: self.gateway.key_id().to_string(),
            order,
        })
    }

    pub async fn verify_checkout(
        &self,
        caller: &Caller,
        req: VerifyCheckoutRequest,
    ) -> Result<RechargeReceipt, RechargeError> {
        self.ensure_verifiable()?;
        if !verify_order_signature(
            &self.settings.key_secret,
            &req.razorpay_order_id,
            &req.razorpay_payment_id,
            &req.razorpay_signature,
        ) {
            tracing::warn!(order_id = %req.razorpay_order_id, "checkout signature mismatch");
            return Err(RechargeError::SignatureInvalid);
        }

        let intent = self
            .ledger
            .find_intent(&req.razorpay_order_id)
            .await?
            .ok_or_else(|| RechargeError::RechargeNotFound(req.razorpay_order_id.clone()))?;

        if intent.user_id != caller.user_id || intent.business_unit_id != req.business_unit_id {
            return Err(RechargeError::Forbidden(
                "order was created for another user or business unit".to_string(),
            ));
        }
        if intent.amount != req.amount {
            return Err(RechargeError::AmountMismatch {
                expected: intent.amount,
                received: req.amount,
            });
        }

        self.credit(&req.razorpay_order_id, &req.razorpay_payment_id).await
    }

    pub async fn balance(&self, caller: &Caller, business_unit_id: &str) -> Result<WalletBalance, RechargeError> {
        let unit = self.accessible_unit(caller, business_unit_id).await?;
        let max_wallet_balance = self.ledger.max_wallet_balance().await?;
        Ok(WalletBalance {
            business_unit_id: unit.id,
            name: unit.name,
            wallet_balance: unit.wallet_balance,
            max_wallet_balance,
        })
    }

    pub async fn transactions(
        &self,
        caller: &Caller,
        business_unit_id: &str,
        range: &DateRange,
        page: i64,
        limit: i64,
    ) -> Result<TransactionPage, RechargeError> {
        let unit = self.accessible_unit(caller, business_unit_id).await?;
        let (page, limit) = page_bounds(page, limit);
        Ok(self
            .ledger
            .list_transactions(&HistoryScope::BusinessUnit(unit.id), range, page, limit)
            .await?)
    }

    /// Recharges made by the caller across every business unit.
    pub async fn user_transactions(
        &self,
        caller: &Caller,
        range: &DateRange,
        page: i64,
        limit: i64,
    ) -> Result<TransactionPage, RechargeError> {
        let (page, limit) = page_bounds(page, limit);
        Ok(self
            .ledger
            .list_transactions(&HistoryScope::User(caller.user_id.clone()), range, page, limit)
            .await?)
    }

    pub async fn export(
        &self,
        caller: &Caller,
        business_unit_id: &str,
        range: &DateRange,
        now: DateTime<Utc>,
    ) -> Result<RechargeExport, RechargeError> {
        let unit = self.accessible_unit(caller, business_unit_id).await?;
        let transactions = self.ledger.export_transactions(&unit.id, range).await?;
        if transactions.is_empty() {
            return Err(RechargeError::NoRechargeData);
        }

        let content = render_csv(&transactions)?;
        let filename = export_filename(&unit.name, &unit.id, range, now);
        tracing::info!(business_unit_id = %unit.id, rows = transactions.len(), filename = %filename, "recharge history exported");
        Ok(RechargeExport {
            filename,
            content,
            rows: transactions.len(),
        })
    }

    /// Without a secret every signature would be forgeable.
    fn ensure_verifiable(&self) -> Result<(), RechargeError> {
        if self.settings.key_secret.is_empty() {
            tracing::error!("payment verification attempted without a gateway secret");
            return Err(RechargeError::PaymentsUnavailable);
        }
        Ok(())
    }

    async fn credit(&self, reference_id: &str, payment_id: &str) -> Result<RechargeReceipt, RechargeError> {
        let outcome = self
            .ledger
            .credit_recharge(reference_id, payment_id)
            .await?
            .ok_or_else(|| RechargeError::RechargeNotFound(reference_id.to_string()))?;

        match outcome {
            CreditOutcome::Credited {
                transaction,
                wallet_balance,
            } => {
                tracing::info!(
                    reference_id,
                    payment_id,
                    transaction_id = %transaction.id,
                    amount = %transaction.amount,
                    wallet_balance = %wallet_balance,
                    "wallet credited"
                );
                Ok(RechargeReceipt {
                    transaction,
                    wallet_balance,
                    already_credited: false,
                })
            }
            CreditOutcome::AlreadyCredited {
                transaction,
                wallet_balance,
            } => {
                tracing::info!(reference_id, payment_id, "duplicate callback, wallet already credited");
                Ok(RechargeReceipt {
                    transaction,
                    wallet_balance,
                    already_credited: true,
                })
            }
        }
    }

    async fn accessible_unit(&self, caller: &Caller, business_unit_id: &str) -> Result<BusinessUnit, RechargeError> {
        self.ledger
            .business_unit_for_user(&caller.user_id, business_unit_id)
            .await?
            .ok_or_else(|| RechargeError::BusinessUnitAccessDenied(business_unit_id.to_string()))
    }

    async fn check_wallet_limit(&self, unit: &BusinessUnit, amount: Decimal) -> Result<(), RechargeError> {
        let max_balance = self.ledger.max_wallet_balance().await?;
        if unit.wallet_balance + amount > max_balance {
            return Err(RechargeError::WalletLimitExceeded {
                business_unit: unit.name.clone(),
                max_balance,
                current_balance: unit.wallet_balance,
            });
        }
        Ok(())
    }
}

/// Converts rupees to paise, rejecting amounts the gateway cannot charge.
pub fn validate_amount(amount: Decimal) -> Result<i64, RechargeError> {
    if amount <= Decimal::ZERO {
        return Err(RechargeError::InvalidAmount("amount must be greater than zero".to_string()));
    }
    if amount.normalize().scale() > 2 {
        return Err(RechargeError::InvalidAmount(
            "amount cannot have more than two decimal places".to_string(),
        ));
    }
    amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|paise| paise.to_i64())
        .ok_or_else(|| RechargeError::InvalidAmount("amount is too large".to_string()))
}

fn page_bounds(page: i64, limit: i64) -> (i64, i64) {
    (page.max(1), limit.clamp(1, MAX_PAGE_SIZE))
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, RechargeError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| RechargeError::InvalidCallback(format!("missing {}", name)))
}
