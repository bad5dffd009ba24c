use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tea_wallet::domain::payment::{
    CreateOrderRequest, PaymentLinkCallback, PreparePaymentRequest, PreparedPaymentOrder, VerifyCheckoutRequest,
};
use tea_wallet::domain::wallet::{BusinessUnit, DateRange, IntentStatus};
use tea_wallet::error::RechargeError;
use tea_wallet::gateways::mock::{MockBehavior, MockGateway};
use tea_wallet::gateways::signature::{sign_order, sign_payment_link};
use tea_wallet::http::caller::Caller;
use tea_wallet::prepared::store::InMemoryPreparedOrderStore;
use tea_wallet::repo::memory_wallet_repo::InMemoryWalletRepo;
use tea_wallet::service::recharge_service::{
    validate_amount, RechargeService, RechargeSettings, PAYMENT_LINK_EXPIRY_MARGIN_MINUTES,
};
use tea_wallet::service::wallet_ledger::WalletLedger;

const SECRET: &str = "test_secret";
const USER: &str = "user-1";
const UNIT: &str = "bu-1";

struct Fixture {
    service: RechargeService,
    ledger: InMemoryWalletRepo,
    gateway: MockGateway,
    store: InMemoryPreparedOrderStore,
}

fn fixture_with(balance: Decimal, behavior: MockBehavior) -> Fixture {
    let ledger = InMemoryWalletRepo::new(dec!(5000.00));
    ledger.add_business_unit(BusinessUnit {
        id: UNIT.to_string(),
        name: "Engineering".to_string(),
        wallet_balance: balance,
    });
    ledger.grant_access(USER, UNIT);

    let gateway = MockGateway::new(behavior);
    let store = InMemoryPreparedOrderStore::new();
    let service = RechargeService {
        gateway: Arc::new(gateway.clone()),
        prepared_orders: Arc::new(store.clone()),
        ledger: Arc::new(ledger.clone()),
        settings: RechargeSettings::new(SECRET, Some("https://tea.test/payment-callback".to_string())),
    };

    Fixture {
        service,
        ledger,
        gateway,
        store,
    }
}

fn fixture(balance: Decimal) -> Fixture {
    fixture_with(balance, MockBehavior::AlwaysSuccess)
}

fn prepare_request(amount: Decimal) -> PreparePaymentRequest {
    PreparePaymentRequest {
        business_unit_id: UNIT.to_string(),
        amount,
        contact: Some("9999999999".to_string()),
    }
}

async fn prepare(f: &Fixture, amount: Decimal) -> PreparedPaymentOrder {
    f.service
        .prepare(&Caller::new(USER), prepare_request(amount), Utc::now())
        .await
        .unwrap()
}

fn signed_callback(order: &PreparedPaymentOrder, status: &str, payment_id: &str) -> PaymentLinkCallback {
    PaymentLinkCallback {
        razorpay_payment_id: Some(payment_id.to_string()),
        razorpay_payment_link_id: Some(order.payment_link.id.clone()),
        razorpay_payment_link_reference_id: Some(order.reference_id.clone()),
        razorpay_payment_link_status: Some(status.to_string()),
        razorpay_signature: Some(sign_payment_link(
            SECRET,
            &order.payment_link.id,
            &order.reference_id,
            status,
            payment_id,
        )),
    }
}

#[tokio::test]
async fn paid_callback_credits_wallet_once_even_when_replayed() {
    let f = fixture(dec!(1000.00));
    let order = prepare(&f, dec!(500)).await;
    f.service
        .execute(&Caller::new(USER), &order.reference_id, Utc::now())
        .await
        .unwrap();

    let callback = signed_callback(&order, "paid", "pay_001");
    let first = f.service.verify_callback(&callback).await.unwrap();
    assert!(!first.already_credited);
    assert_eq!(first.wallet_balance, dec!(1500));
    assert_eq!(first.transaction.amount, dec!(500));
    assert_eq!(first.transaction.razorpay_payment_id.as_deref(), Some("pay_001"));

    let replay = f.service.verify_callback(&callback).await.unwrap();
    assert!(replay.already_credited);
    assert_eq!(replay.transaction.id, first.transaction.id);

    assert_eq!(f.ledger.balance(UNIT), Some(dec!(1500)));
    assert_eq!(f.ledger.transaction_count(), 1);
}

#[tokio::test]
async fn concurrent_callbacks_credit_exactly_once() {
    let f = fixture(dec!(0));
    let order = prepare(&f, dec!(250)).await;
    f.service
        .execute(&Caller::new(USER), &order.reference_id, Utc::now())
        .await
        .unwrap();

    let callback = signed_callback(&order, "paid", "pay_002");
    let (a, b) = tokio::join!(
        f.service.verify_callback(&callback),
        f.service.verify_callback(&callback)
    );
    let credited = [a.unwrap(), b.unwrap()]
        .iter()
        .filter(|r| !r.already_credited)
        .count();

    assert_eq!(credited, 1);
    assert_eq!(f.ledger.balance(UNIT), Some(dec!(250)));
}

#[tokio::test]
async fn bad_signature_credits_nothing() {
    let f = fixture(dec!(1000));
    let order = prepare(&f, dec!(100)).await;
    f.service
        .execute(&Caller::new(USER), &order.reference_id, Utc::now())
        .await
        .unwrap();

    let mut callback = signed_callback(&order, "paid", "pay_003");
    callback.razorpay_signature = Some(sign_payment_link("wrong", "a", "b", "paid", "pay_003"));

    let err = f.service.verify_callback(&callback).await.unwrap_err();
    assert!(matches!(err, RechargeError::SignatureInvalid));
    assert_eq!(err.status_code(), 400);
    assert_eq!(f.ledger.balance(UNIT), Some(dec!(1000)));
    assert_eq!(f.ledger.transaction_count(), 0);
}

#[tokio::test]
async fn unpaid_status_is_not_credited() {
    let f = fixture(dec!(1000));
    let order = prepare(&f, dec!(100)).await;
    f.service
        .execute(&Caller::new(USER), &order.reference_id, Utc::now())
        .await
        .unwrap();

    let callback = signed_callback(&order, "partially_paid", "pay_004");
    let err = f.service.verify_callback(&callback).await.unwrap_err();
    assert_eq!(err.error_code(), "PAYMENT_NOT_PAID");
    assert_eq!(f.ledger.balance(UNIT), Some(dec!(1000)));
}

#[tokio::test]
async fn missing_callback_params_are_rejected() {
    let f = fixture(dec!(1000));
    let err = f
        .service
        .verify_callback(&PaymentLinkCallback::default())
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "INVALID_CALLBACK");
}

#[tokio::test]
async fn paid_link_is_credited_even_if_never_executed() {
    let f = fixture(dec!(1000));
    let order = prepare(&f, dec!(100)).await;

    let receipt = f
        .service
        .verify_callback(&signed_callback(&order, "paid", "pay_005"))
        .await
        .unwrap();
    assert!(!receipt.already_credited);
    assert_eq!(f.ledger.balance(UNIT), Some(dec!(1100)));
}

#[tokio::test]
async fn callback_for_unknown_reference_is_not_credited() {
    let f = fixture(dec!(1000));
    let order = prepare(&f, dec!(100)).await;
    let mut stranger = order.clone();
    stranger.reference_id = "ref_unknown".to_string();

    let err = f
        .service
        .verify_callback(&signed_callback(&stranger, "paid", "pay_006"))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "RECHARGE_NOT_FOUND");
    assert_eq!(f.ledger.balance(UNIT), Some(dec!(1000)));
}

#[tokio::test]
async fn expired_prepared_order_is_rejected() {
    let f = fixture(dec!(1000));
    let prepared_at = Utc::now() - Duration::minutes(11);
    let order = f
        .service
        .prepare(&Caller::new(USER), prepare_request(dec!(100)), prepared_at)
        .await
        .unwrap();
    assert_eq!(order.expires_at, prepared_at + Duration::minutes(10));

    let err = f
        .service
        .execute(&Caller::new(USER), &order.reference_id, Utc::now())
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 410);
    assert_eq!(err.error_code(), "PREPARED_ORDER_EXPIRED");

    // The link may still be paid; the intent opened at prepare keeps it creditable.
    let intent = f.ledger.find_intent(&order.reference_id).await.unwrap().unwrap();
    assert_eq!(intent.status, IntentStatus::Pending);
    f.service
        .verify_callback(&signed_callback(&order, "paid", "pay_late"))
        .await
        .unwrap();
    assert_eq!(f.ledger.balance(UNIT), Some(dec!(1100)));
}

#[tokio::test]
async fn execution_at_the_exact_expiry_instant_succeeds() {
    let f = fixture(dec!(1000));
    let order = prepare(&f, dec!(100)).await;

    f.service
        .execute(&Caller::new(USER), &order.reference_id, order.expires_at)
        .await
        .unwrap();
}

#[tokio::test]
async fn prepared_order_is_consumed_by_first_execution() {
    let f = fixture(dec!(1000));
    let order = prepare(&f, dec!(100)).await;
    let caller = Caller::new(USER);

    let resp = f
        .service
        .execute(&caller, &order.reference_id, Utc::now())
        .await
        .unwrap();
    assert_eq!(resp.redirect_url, order.payment_link.short_url);
    assert!(f.store.is_empty());

    let err = f
        .service
        .execute(&caller, &order.reference_id, Utc::now())
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "PREPARED_ORDER_NOT_FOUND");
}

#[tokio::test]
async fn another_user_cannot_execute_the_order() {
    let f = fixture(dec!(1000));
    let order = prepare(&f, dec!(100)).await;

    let err = f
        .service
        .execute(&Caller::new("intruder"), &order.reference_id, Utc::now())
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 403);
    assert_eq!(f.store.len(), 1);

    f.service
        .execute(&Caller::new(USER), &order.reference_id, Utc::now())
        .await
        .unwrap();
}

#[tokio::test]
async fn prepare_sends_paise_and_callback_to_gateway() {
    let f = fixture(dec!(1000));
    let order = prepare(&f, dec!(199.50)).await;

    let requests = f.gateway.link_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].amount_minor, 19_950);
    assert_eq!(requests[0].currency, "INR");
    assert_eq!(requests[0].reference_id, order.reference_id);
    assert_eq!(
        requests[0].callback_url.as_deref(),
        Some("https://tea.test/payment-callback")
    );
    assert_eq!(
        requests[0].expire_by,
        Some((order.expires_at + Duration::minutes(PAYMENT_LINK_EXPIRY_MARGIN_MINUTES)).timestamp())
    );
    assert_eq!(order.user_details.user_id, USER);
}

#[tokio::test]
async fn recharge_above_wallet_limit_is_rejected() {
    let f = fixture(dec!(4800));
    let err = f
        .service
        .prepare(&Caller::new(USER), prepare_request(dec!(500)), Utc::now())
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), "WALLET_LIMIT_EXCEEDED");
    let envelope = serde_json::to_value(err.envelope()).unwrap();
    assert_eq!(envelope["error"]["details"]["max_allowed_recharge"], "200.00");
    assert!(f.gateway.link_requests().is_empty());
}

#[tokio::test]
async fn unassigned_business_unit_is_denied() {
    let f = fixture(dec!(0));
    let err = f
        .service
        .prepare(&Caller::new("someone-else"), prepare_request(dec!(100)), Utc::now())
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "BUSINESS_UNIT_ACCESS_DENIED");
}

#[tokio::test]
async fn gateway_timeout_surfaces_as_504_and_stores_nothing() {
    let f = fixture_with(dec!(0), MockBehavior::AlwaysTimeout);
    let err = f
        .service
        .prepare(&Caller::new(USER), prepare_request(dec!(100)), Utc::now())
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 504);
    assert!(f.store.is_empty());
}

#[test]
fn amounts_must_be_positive_whole_paise() {
    assert_eq!(validate_amount(dec!(500)).unwrap(), 50_000);
    assert_eq!(validate_amount(dec!(0.01)).unwrap(), 1);
    assert_eq!(validate_amount(dec!(12.50)).unwrap(), 1_250);
    assert!(validate_amount(dec!(0)).is_err());
    assert!(validate_amount(dec!(-5)).is_err());
    assert!(validate_amount(dec!(1.005)).is_err());
}

#[test]
fn oversized_amounts_are_rejected_not_overflowed() {
    let err = validate_amount(Decimal::MAX).unwrap_err();
    assert_eq!(err.error_code(), "INVALID_AMOUNT");
    assert!(validate_amount(Decimal::from(i64::MAX)).is_err());
}

#[tokio::test]
async fn checkout_payment_is_credited_once() {
    let f = fixture(dec!(100));
    let caller = Caller::new(USER);
    let created = f
        .service
        .create_order(
            &caller,
            CreateOrderRequest {
                business_unit_id: UNIT.to_string(),
                amount: dec!(300),
            },
        )
        .await
        .unwrap();
    assert_eq!(created.order.amount_minor, 30_000);
    assert_eq!(created.key_id, "rzp_test_mock");

    let verify = VerifyCheckoutRequest {
        razorpay_order_id: created.order.id.clone(),
        razorpay_payment_id: "pay_100".to_string(),
        razorpay_signature: sign_order(SECRET, &created.order.id, "pay_100"),
        amount: dec!(300),
        business_unit_id: UNIT.to_string(),
    };

    let first = f.service.verify_checkout(&caller, verify.clone()).await.unwrap();
    let second = f.service.verify_checkout(&caller, verify).await.unwrap();
    assert!(!first.already_credited);
    assert!(second.already_credited);
    assert_eq!(f.ledger.balance(UNIT), Some(dec!(400)));
    assert_eq!(
        first.transaction.razorpay_order_id.as_deref(),
        Some(created.order.id.as_str())
    );
}

#[tokio::test]
async fn checkout_amount_must_match_order() {
    let f = fixture(dec!(100));
    let caller = Caller::new(USER);
    let created = f
        .service
        .create_order(
            &caller,
            CreateOrderRequest {
                business_unit_id: UNIT.to_string(),
                amount: dec!(300),
            },
        )
        .await
        .unwrap();

    let err = f
        .service
        .verify_checkout(
            &caller,
            VerifyCheckoutRequest {
                razorpay_order_id: created.order.id.clone(),
                razorpay_payment_id: "pay_101".to_string(),
                razorpay_signature: sign_order(SECRET, &created.order.id, "pay_101"),
                amount: dec!(3000),
                business_unit_id: UNIT.to_string(),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "AMOUNT_MISMATCH");
    assert_eq!(f.ledger.balance(UNIT), Some(dec!(100)));
}

#[tokio::test]
async fn callbacks_are_refused_without_a_gateway_secret() {
    let mut f = fixture(dec!(1000));
    f.service.settings = RechargeSettings::new("", None);
    let order = prepare(&f, dec!(500)).await;
    f.service
        .execute(&Caller::new(USER), &order.reference_id, Utc::now())
        .await
        .unwrap();

    let forged = PaymentLinkCallback {
        razorpay_signature: Some(sign_payment_link(
            "",
            &order.payment_link.id,
            &order.reference_id,
            "paid",
            "pay_forged",
        )),
        ..signed_callback(&order, "paid", "pay_forged")
    };
    let err = f.service.verify_callback(&forged).await.unwrap_err();
    assert_eq!(err.status_code(), 503);
    assert_eq!(err.error_code(), "PAYMENTS_UNAVAILABLE");

    let err = f
        .service
        .verify_checkout(
            &Caller::new(USER),
            VerifyCheckoutRequest {
                razorpay_order_id: "order_x".to_string(),
                razorpay_payment_id: "pay_forged".to_string(),
                razorpay_signature: sign_order("", "order_x", "pay_forged"),
                amount: dec!(500),
                business_unit_id: UNIT.to_string(),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "PAYMENTS_UNAVAILABLE");
    assert_eq!(f.ledger.balance(UNIT), Some(dec!(1000)));
    assert_eq!(f.ledger.transaction_count(), 0);
}

#[tokio::test]
async fn callback_with_foreign_link_id_is_rejected() {
    let f = fixture(dec!(1000));
    let order = prepare(&f, dec!(100)).await;
    let mut other_link = order.clone();
    other_link.payment_link.id = "plink_someone_else".to_string();

    let err = f
        .service
        .verify_callback(&signed_callback(&other_link, "paid", "pay_007"))
        .await
        .unwrap_err();
    assert!(matches!(err, RechargeError::SignatureInvalid));
    assert_eq!(f.ledger.balance(UNIT), Some(dec!(1000)));
}

async fn checkout_order(f: &Fixture, amount: Decimal) -> String {
    f.service
        .create_order(
            &Caller::new(USER),
            CreateOrderRequest {
                business_unit_id: UNIT.to_string(),
                amount,
            },
        )
        .await
        .unwrap()
        .order
        .id
}

#[tokio::test]
async fn checkout_cannot_be_verified_by_another_user() {
    let f = fixture(dec!(100));
    let order_id = checkout_order(&f, dec!(300)).await;
    f.ledger.grant_access("mallory", UNIT);

    let err = f
        .service
        .verify_checkout(
            &Caller::new("mallory"),
            VerifyCheckoutRequest {
                razorpay_order_id: order_id.clone(),
                razorpay_payment_id: "pay_200".to_string(),
                razorpay_signature: sign_order(SECRET, &order_id, "pay_200"),
                amount: dec!(300),
                business_unit_id: UNIT.to_string(),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 403);
    assert_eq!(f.ledger.balance(UNIT), Some(dec!(100)));
}

#[tokio::test]
async fn checkout_cannot_be_redirected_to_another_business_unit() {
    let f = fixture(dec!(100));
    f.ledger.add_business_unit(BusinessUnit {
        id: "bu-2".to_string(),
        name: "Sales".to_string(),
        wallet_balance: dec!(0),
    });
    f.ledger.grant_access(USER, "bu-2");
    let order_id = checkout_order(&f, dec!(300)).await;

    let err = f
        .service
        .verify_checkout(
            &Caller::new(USER),
            VerifyCheckoutRequest {
                razorpay_order_id: order_id.clone(),
                razorpay_payment_id: "pay_201".to_string(),
                razorpay_signature: sign_order(SECRET, &order_id, "pay_201"),
                amount: dec!(300),
                business_unit_id: "bu-2".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 403);
    assert_eq!(f.ledger.balance("bu-2"), Some(dec!(0)));
    assert_eq!(f.ledger.balance(UNIT), Some(dec!(100)));
}

async fn credited_recharge(f: &Fixture, amount: Decimal, payment_id: &str) {
    let order = prepare(f, amount).await;
    f.service
        .verify_callback(&signed_callback(&order, "paid", payment_id))
        .await
        .unwrap();
}

#[tokio::test]
async fn huge_page_numbers_return_an_empty_page() {
    let f = fixture(dec!(0));
    credited_recharge(&f, dec!(10), "pay_300").await;

    let page = f
        .service
        .transactions(&Caller::new(USER), UNIT, &DateRange::default(), i64::MAX, 20)
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert!(page.transactions.is_empty());
    assert_eq!(page.page, i64::MAX);
}

#[tokio::test]
async fn history_is_filtered_by_date_and_scoped_to_the_user() {
    let f = fixture(dec!(0));
    credited_recharge(&f, dec!(10), "pay_310").await;
    credited_recharge(&f, dec!(20), "pay_311").await;

    let today = Utc::now().date_naive();
    let yesterday = today.pred_opt().unwrap();
    let caller = Caller::new(USER);

    let todays = DateRange::from_dates(Some(today), Some(today)).unwrap();
    let page = f.service.transactions(&caller, UNIT, &todays, 1, 20).await.unwrap();
    assert_eq!(page.total, 2);

    let earlier = DateRange::from_dates(None, Some(yesterday)).unwrap();
    let page = f.service.transactions(&caller, UNIT, &earlier, 1, 20).await.unwrap();
    assert_eq!(page.total, 0);

    assert!(DateRange::from_dates(Some(today), Some(yesterday)).is_none());

    let mine = f
        .service
        .user_transactions(&caller, &DateRange::default(), 1, 1)
        .await
        .unwrap();
    assert_eq!(mine.total, 2);
    assert_eq!(mine.transactions.len(), 1);

    let theirs = f
        .service
        .user_transactions(&Caller::new("someone-else"), &DateRange::default(), 1, 20)
        .await
        .unwrap();
    assert_eq!(theirs.total, 0);
}

#[tokio::test]
async fn export_renders_csv_for_accessible_units() {
    let f = fixture(dec!(0));
    let caller = Caller::new(USER);

    let err = f
        .service
        .export(&caller, UNIT, &DateRange::default(), Utc::now())
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "NO_RECHARGE_DATA");

    credited_recharge(&f, dec!(250.50), "pay_320").await;
    let export = f
        .service
        .export(&caller, UNIT, &DateRange::default(), Utc::now())
        .await
        .unwrap();
    assert_eq!(export.rows, 1);
    assert!(export.filename.starts_with("recharge-history_Engineering_bu-1_"));
    assert!(export.filename.ends_with(".csv"));

    let csv = String::from_utf8(export.content).unwrap();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("Date,Time,Recharged By,Amount,Type,Status,Payment ID,Description")
    );
    let row = lines.next().unwrap();
    assert!(row.contains("user-1,₹250.50,recharge,completed,pay_320"));

    let err = f
        .service
        .export(&Caller::new("someone-else"), UNIT, &DateRange::default(), Utc::now())
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "BUSINESS_UNIT_ACCESS_DENIED");
}
