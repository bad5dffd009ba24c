#[test]
fn internal_api_key_has_a_default() {
    let cfg = tea_wallet::config::AppConfig::from_env();
    assert!(!cfg.internal_api_key.is_empty());
}

#[test]
fn prepared_orders_live_ten_minutes_by_default() {
    if std::env::var("PREPARED_ORDER_TTL_SECS").is_err() {
        let cfg = tea_wallet::config::AppConfig::from_env();
        assert_eq!(cfg.prepared_order_ttl_secs, 600);
    }
}

#[test]
fn wallet_cap_defaults_to_five_thousand_rupees() {
    assert_eq!(
        tea_wallet::service::wallet_ledger::default_max_wallet_balance(),
        rust_decimal_macros::dec!(5000.00)
    );
}
