use tea_wallet::gateways::signature::{
    sign_order, sign_payment_link, verify_order_signature, verify_payment_link_signature,
};

const SECRET: &str = "test_secret";
const LINK_SIGNATURE: &str = "138bac3cb1c7edfb7cc76772a08aa884d77a3f94ab54dd2fb8409f46a4ee114b";
const ORDER_SIGNATURE: &str = "b6c247d87924c16697d8cd4d0dcc5beda20c415a770157e8292db099de365613";

#[test]
fn payment_link_signature_matches_known_vector() {
    let sig = sign_payment_link(SECRET, "plink_Abc123", "ref_001", "paid", "pay_Xyz789");
    assert_eq!(sig, LINK_SIGNATURE);
    assert!(verify_payment_link_signature(
        SECRET,
        "plink_Abc123",
        "ref_001",
        "paid",
        "pay_Xyz789",
        LINK_SIGNATURE
    ));
}

#[test]
fn order_signature_matches_known_vector() {
    assert_eq!(sign_order(SECRET, "order_Abc123", "pay_Xyz789"), ORDER_SIGNATURE);
    assert!(verify_order_signature(SECRET, "order_Abc123", "pay_Xyz789", ORDER_SIGNATURE));
}

#[test]
fn any_changed_field_breaks_the_link_signature() {
    assert!(!verify_payment_link_signature(
        SECRET,
        "plink_Abc123",
        "ref_001",
        "partially_paid",
        "pay_Xyz789",
        LINK_SIGNATURE
    ));
    assert!(!verify_payment_link_signature(
        SECRET,
        "plink_Abc123",
        "ref_002",
        "paid",
        "pay_Xyz789",
        LINK_SIGNATURE
    ));
    assert!(!verify_payment_link_signature(
        "other_secret",
        "plink_Abc123",
        "ref_001",
        "paid",
        "pay_Xyz789",
        LINK_SIGNATURE
    ));
}

#[test]
fn malformed_signatures_are_rejected() {
    assert!(!verify_order_signature(SECRET, "order_Abc123", "pay_Xyz789", ""));
    assert!(!verify_order_signature(SECRET, "order_Abc123", "pay_Xyz789", "not-hex"));
    assert!(!verify_order_signature(
        SECRET,
        "order_Abc123",
        "pay_Xyz789",
        &ORDER_SIGNATURE[..32]
    ));
}

#[test]
fn empty_secret_verifies_nothing() {
    let forged = sign_order("", "order_Abc123", "pay_Xyz789");
    assert!(!verify_order_signature("", "order_Abc123", "pay_Xyz789", &forged));
}
