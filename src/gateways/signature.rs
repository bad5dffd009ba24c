//! Razorpay callback signatures: hex HMAC-SHA256 keyed with the account secret.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

fn keyed(secret: &str, payload: &str) -> Option<HmacSha256> {
    // HMAC accepts keys of any length, so this only fails on a broken build.
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(payload.as_bytes());
    Some(mac)
}

fn sign(secret: &str, payload: &str) -> String {
    keyed(secret, payload)
        .map(|mac| hex::encode(mac.finalize().into_bytes()))
        .unwrap_or_default()
}

/// Constant-time comparison against the hex signature the gateway sent. An
/// empty secret verifies nothing.
fn verify(secret: &str, payload: &str, signature: &str) -> bool {
    if secret.is_empty() {
        return false;
    }
    let Ok(provided) = hex::decode(signature.trim()) else {
        return false;
    };
    keyed(secret, payload)
        .map(|mac| mac.verify_slice(&provided).is_ok())
        .unwrap_or(false)
}

fn payment_link_payload(link_id: &str, reference_id: &str, status: &str, payment_id: &str) -> String {
    format!("{link_id}|{reference_id}|{status}|{payment_id}")
}

pub fn sign_payment_link(
    secret: &str,
    link_id: &str,
    reference_id: &str,
    status: &str,
    payment_id: &str,
) -> String {
    sign(secret, &payment_link_payload(link_id, reference_id, status, payment_id))
}

pub fn verify_payment_link_signature(
    secret: &str,
    link_id: &str,
    reference_id: &str,
    status: &str,
    payment_id: &str,
    signature: &str,
) -> bool {
    verify(
        secret,
        &payment_link_payload(link_id, reference_id, status, payment_id),
        signature,
    )
}

pub fn sign_order(secret: &str, order_id: &str, payment_id: &str) -> String {
    sign(secret, &format!("{order_id}|{payment_id}"))
}

pub fn verify_order_signature(secret: &str, order_id: &str, payment_id: &str, signature: &str) -> bool {
    verify(secret, &format!("{order_id}|{payment_id}"), signature)
}
