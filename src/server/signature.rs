//! `X-Hub-Signature-256` verification.
//!
//! GitHub signs each delivery with HMAC-SHA256 over the raw body and sends
//! `sha256=<hex>`. Verification happens before the body is parsed.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Decodes a `sha256=<hex>` header. Anything else is `None`.
pub fn parse_signature_header(header: &str) -> Option<Vec<u8>> {
    hex::decode(header.trim().strip_prefix("sha256=")?).ok()
}

/// Constant-time check of `signature_header` against `payload`.
pub fn verify_signature(payload: &[u8], signature_header: &str, secret: &[u8]) -> bool {
    let Some(expected) = parse_signature_header(signature_header) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(payload);
    mac.verify_slice(&expected).is_ok()
}

/// The header GitHub would send for `payload`.
#[cfg(test)]
pub fn sign(payload: &[u8], secret: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).unwrap();
    mac.update(payload);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}
