//! Webhook delivery signatures (HMAC-SHA256).
//!
//! GitHub signs each delivery body with the webhook secret and sends the
//! result in `X-Hub-Signature-256` as `sha256=<hex>`. Deliveries whose
//! signature does not verify are rejected before the body is parsed.

use std::fmt;

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const HEADER_PREFIX: &str = "sha256=";

/// The shared webhook secret.
///
/// `Debug` never prints the secret bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct WebhookSecret(Vec<u8>);

impl WebhookSecret {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        WebhookSecret(secret.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Signs `payload` and returns the `X-Hub-Signature-256` header value.
    pub fn sign(&self, payload: &[u8]) -> String {
        format_signature_header(&compute_signature(payload, &self.0))
    }

    /// Checks a delivery's signature header against its body.
    pub fn verify(&self, payload: &[u8], signature_header: &str) -> bool {
        verify_signature(payload, signature_header, &self.0)
    }
}

impl fmt::Debug for WebhookSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WebhookSecret(<{} bytes>)", self.0.len())
    }
}

/// Decodes a `sha256=<hex>` header into the raw digest.
///
/// Returns `None` for any other shape. Never panics.
///
/// ```
/// use issue_bot::webhooks::parse_signature_header;
///
/// assert_eq!(parse_signature_header("sha256=00ff"), Some(vec![0x00, 0xff]));
/// assert!(parse_signature_header("sha1=00ff").is_none());
/// assert!(parse_signature_header("sha256=0g").is_none());
/// ```
pub fn parse_signature_header(header: &str) -> Option<Vec<u8>> {
    hex::decode(header.strip_prefix(HEADER_PREFIX)?).ok()
}

/// Computes the HMAC-SHA256 digest of `payload` under `secret`.
pub fn compute_signature(payload: &[u8], secret: &[u8]) -> Vec<u8> {
    // HMAC accepts keys of any length, so the error arm is unreachable.
    match HmacSha256::new_from_slice(secret) {
        Ok(mut mac) => {
            mac.update(payload);
            mac.finalize().into_bytes().to_vec()
        }
        Err(_) => Vec::new(),
    }
}

/// Formats a digest as a header value (`sha256=<hex>`).
pub fn format_signature_header(signature: &[u8]) -> String {
    format!("{HEADER_PREFIX}{}", hex::encode(signature))
}

/// Verifies a signature header in constant time.
///
/// ```
/// use issue_bot::webhooks::{compute_signature, format_signature_header, verify_signature};
///
/// let body = br#"{"action":"closed"}"#;
/// let header = format_signature_header(&compute_signature(body, b"hunter2"));
///
/// assert!(verify_signature(body, &header, b"hunter2"));
/// assert!(!verify_signature(body, &header, b"hunter3"));
/// ```
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
