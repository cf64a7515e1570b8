//! Channel signature verification for inbound callbacks.
//!
//! LINE signs every webhook delivery with HMAC-SHA256 under the channel
//! secret and sends the digest base64-encoded in `X-Line-Signature`. This is
//! the only trust boundary in the relay; a request that fails here must not
//! reach the event router.

use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Verifies a signature header value against the raw callback body.
///
/// Comparison happens inside `Mac::verify_slice`, which is constant-time.
/// Any malformed input (empty header, bad base64) counts as a mismatch.
pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    if signature.is_empty() {
        return false;
    }
    let Ok(provided) = B64.decode(signature) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&provided).is_ok()
}

/// Computes the signature header value the platform would send for `body`.
pub fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
    mac.update(body);
    B64.encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_signature() {
        let body = br#"{"events":[]}"#;
        let sig = sign("channel-secret", body);
        assert!(verify_signature("channel-secret", body, &sig));
    }

    #[test]
    fn rejects_tampered_body() {
        let sig = sign("channel-secret", br#"{"events":[]}"#);
        assert!(!verify_signature("channel-secret", br#"{"events":[{}]}"#, &sig));
    }

    #[test]
    fn rejects_wrong_secret() {
        let body = b"payload";
        let sig = sign("secret-a", body);
        assert!(!verify_signature("secret-b", body, &sig));
    }

    #[test]
    fn rejects_malformed_header() {
        assert!(!verify_signature("secret", b"payload", ""));
        assert!(!verify_signature("secret", b"payload", "not base64!!"));
    }
}
