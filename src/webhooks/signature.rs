//! GitHub webhook signature verification using HMAC-SHA1.
//!
//! GitHub signs webhook payloads using HMAC-SHA1 with a shared secret.
//! The signature is provided in the `X-Hub-Signature` header as `sha1=<hex>`.
//!
//! Signature verification is the first step in webhook processing; requests
//! with invalid signatures are rejected before the body is parsed.

use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// The only signature scheme recognised in the header.
const SIGNATURE_PREFIX: &str = "sha1=";

/// Parses a GitHub signature header (e.g., "sha1=abc123...") into raw bytes.
///
/// Returns `None` for malformed headers (missing prefix, invalid hex, etc.).
/// Never panics.
///
/// # Examples
///
/// ```
/// use scv::webhooks::parse_signature_header;
///
/// assert!(parse_signature_header("sha1=abcd1234").is_some());
///
/// // Missing prefix
/// assert!(parse_signature_header("abcd1234").is_none());
///
/// // Other algorithms are not negotiated
/// assert!(parse_signature_header("sha256=abcd1234").is_none());
///
/// // Bad hex
/// assert!(parse_signature_header("sha1=xyz").is_none());
/// ```
pub fn parse_signature_header(header: &str) -> Option<Vec<u8>> {
    let hex_sig = header.strip_prefix(SIGNATURE_PREFIX)?;
    hex::decode(hex_sig).ok()
}

/// Computes the HMAC-SHA1 signature of a payload using the given secret.
pub fn compute_signature(payload: &[u8], secret: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha1::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

/// Formats a signature as a GitHub-style header value: `sha1=<hex>`.
pub fn format_signature_header(signature: &[u8]) -> String {
    format!("{}{}", SIGNATURE_PREFIX, hex::encode(signature))
}

/// Verifies a GitHub webhook signature against the raw payload and secret.
///
/// Returns `false` if the header is absent, lacks the `sha1=` prefix, is not
/// valid hex, or does not match. The digest comparison is constant-time.
///
/// # Arguments
///
/// * `payload` - The exact raw request body bytes
/// * `signature_header` - The value of the `X-Hub-Signature` header, if present
/// * `secret` - The webhook secret, used as the raw HMAC key
///
/// # Examples
///
/// ```
/// use scv::webhooks::{compute_signature, format_signature_header, verify_signature};
///
/// let payload = br#"{"ref":"refs/heads/main","after":"abc123"}"#;
/// let secret = b"s3cr3t";
///
/// let header = format_signature_header(&compute_signature(payload, secret));
///
/// assert!(verify_signature(payload, Some(&header), secret));
/// assert!(!verify_signature(payload, Some(&header), b"wrong-secret"));
/// assert!(!verify_signature(payload, None, secret));
/// ```
pub fn verify_signature(payload: &[u8], signature_header: Option<&str>, secret: &[u8]) -> bool {
    let Some(expected_signature) = signature_header.and_then(parse_signature_header) else {
        return false;
    };

    let mut mac = match HmacSha1::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(payload);

    // Constant-time comparison via the HMAC library
    mac.verify_slice(&expected_signature).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parse_signature_header_valid() {
        let result = parse_signature_header("sha1=1234abcd");
        assert_eq!(result, Some(vec![0x12, 0x34, 0xab, 0xcd]));
    }

    #[test]
    fn parse_signature_header_rejects_malformed() {
        assert_eq!(parse_signature_header(""), None);
        assert_eq!(parse_signature_header("1234abcd"), None);
        assert_eq!(parse_signature_header("sha256=1234abcd"), None);
        assert_eq!(parse_signature_header("SHA1=1234abcd"), None);
        assert_eq!(parse_signature_header("sha1=xyz"), None);
        assert_eq!(parse_signature_header("sha1=abc"), None);
    }

    #[test]
    fn parse_signature_header_uppercase_hex() {
        let result = parse_signature_header("sha1=ABCD1234");
        assert_eq!(result, Some(vec![0xab, 0xcd, 0x12, 0x34]));
    }

    /// The commonly published HMAC-SHA1 example.
    #[test]
    fn known_hmac_sha1_vector() {
        let sig = compute_signature(b"The quick brown fox jumps over the lazy dog", b"key");
        assert_eq!(
            hex::encode(sig),
            "de7c9b85b8b78aa6bc8a7a36f70a90701c9db4d9"
        );
    }

    #[test]
    fn verify_signature_push_payload() {
        let payload = br#"{"ref":"refs/heads/main","after":"abc123"}"#;
        let secret = b"s3cr3t";
        let header = format_signature_header(&compute_signature(payload, secret));

        assert!(verify_signature(payload, Some(&header), secret));
    }

    #[test]
    fn verify_signature_missing_header() {
        assert!(!verify_signature(b"payload", None, b"secret"));
    }

    #[test]
    fn verify_signature_rejects_sha256_header_even_if_digest_matches_prefix() {
        let payload = b"payload";
        let secret = b"secret";
        let sig = compute_signature(payload, secret);
        let header = format!("sha256={}", hex::encode(&sig));

        assert!(!verify_signature(payload, Some(&header), secret));
    }

    #[test]
    fn verify_signature_malformed_header_returns_false() {
        let payload = b"test";
        let secret = b"secret";

        assert!(!verify_signature(payload, Some(""), secret));
        assert!(!verify_signature(payload, Some("sha1="), secret));
        assert!(!verify_signature(payload, Some("sha1=invalid"), secret));
        assert!(!verify_signature(payload, Some("not-a-header"), secret));
    }

    #[test]
    fn verify_signature_truncated_digest_fails() {
        let payload = b"payload";
        let secret = b"secret";
        let sig = compute_signature(payload, secret);
        let header = format_signature_header(&sig[..10]);

        assert!(!verify_signature(payload, Some(&header), secret));
    }

    #[test]
    fn verify_signature_empty_payload_and_secret() {
        let header = format_signature_header(&compute_signature(b"", b""));
        assert!(verify_signature(b"", Some(&header), b""));
    }

    #[test]
    fn signature_is_20_bytes() {
        assert_eq!(compute_signature(b"any payload", b"any secret").len(), 20);
    }

    proptest! {
        /// verify(body, "sha1=" + hex(hmac(secret, body)), secret) always holds.
        #[test]
        fn prop_sign_verify(payload: Vec<u8>, secret: Vec<u8>) {
            let header = format_signature_header(&compute_signature(&payload, &secret));
            prop_assert!(verify_signature(&payload, Some(&header), &secret));
        }

        /// Changing any single byte of the body breaks verification.
        #[test]
        fn prop_body_mutation_fails(
            payload in prop::collection::vec(any::<u8>(), 1..512),
            secret in prop::collection::vec(any::<u8>(), 0..128),
            index in any::<prop::sample::Index>(),
            flip in 1u8..=255,
        ) {
            let header = format_signature_header(&compute_signature(&payload, &secret));

            let mut mutated = payload.clone();
            let i = index.index(mutated.len());
            mutated[i] ^= flip;

            prop_assert!(!verify_signature(&mutated, Some(&header), &secret));
        }

        /// Changing any single byte of the secret breaks verification.
        #[test]
        fn prop_secret_mutation_fails(
            payload in prop::collection::vec(any::<u8>(), 0..512),
            secret in prop::collection::vec(any::<u8>(), 1..128),
            index in any::<prop::sample::Index>(),
            flip in 1u8..=255,
        ) {
            let header = format_signature_header(&compute_signature(&payload, &secret));

            let mut mutated = secret.clone();
            let i = index.index(mutated.len());
            mutated[i] ^= flip;

            prop_assert!(!verify_signature(&payload, Some(&header), &mutated));
        }

        #[test]
        fn prop_format_parse(signature: [u8; 20]) {
            let header = format_signature_header(&signature);
            prop_assert_eq!(parse_signature_header(&header), Some(signature.to_vec()));
        }

        /// Arbitrary header text never panics.
        #[test]
        fn prop_malformed_header_no_panic(header: String, payload: Vec<u8>, secret: Vec<u8>) {
            let _ = parse_signature_header(&header);
            let _ = verify_signature(&payload, Some(&header), &secret);
        }
    }
}
