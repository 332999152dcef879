//! Cryptographic utilities: certificate signatures and header checks.

use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use edumart_core::Certificate;

use crate::error::ApiError;

type HmacSha256 = Hmac<Sha256>;

/// Compute HMAC-SHA256 and return the hex-encoded result (64 characters).
///
/// # Errors
///
/// Only fails if the HMAC implementation rejects the key, which HMAC-SHA256
/// never does (any key size is valid per RFC 2104).
pub fn hmac_sha256_hex(secret: &str, message: &str) -> Result<String, InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())?;
    mac.update(message.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Sign a certificate's canonical payload.
pub fn sign_certificate(secret: &str, certificate: &Certificate) -> Result<String, ApiError> {
    hmac_sha256_hex(secret, &certificate.signing_payload())
        .map_err(|e| ApiError::Internal(format!("certificate signing failed: {e}")))
}

/// Recompute a certificate's signature and compare it with the stored one.
pub fn verify_certificate(secret: &str, certificate: &Certificate) -> Result<bool, ApiError> {
    let expected = sign_certificate(secret, certificate)?;
    Ok(constant_time_eq(&expected, &certificate.signature))
}

/// Constant-time string comparison to prevent timing attacks.
#[must_use]
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use edumart_core::{CourseId, UserId};

    #[test]
    fn hmac_sha256_produces_correct_length() {
        let result = hmac_sha256_hex("key", "The quick brown fox jumps over the lazy dog").unwrap();
        assert_eq!(result.len(), 64); // SHA256 = 32 bytes = 64 hex chars
        assert_eq!(
            result,
            "f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8"
        );
    }

    #[test]
    fn certificate_signature_roundtrip() {
        let mut cert = Certificate::unsigned(
            UserId::generate(),
            CourseId::generate(),
            "Rust 101".into(),
            "Ada".into(),
        );
        cert.signature = sign_certificate("secret", &cert).unwrap();
        assert!(verify_certificate("secret", &cert).unwrap());
        assert!(!verify_certificate("other-secret", &cert).unwrap());

        cert.serial.push('X');
        assert!(!verify_certificate("secret", &cert).unwrap());
    }

    #[test]
    fn constant_time_eq_cases() {
        assert!(constant_time_eq("abc", "abc"));
        assert!(constant_time_eq("", ""));
        assert!(!constant_time_eq("abc", "abd"));
        assert!(!constant_time_eq("abc", "ab"));
        assert!(!constant_time_eq("abc", "ABC"));
    }
}
