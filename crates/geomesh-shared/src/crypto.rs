//! Message signing and verification.
//!
//! ECDSA over P-256 with SHA-256, signatures carried as the raw 64-byte
//! r||s form in base64. Verification is keyed solely by the public key
//! embedded in the message itself: a `true` result proves possession of
//! the claimed private key, nothing more.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use p256::ecdsa::signature::{Signer, Verifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::pkcs8::DecodePublicKey;

/// Sign the UTF-8 bytes of `text`; returns the base64 transport encoding.
///
/// Standard ECDSA is randomized: two signatures over the same text differ,
/// but both verify.
pub fn sign(text: &str, key: &SigningKey) -> String {
    let signature: Signature = key.sign(text.as_bytes());
    BASE64.encode(signature.to_bytes().as_slice())
}

/// Verify `signature_b64` over the UTF-8 bytes of `text` with the sender's
/// base64 SPKI public key.
///
/// Returns `false` on any malformed input, decoding failure, or
/// cryptographic mismatch. A failed verification is an expected outcome,
/// never an error.
pub fn verify(text: &str, signature_b64: &str, public_key_b64: &str) -> bool {
    let signature_bytes = match BASE64.decode(signature_b64) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };
    let key_der = match BASE64.decode(public_key_b64) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };
    let signature = match Signature::from_slice(&signature_bytes) {
        Ok(sig) => sig,
        Err(_) => return false,
    };
    let verifying_key = match VerifyingKey::from_public_key_der(&key_der) {
        Ok(key) => key,
        Err(_) => return false,
    };

    verifying_key.verify(text.as_bytes(), &signature).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Identity;

    #[test]
    fn test_sign_verify_roundtrip() {
        let identity = Identity::generate().unwrap();
        let signature = sign("hello mesh", identity.signing_key());
        assert!(verify("hello mesh", &signature, identity.public_key()));
    }

    #[test]
    fn test_verify_rejects_tampered_text() {
        let identity = Identity::generate().unwrap();
        let signature = sign("original", identity.signing_key());
        assert!(!verify("tampered", &signature, identity.public_key()));
    }

    #[test]
    fn test_verify_rejects_wrong_key() {
        let signer = Identity::generate().unwrap();
        let other = Identity::generate().unwrap();
        let signature = sign("hello", signer.signing_key());
        assert!(!verify("hello", &signature, other.public_key()));
    }

    #[test]
    fn test_verify_rejects_malformed_signature() {
        let identity = Identity::generate().unwrap();
        assert!(!verify("hello", "not base64!!", identity.public_key()));
        // Valid base64, wrong length for r||s.
        assert!(!verify("hello", "AAEC", identity.public_key()));
    }

    #[test]
    fn test_verify_rejects_malformed_public_key() {
        let identity = Identity::generate().unwrap();
        let signature = sign("hello", identity.signing_key());
        assert!(!verify("hello", &signature, "@@ not a key @@"));
        // Valid base64 that is not SPKI DER.
        assert!(!verify("hello", &signature, "AAECAwQ="));
    }

    #[test]
    fn test_empty_text_roundtrip() {
        let identity = Identity::generate().unwrap();
        let signature = sign("", identity.signing_key());
        assert!(verify("", &signature, identity.public_key()));
    }

    #[test]
    fn test_signatures_are_randomized_but_both_verify() {
        let identity = Identity::generate().unwrap();
        let s1 = sign("same text", identity.signing_key());
        let s2 = sign("same text", identity.signing_key());
        assert!(verify("same text", &s1, identity.public_key()));
        assert!(verify("same text", &s2, identity.public_key()));
    }
}
