//! Proof key (RFC 7636, S256) and `state` values for the authorization request.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};

/// 32 random bytes, base64url without padding (43 characters).
#[must_use]
pub fn code_verifier() -> String {
    let random_bytes: [u8; 32] = rand::random();
    URL_SAFE_NO_PAD.encode(random_bytes)
}

/// `BASE64URL(SHA256(verifier))`.
#[must_use]
pub fn code_challenge(verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// Random value echoed back by the redirect.
#[must_use]
pub fn state() -> String {
    let random_bytes: [u8; 16] = rand::random();
    URL_SAFE_NO_PAD.encode(random_bytes)
}
