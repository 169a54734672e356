//! Cryptographic helpers for passwords, session tokens and CSRF tokens
//!
//! Passwords are hashed with Argon2 through the `password-auth` crate, which embeds a
//! random salt and the parameters in a PHC string and verifies in constant time.
//!
//! Session and CSRF tokens are 256-bit random values. Only the SHA-256 hash of a session
//! token is stored, and every token comparison goes through [`constant_time_compare`].
//!
//! See: <https://cheatsheetseries.owasp.org/cheatsheets/Authentication_Cheat_Sheet.html#compare-password-hashes-using-safe-functions>

use std::sync::LazyLock;

use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Hash checked against when the username does not exist, so that the not-found path
/// costs the same as a wrong password.
static DUMMY_PASSWORD_HASH: LazyLock<String> =
    LazyLock::new(|| password_auth::generate_hash("gatehouse-dummy-password"));

/// Generate a cryptographically secure random token.
///
/// Produces 256 bits of randomness encoded as URL-safe base64 without padding
/// (43 characters).
pub fn generate_secure_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    base64::Engine::encode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, bytes)
}

/// Hash a token for storage and lookup. Returns 64 hex characters.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Verify a token against a stored SHA-256 hash in constant time.
pub fn verify_token_hash(token: &str, stored_hash: &str) -> bool {
    let computed_hash = hash_token(token);
    constant_time_compare(computed_hash.as_bytes(), stored_hash.as_bytes())
}

/// Constant-time equality of two byte slices. Slices of different length are unequal.
pub fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> String {
    password_auth::generate_hash(password)
}

/// Check a password against a stored PHC hash string.
pub fn verify_password(password: &str, hash: &str) -> bool {
    password_auth::verify_password(password, hash).is_ok()
}

/// Burn the same amount of work as [`verify_password`] for a user that does not exist.
pub fn verify_dummy_password(password: &str) {
    let _ = password_auth::verify_password(password, &DUMMY_PASSWORD_HASH);
}
