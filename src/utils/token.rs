//! Symmetrically signed identity tokens.
//!
//! A token carries a serde-encoded claims payload plus a keyed-hash MAC
//! over it, both hex-encoded and joined by a dot. Verification recomputes
//! the MAC under the shared secret and then checks expiry; either failure
//! rejects the token.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Key-derivation context; versioned so a future scheme change cannot
/// collide with existing tokens.
const KEY_CONTEXT: &str = "reef identity token v1";

/// Default validity window: one week.
pub const DEFAULT_VALIDITY_SECS: i64 = 7 * 24 * 60 * 60;

/// Errors from signing or verifying tokens.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TokenError {
    /// The token is not `payload.mac` with valid hex parts.
    #[error("malformed token")]
    Malformed,

    /// The MAC does not match the payload under the given secret.
    #[error("token signature mismatch")]
    SignatureMismatch,

    /// The token's expiry lies in the past.
    #[error("token expired")]
    Expired,

    /// The claims payload failed to encode or decode.
    #[error("claims serialization failed")]
    Serialization,
}

/// Identity claims carried by a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    pub username: String,
    pub role: String,
    /// Unix seconds.
    pub issued_at: i64,
    /// Unix seconds.
    pub expires_at: i64,
    pub issuer: String,
}

impl Claims {
    /// Creates claims issued now with the default one-week validity.
    pub fn new(user_id: u64, username: &str, role: &str, issuer: &str) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            user_id,
            username: username.to_string(),
            role: role.to_string(),
            issued_at: now,
            expires_at: now + DEFAULT_VALIDITY_SECS,
            issuer: issuer.to_string(),
        }
    }
}

/// Signs `claims` under `secret`.
pub fn sign(claims: &Claims, secret: &[u8]) -> Result<String, TokenError> {
    let payload = serde_json::to_vec(claims).map_err(|_| TokenError::Serialization)?;
    let mac = blake3::keyed_hash(&derive_key(secret), &payload);
    Ok(format!("{}.{}", hex_encode(&payload), mac.to_hex()))
}

/// Verifies `token` under `secret`, failing on signature mismatch or
/// past-expiry, and returns the embedded claims.
pub fn verify(token: &str, secret: &[u8]) -> Result<Claims, TokenError> {
    let (payload_hex, mac_hex) = token.split_once('.').ok_or(TokenError::Malformed)?;
    let payload = hex_decode(payload_hex).ok_or(TokenError::Malformed)?;
    let presented = blake3::Hash::from_hex(mac_hex).map_err(|_| TokenError::Malformed)?;

    let expected = blake3::keyed_hash(&derive_key(secret), &payload);
    // blake3::Hash equality is constant-time.
    if expected != presented {
        return Err(TokenError::SignatureMismatch);
    }

    let claims: Claims =
        serde_json::from_slice(&payload).map_err(|_| TokenError::Serialization)?;
    if claims.expires_at < chrono::Utc::now().timestamp() {
        return Err(TokenError::Expired);
    }
    Ok(claims)
}

fn derive_key(secret: &[u8]) -> [u8; 32] {
    blake3::derive_key(KEY_CONTEXT, secret)
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn hex_decode(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).ok())
        .collect()
}
