//! Bearer token payload decoding
//!
//! Tokens are `header.payload.signature` with a base64url JSON payload. Only
//! the expiry is read here; the signature is the backend's concern and is
//! never checked on the client.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};

/// Reasons a token could not be decoded
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token is empty")]
    Empty,
    #[error("expected 3 dot-separated segments, found {0}")]
    InvalidFormat(usize),
    #[error("payload is not valid base64url")]
    InvalidEncoding,
    #[error("payload is not a valid claims object: {0}")]
    InvalidPayload(String),
    #[error("payload has no usable `exp` claim")]
    MissingExpiry,
}

/// Claims read from the token payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Expiration time (seconds since epoch)
    pub exp: i64,
    /// Issued at (seconds since epoch)
    #[serde(default)]
    pub iat: Option<i64>,
    /// Subject
    #[serde(default)]
    pub sub: Option<String>,
}

#[derive(Deserialize)]
struct RawClaims {
    exp: Option<serde_json::Value>,
    #[serde(default)]
    iat: Option<i64>,
    #[serde(default)]
    sub: Option<serde_json::Value>,
}

impl TokenClaims {
    /// Expiry in milliseconds since epoch
    pub fn expires_at_ms(&self) -> i64 {
        self.exp.saturating_mul(1000)
    }

    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at_ms()
    }

    /// Milliseconds left before expiry, zero once expired
    pub fn remaining_ms(&self, now_ms: i64) -> i64 {
        (self.expires_at_ms() - now_ms).max(0)
    }
}

/// Decode the claims of a bearer token without verifying its signature
pub fn decode_token(token: &str) -> Result<TokenClaims, TokenError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(TokenError::Empty);
    }

    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(TokenError::InvalidFormat(segments.len()));
    }

    let payload = URL_SAFE_NO_PAD
        .decode(segments[1].trim_end_matches('='))
        .map_err(|_| TokenError::InvalidEncoding)?;

    let raw: RawClaims = serde_json::from_slice(&payload)
        .map_err(|e| TokenError::InvalidPayload(e.to_string()))?;

    // Some issuers emit fractional seconds
    let exp = match raw.exp {
        Some(serde_json::Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.floor() as i64)),
        _ => None,
    }
    .filter(|exp| *exp > 0)
    .ok_or(TokenError::MissingExpiry)?;

    let sub = raw.sub.map(|sub| match sub {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    });

    Ok(TokenClaims {
        exp,
        iat: raw.iat,
        sub,
    })
}
