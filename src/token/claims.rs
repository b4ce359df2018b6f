//! Claims decoding for JWT-shaped access tokens

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default renewal window in seconds.
///
/// A token that is still valid but expires within this window is treated as
/// due for renewal, so a request never races an expiry that lands mid-flight.
pub const DEFAULT_SKEW_SECONDS: u64 = 300;

/// Failure to read claims out of a token string.
///
/// Decoding is total: any input, including the empty string, yields either
/// `Claims` or one of these variants. Callers branch on the result; nothing
/// in the decode path panics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("token is not a three-segment JWT")]
    Structure,

    #[error("token payload is not valid base64url")]
    Encoding,

    #[error("token payload is not a valid claims object: {message}")]
    Claims { message: String },
}

/// Decoded access token claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Claims {
    /// Subject (user) identifier, the `id` claim
    pub subject_id: String,
    /// Account username
    pub username: String,
    /// Role granted to the session (e.g. storefront customer vs. admin)
    pub role: String,
    /// When the token was issued (`iat`)
    pub issued_at: DateTime<Utc>,
    /// When the token stops being accepted (`exp`)
    pub expires_at: DateTime<Utc>,
}

impl Claims {
    /// Whether the token is already expired or will expire within `skew`.
    pub fn is_expiring_soon(&self, now: DateTime<Utc>, skew: Duration) -> bool {
        now + skew >= self.expires_at
    }

    /// Whether the token is past its expiry outright.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Wire shape of the token payload
#[derive(Debug, Deserialize)]
struct RawClaims {
    id: String,
    username: String,
    role: String,
    exp: i64,
    iat: i64,
}

/// Decode the claims segment of a JWT-shaped token.
///
/// The signature is not checked; this is a client-side read of what the
/// server already vouched for. Structurally invalid input of any kind is a
/// `DecodeError`, never a panic.
pub fn decode(token: &str) -> Result<Claims, DecodeError> {
    let mut segments = token.split('.');
    let payload = match (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) {
        (Some(_header), Some(payload), Some(_signature), None) => payload,
        _ => return Err(DecodeError::Structure),
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| DecodeError::Encoding)?;

    let raw: RawClaims = serde_json::from_slice(&bytes).map_err(|e| DecodeError::Claims {
        message: e.to_string(),
    })?;

    Ok(Claims {
        subject_id: raw.id,
        username: raw.username,
        role: raw.role,
        issued_at: claim_timestamp(raw.iat, "iat")?,
        expires_at: claim_timestamp(raw.exp, "exp")?,
    })
}

fn claim_timestamp(seconds: i64, claim: &'static str) -> Result<DateTime<Utc>, DecodeError> {
    Utc.timestamp_opt(seconds, 0)
        .single()
        .ok_or_else(|| DecodeError::Claims {
            message: format!("'{claim}' is out of range"),
        })
}

/// An access token as held by the store: the opaque wire string paired with
/// its decoded claims.
///
/// Parsed at the boundary — a string that fails decode never becomes an
/// `AccessToken`, so everything downstream can rely on the claims being
/// present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    raw: String,
    claims: Claims,
}

impl AccessToken {
    /// Decode a wire token into a usable access token.
    pub fn parse(raw: impl Into<String>) -> Result<Self, DecodeError> {
        let raw = raw.into();
        let claims = decode(&raw)?;
        Ok(Self { raw, claims })
    }

    /// The opaque wire string, as sent in the Authorization header.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The decoded claims.
    pub fn claims(&self) -> &Claims {
        &self.claims
    }

    /// Whether this token is due for renewal.
    pub fn is_expiring_soon(&self, now: DateTime<Utc>, skew: Duration) -> bool {
        self.claims.is_expiring_soon(now, skew)
    }
}
