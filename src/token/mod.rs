//! Access token handling
//!
//! The decoder reads claims out of the opaque wire token without verifying
//! its signature (the client holds no key material; the server remains the
//! authority). The store holds the current token for one client session and
//! is replaced atomically on refresh, cleared on logout or refresh failure.

mod claims;
mod store;

pub use claims::{decode, AccessToken, Claims, DecodeError, DEFAULT_SKEW_SECONDS};
pub use store::TokenStore;
