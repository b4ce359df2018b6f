//! Per-session access token store

use super::{AccessToken, DecodeError};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Holds the current access token for one client session.
///
/// The token is replaced whole on every update, never mutated in place, so a
/// reader either sees the previous token or the new one. Clones share the
/// same slot; the store is not persisted and not shared across independent
/// client instances.
#[derive(Debug, Clone, Default)]
pub struct TokenStore {
    current: Arc<RwLock<Option<AccessToken>>>,
}

impl TokenStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current token, if one is present.
    pub async fn current(&self) -> Option<AccessToken> {
        self.current.read().await.clone()
    }

    /// Replace the stored token.
    pub async fn replace(&self, token: AccessToken) {
        *self.current.write().await = Some(token);
    }

    /// Parse a wire token and store it.
    ///
    /// The store only admits tokens that decode. On failure the previous
    /// value is left untouched and the decode error goes back to the caller
    /// (the login flow), which keeps "stored" synonymous with "usable".
    pub async fn set_raw(&self, raw: &str) -> Result<AccessToken, DecodeError> {
        let token = AccessToken::parse(raw)?;
        self.replace(token.clone()).await;
        Ok(token)
    }

    /// Drop the stored token.
    pub async fn clear(&self) {
        *self.current.write().await = None;
    }
}
