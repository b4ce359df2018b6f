//! Single-flight refresh coordinator

use crate::config::ClientConfig;
use crate::token::{AccessToken, TokenStore};
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Terminal outcome of one refresh cycle, shared by every caller of that
/// cycle.
pub type RefreshOutcome = Result<AccessToken, RefreshError>;

type CycleReceiver = watch::Receiver<Option<RefreshOutcome>>;

/// Why a refresh cycle failed.
///
/// `Clone` so the one outcome of a cycle can be handed to every waiter.
/// Every variant clears the token store: after a failed cycle there is no
/// usable token until the next cycle succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshError {
    #[error("refresh endpoint returned HTTP {status}")]
    Status { status: u16 },

    #[error("refresh request failed: {message}")]
    Network { message: String },

    #[error("refresh request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("refresh endpoint returned an undecodable token")]
    Malformed,

    #[error("refresh cycle was interrupted before an outcome was known")]
    Interrupted,
}

/// Success body of the refresh endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    access_token: String,
}

/// Coalesces concurrent refresh attempts into a single network call.
///
/// The first caller to need a renewal becomes the cycle leader and performs
/// the bounded refresh call; every caller arriving while that cycle runs
/// subscribes to it and resumes with the identical outcome. The in-flight
/// check-and-set and the subscription happen under one synchronous lock with
/// no await point inside, so two logical cycles can never overlap and at
/// most one refresh call is in flight at any instant.
pub struct RefreshCoordinator {
    store: TokenStore,
    http: Client,
    refresh_url: String,
    call_timeout: Duration,
    skew: chrono::Duration,
    in_flight: Mutex<Option<CycleReceiver>>,
}

impl RefreshCoordinator {
    /// Create a coordinator writing to the given store.
    ///
    /// The `http` client should carry a cookie store: the refresh call sends
    /// no bearer token, the ambient session cookie authorizes it.
    pub fn new(config: &ClientConfig, http: Client, store: TokenStore) -> Self {
        Self {
            store,
            http,
            refresh_url: config.refresh_url(),
            call_timeout: config.refresh_timeout(),
            skew: config.skew(),
            in_flight: Mutex::new(None),
        }
    }

    /// The store this coordinator reads and writes.
    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    /// Return a usable access token, renewing it if necessary.
    ///
    /// A stored token outside the renewal window is returned immediately
    /// with zero network calls. Otherwise the caller either leads a new
    /// refresh cycle or joins the one already in flight; either way it
    /// resumes with that cycle's single outcome, and the store reflects the
    /// outcome (new token on success, empty on failure) before anyone
    /// resumes.
    pub async fn request_refresh(&self) -> RefreshOutcome {
        if let Some(token) = self.store.current().await {
            if !token.is_expiring_soon(Utc::now(), self.skew) {
                return Ok(token);
            }
        }

        enum Role {
            Leader(watch::Sender<Option<RefreshOutcome>>),
            Waiter(CycleReceiver),
        }

        let role = {
            let mut slot = self
                .in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            match slot.as_ref() {
                Some(cycle) => Role::Waiter(cycle.clone()),
                None => {
                    let (tx, rx) = watch::channel(None);
                    *slot = Some(rx);
                    Role::Leader(tx)
                }
            }
        };

        match role {
            Role::Waiter(rx) => Self::await_outcome(rx).await,
            Role::Leader(tx) => self.lead_cycle(tx).await,
        }
    }

    /// Run one refresh cycle as its leader and broadcast the outcome.
    async fn lead_cycle(&self, tx: watch::Sender<Option<RefreshOutcome>>) -> RefreshOutcome {
        // If this future is dropped mid-cycle the guard frees the slot and
        // the dropped sender wakes waiters, who observe `Interrupted`.
        let slot_guard = SlotGuard {
            slot: &self.in_flight,
        };

        let outcome = match self.store.current().await {
            // A cycle that finished between the caller's staleness check and
            // winning the slot may already have stored a fresh token.
            Some(token) if !token.is_expiring_soon(Utc::now(), self.skew) => Ok(token),
            _ => {
                let outcome = self.fetch_token().await;
                match &outcome {
                    Ok(token) => self.store.replace(token.clone()).await,
                    Err(error) => {
                        warn!("token refresh failed: {error}");
                        self.store.clear().await;
                    }
                }
                outcome
            }
        };

        // Back to idle before waiters resume, so a late arrival starts a
        // fresh cycle instead of observing this one's receiver.
        drop(slot_guard);
        let _ = tx.send(Some(outcome.clone()));
        outcome
    }

    /// Wait for the in-flight cycle's broadcast.
    async fn await_outcome(mut rx: CycleReceiver) -> RefreshOutcome {
        loop {
            {
                let current = rx.borrow_and_update();
                if let Some(outcome) = current.as_ref() {
                    return outcome.clone();
                }
            }
            if rx.changed().await.is_err() {
                return Err(RefreshError::Interrupted);
            }
        }
    }

    /// Perform the bounded network refresh call.
    async fn fetch_token(&self) -> RefreshOutcome {
        debug!("refreshing access token via {}", self.refresh_url);

        let response = self
            .http
            .post(&self.refresh_url)
            .timeout(self.call_timeout)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RefreshError::Status {
                status: status.as_u16(),
            });
        }

        let body: RefreshResponse = response.json().await.map_err(|e| self.classify(e))?;

        // A token the client cannot decode is as good as no token at all.
        AccessToken::parse(body.access_token).map_err(|_| RefreshError::Malformed)
    }

    fn classify(&self, error: reqwest::Error) -> RefreshError {
        if error.is_timeout() {
            RefreshError::Timeout {
                timeout_ms: self.call_timeout.as_millis() as u64,
            }
        } else {
            RefreshError::Network {
                message: error.to_string(),
            }
        }
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("refresh_url", &self.refresh_url)
            .field("call_timeout", &self.call_timeout)
            .finish_non_exhaustive()
    }
}

/// Frees the in-flight slot when the leader finishes or is dropped.
struct SlotGuard<'a> {
    slot: &'a Mutex<Option<CycleReceiver>>,
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
