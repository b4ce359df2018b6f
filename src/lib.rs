//! # Shopfront SDK
//!
//! Rust client SDK for the Shopfront storefront/admin REST API. The SDK owns
//! the session credential lifecycle so resource callers do not have to:
//!
//! - **Token cache**: one short-lived access token per client session
//! - **Proactive renewal**: tokens inside the skew window (300s by default)
//!   are renewed before a request can race their expiry
//! - **Single-flight refresh**: any number of concurrent callers share one
//!   refresh network call and observe its single outcome
//! - **Failure classification**: "never logged in" and "session could not be
//!   renewed" surface as distinct typed errors
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use shopfront_sdk::{ApiClient, ClientConfig, MemoryFlag, Result};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let session = Arc::new(MemoryFlag::new(false));
//!     let config = ClientConfig::new("https://shop.example.com");
//!     let client = ApiClient::new(config, session.clone())?;
//!
//!     // The login flow stores the issued token and flips the indicator.
//!     let issued = login(&client).await?;
//!     client
//!         .token_store()
//!         .set_raw(&issued)
//!         .await
//!         .expect("login issued a decodable token");
//!     session.set(true);
//!
//!     // From here on, renewal is the client's problem, not the caller's.
//!     let products = client.get("/api/products").await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          ApiClient                          │
//! │   get/post/put/patch/delete → execute() → Response (as-is)  │
//! └──────────────────────────────┬──────────────────────────────┘
//!                                │
//! ┌──────────────┬───────────────┴────────────┬────────────────┐
//! │  TokenStore  │     RefreshCoordinator     │SessionIndicator│
//! ├──────────────┼────────────────────────────┼────────────────┤
//! │ one token    │ skew-window fast path      │ "ever logged   │
//! │ per session, │ single-flight renewal      │  in" boolean,  │
//! │ atomic swap  │ bounded call + broadcast   │ read-only here │
//! └──────────────┴────────────────────────────┴────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the SDK
pub mod error;

/// Client configuration
pub mod config;

/// Access token decoding and storage
pub mod token;

/// Session indicator seam
pub mod session;

/// Single-flight token refresh
pub mod refresh;

/// Authenticated request execution
pub mod client;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use client::{ApiClient, RequestConfig};
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use refresh::{RefreshCoordinator, RefreshError};
pub use session::{FileFlag, MemoryFlag, SessionIndicator};
pub use token::{AccessToken, Claims, TokenStore};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
