//! Token refresh coordination
//!
//! The coordinator owns the renewal of the short-lived access token. It
//! returns a still-valid stored token with zero network calls, and otherwise
//! guarantees that any number of concurrent callers share exactly one
//! network refresh call and observe its single outcome.

mod coordinator;

pub use coordinator::{RefreshCoordinator, RefreshError, RefreshOutcome};
