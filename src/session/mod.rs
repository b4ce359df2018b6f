//! Session indicator
//!
//! A persisted boolean recording whether this session has ever
//! authenticated. It is not a credential: it only lets the request executor
//! tell "session expired, try renewing" apart from "never logged in, renewing
//! is pointless". The login/logout flow owns the writes; the request pipeline
//! only reads it.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;


/// Read-only view of the session indicator, injected into the request
/// executor.
pub trait SessionIndicator: Send + Sync {
    /// Whether this session has previously authenticated.
    fn is_authenticated(&self) -> bool;
}

/// In-memory session flag.
///
/// Lives only as long as the process; clones share the same flag. Suits
/// embedded use where the host application already persists login state
/// elsewhere.
#[derive(Debug, Clone, Default)]
pub struct MemoryFlag {
    authenticated: Arc<AtomicBool>,
}

impl MemoryFlag {
    /// Create a flag with the given initial state.
    pub fn new(authenticated: bool) -> Self {
        Self {
            authenticated: Arc::new(AtomicBool::new(authenticated)),
        }
    }

    /// Record a login or logout. Called by the authentication flow, not by
    /// the request pipeline.
    pub fn set(&self, authenticated: bool) {
        self.authenticated.store(authenticated, Ordering::SeqCst);
    }
}

impl SessionIndicator for MemoryFlag {
    fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }
}

/// On-disk marker shape
#[derive(Debug, Serialize, Deserialize)]
struct SessionMarker {
    authenticated: bool,
}

/// File-persisted session flag.
///
/// Survives process restarts and token loss; cleared only by an explicit
/// logout. Reads are best-effort: a missing, unreadable, or corrupt marker
/// file reads as "never authenticated".
#[derive(Debug, Clone)]
pub struct FileFlag {
    path: PathBuf,
}

impl FileFlag {
    /// Create a flag backed by the marker file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Record a login or logout. Called by the authentication flow, not by
    /// the request pipeline.
    pub fn set(&self, authenticated: bool) -> Result<()> {
        let marker = SessionMarker { authenticated };
        std::fs::write(&self.path, serde_json::to_string(&marker)?)?;
        Ok(())
    }

    fn load(&self) -> Option<bool> {
        let contents = std::fs::read_to_string(&self.path).ok()?;
        let marker: SessionMarker = serde_json::from_str(&contents).ok()?;
        Some(marker.authenticated)
    }
}

impl SessionIndicator for FileFlag {
    fn is_authenticated(&self) -> bool {
        self.load().unwrap_or(false)
    }
}
