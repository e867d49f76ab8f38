//! # Session State
//!
//! Who is behind the register right now.
//!
//! A terminal has exactly one active session. The handle is cheap to
//! clone and is passed explicitly to every engine that attributes actions
//! to a cashier; there is no global session singleton.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};

/// The logged-in cashier.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: String,
    pub username: String,
    pub logged_in_at: DateTime<Utc>,
}

/// Shared handle to the terminal's session slot.
///
/// Lock scope is a field copy; no engine holds the lock across an await.
#[derive(Debug, Clone, Default)]
pub struct SessionHandle {
    inner: Arc<RwLock<Option<Session>>>,
}

impl SessionHandle {
    /// Creates an empty (logged-out) handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the active session.
    pub fn set(&self, session: Session) {
        let mut slot = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(session);
    }

    /// Clears the active session. Returns the session that was active.
    pub fn clear(&self) -> Option<Session> {
        let mut slot = self.inner.write().unwrap_or_else(|e| e.into_inner());
        slot.take()
    }

    /// Snapshot of the active session, if any.
    pub fn current(&self) -> Option<Session> {
        let slot = self.inner.read().unwrap_or_else(|e| e.into_inner());
        slot.clone()
    }

    /// Username for audit attribution; "system" when nobody is logged in.
    pub fn actor(&self) -> String {
        self.current()
            .map(|s| s.username)
            .unwrap_or_else(|| "system".to_string())
    }

    /// True when a cashier is logged in.
    pub fn is_logged_in(&self) -> bool {
        self.current().is_some()
    }
}
