//! Observable authentication state

use crate::user::UserProfile;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Where the session state machine currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStatus {
    /// Before the first restore attempt has finished
    Unknown,
    Authenticated,
    Unauthenticated,
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogoutReason {
    UserInitiated,
    /// Token passed its embedded expiry
    Expired,
    /// Backend rejected the credential
    Unauthorized,
    /// Stored record could not be read back
    CorruptSession,
}

/// Value published to observers on every state change
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthSnapshot {
    pub status: AuthStatus,
    pub user: Option<UserProfile>,
    pub loading: bool,
    pub is_authenticated: bool,
    pub token_expiry_ms: Option<i64>,
}

/// Discrete notifications, e.g. for toasts
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    LoggedIn { user: UserProfile },
    Restored { user: UserProfile },
    UserUpdated { user: UserProfile },
    LoggedOut { reason: LogoutReason },
    /// The token expires within the warning horizon
    ExpiringSoon { remaining_ms: i64 },
    /// Restore could not reach the backend; the local session was kept
    ValidationUnavailable { message: String },
}

/// Lifetime flag of the view that started an async operation
#[derive(Debug, Clone)]
pub struct ViewScope {
    mounted: Arc<AtomicBool>,
}

impl ViewScope {
    pub fn new() -> Self {
        Self {
            mounted: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    /// Mark the view as torn down; pending results for it are dropped
    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::SeqCst);
    }
}

impl Default for ViewScope {
    fn default() -> Self {
        Self::new()
    }
}
