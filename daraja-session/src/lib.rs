//! Daraja Session - client-side authentication session lifecycle
//!
//! Owns the bearer token and user profile cached in persistent storage,
//! enforces local token expiry and notifies observers of authentication
//! state changes.
//!
//! ## Architecture
//!
//! - [`SessionManager`]: the single source of truth for "who is logged in"
//! - [`SessionStore`]: persistent key-value storage (memory or file backed)
//! - [`AuthApi`]: the remote authentication backend
//! - [`AuthorizedClient`]: thin HTTP wrapper attaching the bearer token
//! - [`Navigator`]: router hook used for logout redirects

pub mod api;
pub mod client;
pub mod clock;
pub mod manager;
pub mod monitor;
pub mod navigation;
pub mod state;
pub mod store;
pub mod token;
pub mod user;

pub use api::{AuthApi, CurrentSession, HttpAuthApi, LoginResponse};
pub use client::AuthorizedClient;
pub use clock::{Clock, ManualClock, SystemClock};
pub use manager::{ExpiryCheck, SessionManager, SessionManagerBuilder};
pub use monitor::ExpiryMonitor;
pub use navigation::{MemoryNavigator, Navigator, NoopNavigator};
pub use state::{AuthSnapshot, AuthStatus, LogoutReason, SessionEvent, ViewScope};
pub use store::{FileStore, MemoryStore, PersistedSession, SessionStore};
pub use token::{decode_token, TokenClaims, TokenError};
pub use user::{UserId, UserProfile};

use daraja_core::DarajaError;

/// Session-level error type
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Session token has expired")]
    ExpiredToken,

    #[error("Persistent storage unavailable: {0}")]
    StorageUnavailable(#[source] DarajaError),

    #[error("Malformed session data: {message}")]
    MalformedSessionData { message: String },

    #[error("No active session")]
    NoActiveSession,

    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Core error: {0}")]
    Core(#[from] DarajaError),
}

pub type SessionResult<T> = Result<T, SessionError>;

impl SessionError {
    /// Create a malformed data error
    pub fn malformed<S: Into<String>>(message: S) -> Self {
        Self::MalformedSessionData {
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a network error without a source
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network {
            message: message.into(),
            source: None,
        }
    }

}

impl From<reqwest::Error> for SessionError {
    fn from(error: reqwest::Error) -> Self {
        let message = if error.is_timeout() {
            "request timed out".to_string()
        } else if error.is_connect() {
            "could not connect to server".to_string()
        } else {
            error.to_string()
        };
        Self::Network {
            message,
            source: Some(Box::new(error)),
        }
    }
}
