//! Unified error handling system
//!
//! Structured error types carrying a context record for debugging and recovery

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{error, warn};

pub type DarajaResult<T> = Result<T, DarajaError>;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Error context providing additional information for debugging and recovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Timestamp when error occurred
    pub timestamp: DateTime<Utc>,
    /// Component where error originated
    pub component: String,
    /// Operation being performed when error occurred
    pub operation: Option<String>,
    /// Additional metadata
    pub metadata: HashMap<String, String>,
    /// Recovery suggestions
    pub recovery_suggestions: Vec<String>,
}

impl ErrorContext {
    pub fn new(component: &str) -> Self {
        Self {
            error_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            component: component.to_string(),
            operation: None,
            metadata: HashMap::new(),
            recovery_suggestions: Vec::new(),
        }
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.recovery_suggestions.push(suggestion.to_string());
        self
    }
}

/// Main error type shared by the Daraja crates
#[derive(Error, Debug)]
pub enum DarajaError {
    #[error("Storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<BoxedSource>,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<BoxedSource>,
        context: ErrorContext,
    },

    #[error("Operation timeout: {operation}")]
    Timeout {
        operation: String,
        duration_ms: u64,
        context: ErrorContext,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DarajaError {
    /// Get the error context
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            DarajaError::Storage { context, .. }
            | DarajaError::Config { context, .. }
            | DarajaError::Timeout { context, .. } => Some(context),
            DarajaError::Io(_) => None,
        }
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        let error_id = self.context().map(|c| c.error_id.as_str());
        match self {
            DarajaError::Storage { .. } => {
                error!(error_id = ?error_id, error = %self, "Storage error");
            }
            DarajaError::Config { .. } => {
                error!(error_id = ?error_id, error = %self, "Configuration error");
            }
            DarajaError::Timeout { .. } => {
                warn!(
                    error_id = ?error_id,
                    error = %self,
                    "Timeout (may be recoverable)"
                );
            }
            DarajaError::Io(_) => {
                error!(error = %self, "Error occurred");
            }
        }
    }
}

#[macro_export]
macro_rules! storage_error {
    ($msg:expr, $component:expr) => {
        $crate::DarajaError::Storage {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check that persistent storage is enabled and not full"),
        }
    };
    ($msg:expr, $component:expr, $source:expr) => {
        $crate::DarajaError::Storage {
            message: $msg.to_string(),
            source: Some(Box::new($source)),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check that persistent storage is enabled and not full"),
        }
    };
}
