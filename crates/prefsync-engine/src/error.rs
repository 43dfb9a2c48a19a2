//! Error types for the sync engine
//!
//! Every failure here is non-fatal: the engine keeps running, the last
//! usable state stays rendered, and the error is published in the status.

use crate::phase::SyncPhase;
use prefsync_service::{FetchError, WriteError};
use prefsync_store::StoreError;

/// Sync engine error
#[derive(Debug, Clone, thiserror::Error)]
pub enum SyncError {
    /// Initial, explicit or recovery load failed
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Debounced write failed
    #[error(transparent)]
    Write(#[from] WriteError),

    /// Local store rejected the operation
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The worker has stopped
    #[error("sync engine has shut down")]
    Closed,
}

impl SyncError {
    /// Message for a user-visible error indicator
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Fetch(e) => format!("Could not load notification settings: {}", e.message()),
            Self::Write(e) => format!("Could not save notification settings: {}", e.message()),
            Self::Store(e) => e.to_string(),
            Self::Closed => "Notification settings are no longer being saved".to_string(),
        }
    }
}

/// Illegal phase transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal sync phase transition: {from} -> {to}")]
pub struct TransitionError {
    /// Current phase
    pub from: SyncPhase,
    /// Requested phase
    pub to: SyncPhase,
}

/// Invalid configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Settle window of zero would write on every keystroke
    #[error("settle window must be greater than zero")]
    ZeroSettleWindow,

    /// Client section rejected
    #[error(transparent)]
    Client(#[from] prefsync_service::ConfigError),

    /// File could not be read
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Path that was read
        path: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// TOML did not parse
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use prefsync_service::ServiceError;

    #[test]
    fn user_message_carries_backend_message() {
        let err = SyncError::Write(
            ServiceError::Rejected {
                status: 409,
                message: "settings were changed elsewhere".into(),
            }
            .into(),
        );
        assert_eq!(
            err.user_message(),
            "Could not save notification settings: settings were changed elsewhere"
        );
    }

    #[test]
    fn store_errors_convert() {
        let err: SyncError = StoreError::NotLoaded.into();
        assert!(matches!(err, SyncError::Store(StoreError::NotLoaded)));
    }
}
