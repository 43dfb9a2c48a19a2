//! Observable engine status

use crate::phase::SyncPhase;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Snapshot published on every state change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncStatus {
    /// Current phase
    pub phase: SyncPhase,
    /// True from dispatch of a write until it resolves (recovery included)
    pub saving: bool,
    /// Whether a preference set is held
    pub loaded: bool,
    /// Keys buffered for the next write
    pub pending_keys: usize,
    /// User-facing message of the most recent failure, cleared on success
    pub last_error: Option<String>,
    /// Writes the service accepted
    pub writes_acknowledged: u64,
    /// Writes the service rejected
    pub writes_failed: u64,
    /// Last successful load or write
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl SyncStatus {
    /// Nothing loaded, nothing pending
    #[must_use]
    pub fn initial() -> Self {
        Self {
            phase: SyncPhase::Idle,
            saving: false,
            loaded: false,
            pending_keys: 0,
            last_error: None,
            writes_acknowledged: 0,
            writes_failed: 0,
            last_synced_at: None,
        }
    }

    /// Whether the UI should show an error indicator
    #[inline]
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.last_error.is_some()
    }
}

impl Default for SyncStatus {
    fn default() -> Self {
        Self::initial()
    }
}
