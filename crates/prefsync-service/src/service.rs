//! The two-operation contract with the preferences backend

use crate::error::{FetchError, WriteError};
use async_trait::async_trait;
use prefsync_model::PreferenceSet;
use serde::{Deserialize, Serialize};

/// Acknowledgement of an accepted write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Ack {
    /// Number of keys carried by the accepted write
    pub keys: usize,
}

/// Remote preference store for the signed-in user
///
/// Writes have merge-by-key semantics: keys absent from the partial set
/// keep their server-side value. Implementations own retries and auth;
/// callers never retry.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait PreferencesService: Send + Sync {
    /// Fetch the full authoritative set
    async fn fetch(&self) -> Result<PreferenceSet, FetchError>;

    /// Merge a partial set into the remote copy
    async fn write(&self, partial: PreferenceSet) -> Result<Ack, WriteError>;
}
