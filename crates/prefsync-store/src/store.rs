//! Preference store
//!
//! Holds two copies of the user's set:
//! - `current`: what the UI renders, including optimistic edits
//! - `confirmed`: last fetch plus every acknowledged write
//!
//! `apply` only touches `current`. Reverting drops back to `confirmed`,
//! the last-known-good state.

use crate::error::StoreError;
use prefsync_model::PreferenceSet;
use prefsync_service::{FetchError, PreferencesService};

/// In-memory preference set for the editing session
#[derive(Debug, Clone, Default)]
pub struct PreferenceStore {
    current: Option<PreferenceSet>,
    confirmed: Option<PreferenceSet>,
    saving: bool,
    last_error: Option<FetchError>,
}

impl PreferenceStore {
    /// Empty store; nothing loaded yet
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the held set with a fresh authoritative copy
    ///
    /// On failure the previous state is kept (or the store stays empty on a
    /// first load) and the error is retained for display.
    ///
    /// Callers that keep the store behind a lock must not hold it across
    /// the fetch; they fetch themselves and hand the result to
    /// [`PreferenceStore::accept_fetch`].
    ///
    /// # Errors
    /// `FetchError` from the service.
    pub async fn load(
        &mut self,
        service: &dyn PreferencesService,
    ) -> Result<PreferenceSet, FetchError> {
        let fetched = service.fetch().await;
        self.accept_fetch(fetched)
    }

    /// Settle a completed fetch: install the set, or keep the current
    /// state and remember the error
    ///
    /// # Errors
    /// The fetch error, passed through.
    pub fn accept_fetch(
        &mut self,
        fetched: Result<PreferenceSet, FetchError>,
    ) -> Result<PreferenceSet, FetchError> {
        match fetched {
            Ok(set) => Ok(self.install(set)),
            Err(err) => {
                self.record_fetch_error(err.clone());
                Err(err)
            }
        }
    }

    /// Install an authoritative set fetched elsewhere
    pub fn install(&mut self, set: PreferenceSet) -> PreferenceSet {
        tracing::debug!(keys = set.len(), "installing authoritative preferences");
        self.confirmed = Some(set.clone());
        self.current = Some(set.clone());
        self.last_error = None;
        set
    }

    /// Remember a failed fetch without touching the held set
    pub fn record_fetch_error(&mut self, err: FetchError) {
        tracing::warn!(error = %err, loaded = self.is_loaded(), "preference fetch failed");
        self.last_error = Some(err);
    }

    /// Merge a partial update into the rendered set, without waiting for
    /// the server
    ///
    /// # Errors
    /// `StoreError::NotLoaded` before the first successful load.
    pub fn apply(&mut self, partial: &PreferenceSet) -> Result<PreferenceSet, StoreError> {
        let current = self.current.as_mut().ok_or(StoreError::NotLoaded)?;
        current.merge(partial);
        Ok(current.clone())
    }

    /// Record that the server accepted `batch`
    pub fn confirm(&mut self, batch: &PreferenceSet) {
        if let Some(confirmed) = self.confirmed.as_mut() {
            confirmed.merge(batch);
        }
    }

    /// Drop every unconfirmed edit
    pub fn revert_to_confirmed(&mut self) {
        if self.current != self.confirmed {
            tracing::debug!("reverting to last confirmed preferences");
        }
        self.current.clone_from(&self.confirmed);
    }

    /// Forget everything (logout, navigation away)
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Rendered set, if loaded
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> Option<&PreferenceSet> {
        self.current.as_ref()
    }

    /// Last-known-good set, if loaded
    #[inline]
    #[must_use]
    pub fn confirmed(&self) -> Option<&PreferenceSet> {
        self.confirmed.as_ref()
    }

    /// Whether a set has ever been loaded
    #[inline]
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.current.is_some()
    }

    /// Whether a write is in progress
    #[inline]
    #[must_use]
    pub fn saving(&self) -> bool {
        self.saving
    }

    /// Update the saving flag
    #[inline]
    pub fn set_saving(&mut self, saving: bool) {
        self.saving = saving;
    }

    /// Last fetch failure, cleared by the next successful load
    #[inline]
    #[must_use]
    pub fn last_error(&self) -> Option<&FetchError> {
        self.last_error.as_ref()
    }
}
