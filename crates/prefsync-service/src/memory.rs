//! In-memory preferences backend
//!
//! Authoritative copy held in process, merge-by-key writes, and scripted
//! failure injection. Backs local simulation runs and tests.

use crate::error::{FetchError, ServiceError, WriteError};
use crate::service::{Ack, PreferencesService};
use async_trait::async_trait;
use parking_lot::Mutex;
use prefsync_model::{PreferenceKey, PreferenceSet};
use std::time::Duration;

#[derive(Debug, Default)]
struct MemoryState {
    set: PreferenceSet,
    fetch_count: usize,
    write_log: Vec<PreferenceSet>,
    accepted_writes: usize,
    fail_next_fetches: usize,
    fail_next_writes: usize,
    fail_every_nth_write: Option<usize>,
}

/// Preferences backend living in process memory
#[derive(Debug, Default)]
pub struct InMemoryPreferencesService {
    state: Mutex<MemoryState>,
    latency: Duration,
}

impl InMemoryPreferencesService {
    /// Create a backend holding `initial`
    #[must_use]
    pub fn new(initial: PreferenceSet) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                set: initial,
                ..MemoryState::default()
            }),
            latency: Duration::ZERO,
        }
    }

    /// Delay every call by `latency`
    #[inline]
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Fail the next `n` fetches
    pub fn fail_next_fetches(&self, n: usize) {
        self.state.lock().fail_next_fetches = n;
    }

    /// Fail the next `n` writes
    pub fn fail_next_writes(&self, n: usize) {
        self.state.lock().fail_next_writes = n;
    }

    /// Fail every `n`th write attempt (`None` or `Some(0)` disables)
    pub fn fail_every_nth_write(&self, n: Option<usize>) {
        self.state.lock().fail_every_nth_write = n.filter(|n| *n > 0);
    }

    /// Change a value behind the client's back
    pub fn set_server_value(&self, key: PreferenceKey, value: bool) {
        self.state.lock().set.set(key, value);
    }

    /// Current authoritative copy
    #[must_use]
    pub fn snapshot(&self) -> PreferenceSet {
        self.state.lock().set.clone()
    }

    /// Fetch attempts so far
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.state.lock().fetch_count
    }

    /// Every write payload received, failed attempts included
    #[must_use]
    pub fn write_log(&self) -> Vec<PreferenceSet> {
        self.state.lock().write_log.clone()
    }

    /// Write attempts so far
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.state.lock().write_log.len()
    }

    /// Writes that were merged into the authoritative copy
    #[must_use]
    pub fn accepted_writes(&self) -> usize {
        self.state.lock().accepted_writes
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl PreferencesService for InMemoryPreferencesService {
    async fn fetch(&self) -> Result<PreferenceSet, FetchError> {
        self.simulate_latency().await;

        let mut state = self.state.lock();
        state.fetch_count += 1;
        if state.fail_next_fetches > 0 {
            state.fail_next_fetches -= 1;
            tracing::debug!("injected fetch failure");
            return Err(ServiceError::Unavailable("injected fetch failure".to_string()).into());
        }
        Ok(state.set.clone())
    }

    async fn write(&self, partial: PreferenceSet) -> Result<Ack, WriteError> {
        self.simulate_latency().await;

        let mut state = self.state.lock();
        state.write_log.push(partial.clone());
        let attempt = state.write_log.len();

        let scheduled = state
            .fail_every_nth_write
            .is_some_and(|n| attempt % n == 0);
        if state.fail_next_writes > 0 || scheduled {
            state.fail_next_writes = state.fail_next_writes.saturating_sub(1);
            tracing::debug!(attempt, "injected write failure");
            return Err(ServiceError::Rejected {
                status: 503,
                message: "injected write failure".to_string(),
            }
            .into());
        }

        state.set.merge(&partial);
        state.accepted_writes += 1;
        Ok(Ack { keys: partial.len() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use PreferenceKey::*;

    #[tokio::test]
    async fn write_merges_by_key() {
        let service = InMemoryPreferencesService::new(
            PreferenceSet::new()
                .with(EnableBudgetAlerts, false)
                .with(BudgetAlertsSlack, true),
        );

        let ack = service
            .write(PreferenceSet::new().with(EnableBudgetAlerts, true))
            .await
            .unwrap();

        assert_eq!(ack, Ack { keys: 1 });
        assert_eq!(
            service.fetch().await.unwrap(),
            PreferenceSet::new()
                .with(EnableBudgetAlerts, true)
                .with(BudgetAlertsSlack, true)
        );
    }

    #[tokio::test]
    async fn injected_failures_are_consumed() {
        let service = InMemoryPreferencesService::new(PreferenceSet::uniform(false));
        service.fail_next_fetches(1);
        service.fail_next_writes(1);

        assert!(service.fetch().await.is_err());
        assert!(service.fetch().await.is_ok());

        let partial = PreferenceSet::new().with(EnablePmReports, true);
        assert!(service.write(partial.clone()).await.is_err());
        assert!(service.write(partial).await.is_ok());

        assert_eq!(service.fetch_count(), 2);
        assert_eq!(service.write_count(), 2);
        assert_eq!(service.accepted_writes(), 1);
    }

    #[tokio::test]
    async fn failed_write_leaves_server_untouched() {
        let service = InMemoryPreferencesService::new(PreferenceSet::uniform(false));
        service.fail_next_writes(1);

        let err = service
            .write(PreferenceSet::new().with(EnableMeetingPrep, true))
            .await
            .unwrap_err();

        assert_eq!(err.message(), "injected write failure");
        assert_eq!(service.snapshot(), PreferenceSet::uniform(false));
    }

    #[tokio::test]
    async fn every_nth_write_fails() {
        let service = InMemoryPreferencesService::new(PreferenceSet::new());
        service.fail_every_nth_write(Some(2));

        let partial = PreferenceSet::new().with(EnableAnomalyAlerts, true);
        let results: Vec<bool> = write_outcomes(&service, &partial, 4).await;
        assert_eq!(results, vec![true, false, true, false]);
    }

    async fn write_outcomes(
        service: &InMemoryPreferencesService,
        partial: &PreferenceSet,
        n: usize,
    ) -> Vec<bool> {
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            out.push(service.write(partial.clone()).await.is_ok());
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn latency_delays_calls() {
        let service = InMemoryPreferencesService::new(PreferenceSet::new())
            .with_latency(Duration::from_millis(250));

        let start = tokio::time::Instant::now();
        service.fetch().await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(250));
    }
}
