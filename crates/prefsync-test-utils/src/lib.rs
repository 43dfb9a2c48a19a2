//! Testing utilities for prefsync workspace
//!
//! Shared test helpers, fixtures, and service wrappers.

#![allow(missing_docs)]

use async_trait::async_trait;
use prefsync_model::{PreferenceKey, PreferenceSet};
use prefsync_service::{
    Ack, FetchError, InMemoryPreferencesService, PreferencesService, ServiceError, WriteError,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Wraps a service so writes or fetches can be held in flight until
/// released
#[derive(Debug)]
pub struct GatedService<S> {
    inner: S,
    gated: AtomicBool,
    permits: Semaphore,
    fetches_gated: AtomicBool,
    fetch_permits: Semaphore,
    writes_started: AtomicUsize,
    fetches_started: AtomicUsize,
}

impl<S: PreferencesService> GatedService<S> {
    /// Calls pass straight through until held
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            gated: AtomicBool::new(false),
            permits: Semaphore::new(0),
            fetches_gated: AtomicBool::new(false),
            fetch_permits: Semaphore::new(0),
            writes_started: AtomicUsize::new(0),
            fetches_started: AtomicUsize::new(0),
        }
    }

    /// Block every subsequent write until released
    pub fn hold_writes(&self) {
        self.gated.store(true, Ordering::SeqCst);
    }

    /// Let `n` held writes proceed
    pub fn release_writes(&self, n: usize) {
        self.permits.add_permits(n);
    }

    /// Block every subsequent fetch until released
    pub fn hold_fetches(&self) {
        self.fetches_gated.store(true, Ordering::SeqCst);
    }

    /// Let `n` held fetches proceed
    pub fn release_fetches(&self, n: usize) {
        self.fetch_permits.add_permits(n);
    }

    /// Writes that reached the service, including ones still held
    pub fn writes_started(&self) -> usize {
        self.writes_started.load(Ordering::SeqCst)
    }

    /// Fetches that reached the service, including ones still held
    pub fn fetches_started(&self) -> usize {
        self.fetches_started.load(Ordering::SeqCst)
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: PreferencesService> PreferencesService for GatedService<S> {
    async fn fetch(&self) -> Result<PreferenceSet, FetchError> {
        self.fetches_started.fetch_add(1, Ordering::SeqCst);
        if self.fetches_gated.load(Ordering::SeqCst) {
            let permit = self
                .fetch_permits
                .acquire()
                .await
                .map_err(|_| ServiceError::Transport("gate closed".to_string()))?;
            permit.forget();
        }
        self.inner.fetch().await
    }

    async fn write(&self, partial: PreferenceSet) -> Result<Ack, WriteError> {
        self.writes_started.fetch_add(1, Ordering::SeqCst);
        if self.gated.load(Ordering::SeqCst) {
            let permit = self
                .permits
                .acquire()
                .await
                .map_err(|_| ServiceError::Transport("gate closed".to_string()))?;
            permit.forget();
        }
        self.inner.write(partial).await
    }
}

/// In-memory backend behind a gate, shared between test and engine
pub fn gated_memory_service(
    initial: PreferenceSet,
) -> Arc<GatedService<InMemoryPreferencesService>> {
    Arc::new(GatedService::new(InMemoryPreferencesService::new(initial)))
}

/// Plain in-memory backend
pub fn memory_service(initial: PreferenceSet) -> Arc<InMemoryPreferencesService> {
    Arc::new(InMemoryPreferencesService::new(initial))
}

/// `{enable_todo_reminders: false, todo_reminders_slack: false}`
pub fn todo_reminders_off() -> PreferenceSet {
    PreferenceSet::new()
        .with(PreferenceKey::EnableTodoReminders, false)
        .with(PreferenceKey::TodoRemindersSlack, false)
}

/// Every key off
pub fn all_off() -> PreferenceSet {
    PreferenceSet::uniform(false)
}

/// Single-key partial set
pub fn edit(key: PreferenceKey, value: bool) -> PreferenceSet {
    PreferenceSet::new().with(key, value)
}

/// Default settle window used across tests
pub const SETTLE: Duration = Duration::from_millis(1000);

/// Sleep past one settle window (paused-clock tests advance instantly)
pub async fn past_settle_window() {
    tokio::time::sleep(SETTLE + Duration::from_millis(1)).await;
}

/// Sleep for a fraction of the settle window
pub async fn within_settle_window() {
    tokio::time::sleep(SETTLE / 4).await;
}

/// Route `tracing` output to the test harness; honours `RUST_LOG`
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
