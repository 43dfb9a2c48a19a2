//! Debounced sync engine
//!
//! The handle ([`SyncEngine`]) and a worker task share the store, the
//! pending buffer and the phase behind one lock. The handle mutates them
//! synchronously on every edit; the worker owns the settle timer and is
//! the only place that talks to the service, so writes and fetches are
//! strictly sequential.
//!
//! # Flow
//! 1. `on_edit` merges into the store (rendered immediately) and into the
//!    pending buffer, then pokes the worker
//! 2. the worker re-arms the settle timer on every poke
//! 3. on expiry it takes the buffer and writes it as one partial set
//! 4. success confirms the batch; failure drops it and re-fetches
//!
//! Edits made while a write or a fetch is in flight stay buffered and go
//! out after the call resolves and a fresh settle window elapses.

use crate::config::EngineConfig;
use crate::error::{ConfigError, SyncError};
use crate::phase::{validate_transition, SyncPhase};
use crate::status::SyncStatus;
use chrono::Utc;
use parking_lot::Mutex;
use prefsync_model::{render_groups, GroupView, PendingMutation, PreferenceKey, PreferenceSet, Role};
use prefsync_service::{Ack, PreferencesService};
use prefsync_store::PreferenceStore;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::Instrument;
use ulid::Ulid;

/// Unique engine identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EngineId(pub Ulid);

impl EngineId {
    /// Generate new engine ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for EngineId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EngineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

type Reply<T> = oneshot::Sender<Result<T, SyncError>>;

/// Messages sent to the worker
enum Command {
    /// Edits were buffered; re-arm the settle timer
    Edited,
    /// Write the buffer now, skipping the settle window
    Flush(Reply<Option<Ack>>),
    /// Fetch the authoritative set
    Load(Reply<PreferenceSet>),
    /// Flush, then stop
    Shutdown(Reply<Option<Ack>>),
}

#[derive(Debug)]
struct EngineState {
    store: PreferenceStore,
    pending: PendingMutation,
    phase: SyncPhase,
    last_error: Option<SyncError>,
    writes_acknowledged: u64,
    writes_failed: u64,
    last_synced_at: Option<chrono::DateTime<Utc>>,
}

impl EngineState {
    fn new() -> Self {
        Self {
            store: PreferenceStore::new(),
            pending: PendingMutation::new(),
            phase: SyncPhase::Idle,
            last_error: None,
            writes_acknowledged: 0,
            writes_failed: 0,
            last_synced_at: None,
        }
    }

    fn advance(&mut self, to: SyncPhase) {
        if self.phase == to {
            return;
        }
        match validate_transition(self.phase, to) {
            Ok(()) => {
                tracing::trace!(from = %self.phase, to = %to, "phase transition");
                self.phase = to;
            }
            Err(err) => {
                #[cfg(feature = "strict-debug")]
                panic!("{err}");

                tracing::error!(error = %err, "rejected phase transition");
            }
        }
    }

    /// Idle or PendingEdits, depending on the buffer
    fn settle_phase(&mut self) {
        let next = if self.pending.is_empty() {
            SyncPhase::Idle
        } else {
            SyncPhase::PendingEdits
        };
        self.advance(next);
    }

    fn status(&self) -> SyncStatus {
        SyncStatus {
            phase: self.phase,
            saving: self.store.saving(),
            loaded: self.store.is_loaded(),
            pending_keys: self.pending.edits().len(),
            last_error: self.last_error.as_ref().map(SyncError::user_message),
            writes_acknowledged: self.writes_acknowledged,
            writes_failed: self.writes_failed,
            last_synced_at: self.last_synced_at,
        }
    }
}

struct Shared {
    state: Mutex<EngineState>,
    status: watch::Sender<SyncStatus>,
}

impl Shared {
    fn publish(&self, state: &EngineState) {
        self.status.send_replace(state.status());
    }
}

/// Handle to one preference-sync session
///
/// Must be created inside a tokio runtime. Dropping the handle aborts the
/// worker and loses unsent edits; use [`SyncEngine::shutdown`] to flush
/// first.
pub struct SyncEngine {
    id: EngineId,
    shared: Arc<Shared>,
    commands: mpsc::UnboundedSender<Command>,
    worker: Option<JoinHandle<()>>,
}

impl fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncEngine")
            .field("id", &self.id)
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}

impl SyncEngine {
    /// Start an engine backed by `service`
    ///
    /// Nothing is loaded yet; call [`SyncEngine::load`] first.
    ///
    /// # Errors
    /// `ConfigError` if `config` is invalid.
    pub fn spawn(
        service: Arc<dyn PreferencesService>,
        config: EngineConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let id = EngineId::new();
        let (status, _) = watch::channel(SyncStatus::initial());
        let shared = Arc::new(Shared {
            state: Mutex::new(EngineState::new()),
            status,
        });
        let (commands, rx) = mpsc::unbounded_channel();

        let worker = Worker {
            shared: shared.clone(),
            service,
            settle_window: config.settle_window(),
            deadline: None,
        };
        let span = tracing::info_span!("sync_engine", engine = %id);
        let handle = tokio::spawn(worker.run(rx).instrument(span));

        tracing::debug!(engine = %id, settle_ms = config.settle_window_ms, "sync engine started");

        Ok(Self {
            id,
            shared,
            commands,
            worker: Some(handle),
        })
    }

    /// Engine identifier
    #[inline]
    #[must_use]
    pub fn id(&self) -> EngineId {
        self.id
    }

    /// Replace the held set with the server's copy
    ///
    /// Discards anything buffered before the call. Edits made while the
    /// fetch is in flight are re-applied on top of the result.
    ///
    /// # Errors
    /// `SyncError::Fetch` if the service call fails; the previous state
    /// (or the empty state) stays rendered.
    pub async fn load(&self) -> Result<PreferenceSet, SyncError> {
        self.request(Command::Load).await
    }

    /// Apply a user edit
    ///
    /// Returns the full rendered set including the edit, before any
    /// network round trip.
    ///
    /// # Errors
    /// - `SyncError::Store` before the first successful load
    /// - `SyncError::Closed` if the worker has stopped; the edit is still
    ///   rendered but will not be written
    pub fn on_edit(&self, partial: PreferenceSet) -> Result<PreferenceSet, SyncError> {
        let rendered = {
            let mut state = self.shared.state.lock();
            let rendered = state.store.apply(&partial)?;
            if partial.is_empty() {
                return Ok(rendered);
            }
            state.pending.merge(&partial);
            if state.phase == SyncPhase::Idle {
                state.advance(SyncPhase::PendingEdits);
            }
            self.shared.publish(&state);
            rendered
        };

        self.commands
            .send(Command::Edited)
            .map_err(|_| SyncError::Closed)?;
        Ok(rendered)
    }

    /// Toggle one flag
    ///
    /// # Errors
    /// As [`SyncEngine::on_edit`].
    pub fn set(&self, key: PreferenceKey, value: bool) -> Result<PreferenceSet, SyncError> {
        self.on_edit(PreferenceSet::new().with(key, value))
    }

    /// Write buffered edits now instead of waiting for the settle window
    ///
    /// Also serves as a manual retry after a failure.
    ///
    /// # Errors
    /// `SyncError::Write` if the write failed (recovery has already run).
    pub async fn flush_now(&self) -> Result<Option<Ack>, SyncError> {
        self.request(Command::Flush).await
    }

    /// Flush buffered edits and stop the worker
    ///
    /// # Errors
    /// The final flush's error, if any. The worker stops regardless.
    pub async fn shutdown(mut self) -> Result<Option<Ack>, SyncError> {
        let result = self.request(Command::Shutdown).await;
        if let Some(worker) = self.worker.take() {
            if let Err(err) = worker.await {
                tracing::error!(engine = %self.id, error = %err, "sync worker panicked");
            }
        }
        tracing::debug!(engine = %self.id, "sync engine stopped");
        result
    }

    /// Rendered set, if loaded
    #[must_use]
    pub fn snapshot(&self) -> Option<PreferenceSet> {
        self.shared.state.lock().store.snapshot().cloned()
    }

    /// Edits not yet dispatched
    #[must_use]
    pub fn pending(&self) -> PreferenceSet {
        self.shared.state.lock().pending.edits().clone()
    }

    /// Whether a write is in progress
    #[must_use]
    pub fn saving(&self) -> bool {
        self.shared.state.lock().store.saving()
    }

    /// Current phase
    #[must_use]
    pub fn phase(&self) -> SyncPhase {
        self.shared.state.lock().phase
    }

    /// Most recent failure, cleared by the next success
    #[must_use]
    pub fn last_error(&self) -> Option<SyncError> {
        self.shared.state.lock().last_error.clone()
    }

    /// Current status
    #[must_use]
    pub fn status(&self) -> SyncStatus {
        self.shared.status.borrow().clone()
    }

    /// Receive every status change
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.shared.status.subscribe()
    }

    /// Groups visible to `role` with their current values
    ///
    /// Empty until the first successful load.
    #[must_use]
    pub fn render(&self, role: Role) -> Vec<GroupView> {
        let state = self.shared.state.lock();
        state
            .store
            .snapshot()
            .map(|set| render_groups(role, set))
            .unwrap_or_default()
    }

    async fn request<T>(&self, make: impl FnOnce(Reply<T>) -> Command) -> Result<T, SyncError> {
        let (tx, rx) = oneshot::channel();
        self.commands.send(make(tx)).map_err(|_| SyncError::Closed)?;
        rx.await.map_err(|_| SyncError::Closed)?
    }
}

impl Drop for SyncEngine {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.abort();
        }
    }
}

/// Owns the timer; the only caller of the service
struct Worker {
    shared: Arc<Shared>,
    service: Arc<dyn PreferencesService>,
    settle_window: Duration,
    deadline: Option<Instant>,
}

impl Worker {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        loop {
            let deadline = self.deadline;
            tokio::select! {
                biased;
                cmd = commands.recv() => match cmd {
                    Some(Command::Edited) => self.arm(),
                    Some(Command::Flush(reply)) => {
                        self.deadline = None;
                        let _ = reply.send(self.flush().await);
                    }
                    Some(Command::Load(reply)) => {
                        self.deadline = None;
                        let _ = reply.send(self.load().await);
                    }
                    Some(Command::Shutdown(reply)) => {
                        self.deadline = None;
                        let _ = reply.send(self.flush().await);
                        break;
                    }
                    None => break,
                },
                () = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.deadline = None;
                    if let Err(err) = self.flush().await {
                        tracing::debug!(error = %err, "scheduled flush failed");
                    }
                }
            }
        }
    }

    /// Cancel any armed timer and start a fresh settle window
    fn arm(&mut self) {
        self.deadline = Some(Instant::now() + self.settle_window);
    }

    async fn flush(&mut self) -> Result<Option<Ack>, SyncError> {
        let batch = {
            let mut state = self.shared.state.lock();
            if state.pending.is_empty() {
                return Ok(None);
            }
            let batch = state.pending.take();
            state.store.set_saving(true);
            state.advance(SyncPhase::Writing);
            self.shared.publish(&state);
            batch
        };

        tracing::debug!(keys = batch.len(), batch = %batch, "dispatching coalesced write");

        match self.service.write(batch.clone()).await {
            Ok(ack) => {
                let mut state = self.shared.state.lock();
                state.store.confirm(&batch);
                state.store.set_saving(false);
                state.writes_acknowledged += 1;
                state.last_synced_at = Some(Utc::now());
                state.last_error = None;
                state.settle_phase();
                self.shared.publish(&state);
                tracing::info!(keys = ack.keys, "preferences saved");
                Ok(Some(ack))
            }
            Err(err) => {
                tracing::warn!(error = %err, "write failed, reloading from server");
                {
                    let mut state = self.shared.state.lock();
                    state.writes_failed += 1;
                    state.last_error = Some(SyncError::Write(err.clone()));
                    state.advance(SyncPhase::Reconciling);
                    self.shared.publish(&state);
                }
                self.reconcile().await;
                Err(SyncError::Write(err))
            }
        }
    }

    /// Recovery after a failed write: trust the server
    ///
    /// The failed batch is dropped. Edits buffered since it was dispatched
    /// are re-applied on top of whatever state results.
    async fn reconcile(&mut self) {
        let fetched = self.service.fetch().await;

        let mut state = self.shared.state.lock();
        match state.store.accept_fetch(fetched) {
            Ok(_) => tracing::info!("resynchronized with server after failed write"),
            Err(err) => {
                tracing::error!(error = %err, "recovery fetch failed, keeping last confirmed state");
                state.store.revert_to_confirmed();
                state.last_error = Some(SyncError::Fetch(err));
            }
        }

        let buffered = state.pending.edits().clone();
        if !buffered.is_empty() {
            if let Err(err) = state.store.apply(&buffered) {
                tracing::error!(error = %err, "could not re-apply buffered edits");
            }
        }
        state.store.set_saving(false);
        state.settle_phase();
        self.shared.publish(&state);
    }

    async fn load(&mut self) -> Result<PreferenceSet, SyncError> {
        {
            let mut state = self.shared.state.lock();
            if !state.pending.is_empty() {
                tracing::debug!(
                    keys = state.pending.edits().len(),
                    "load discards buffered edits"
                );
            }
            state.pending.clear();
            state.advance(SyncPhase::Idle);
            self.shared.publish(&state);
        }

        let fetched = self.service.fetch().await;

        let mut state = self.shared.state.lock();
        let result = match state.store.accept_fetch(fetched) {
            Ok(mut rendered) => {
                let buffered = state.pending.edits().clone();
                if !buffered.is_empty() {
                    rendered.merge(&buffered);
                    if let Err(err) = state.store.apply(&buffered) {
                        tracing::error!(error = %err, "could not re-apply buffered edits");
                    }
                }
                state.last_error = None;
                state.last_synced_at = Some(Utc::now());
                tracing::info!(keys = rendered.len(), "preferences loaded");
                Ok(rendered)
            }
            Err(err) => {
                state.last_error = Some(SyncError::Fetch(err.clone()));
                Err(SyncError::Fetch(err))
            }
        };
        state.settle_phase();
        self.shared.publish(&state);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prefsync_model::PreferenceKey::*;
    use prefsync_service::{MockPreferencesService, ServiceError};

    fn config() -> EngineConfig {
        EngineConfig::new().with_settle_window(Duration::from_millis(100))
    }

    #[test]
    fn advance_ignores_same_phase() {
        let mut state = EngineState::new();
        state.advance(SyncPhase::Idle);
        assert_eq!(state.phase, SyncPhase::Idle);
    }

    #[test]
    fn status_reflects_state() {
        let mut state = EngineState::new();
        state.store.install(PreferenceSet::uniform(false));
        state.pending.merge(&PreferenceSet::new().with(EnableTodoReminders, true));
        state.advance(SyncPhase::PendingEdits);

        let status = state.status();
        assert_eq!(status.phase, SyncPhase::PendingEdits);
        assert!(status.loaded);
        assert_eq!(status.pending_keys, 1);
        assert!(!status.saving);
    }

    #[tokio::test]
    async fn zero_settle_window_is_rejected() {
        let service = Arc::new(MockPreferencesService::new());
        let res = SyncEngine::spawn(service, EngineConfig::new().with_settle_window(Duration::ZERO));
        assert!(matches!(res, Err(ConfigError::ZeroSettleWindow)));
    }

    #[tokio::test(start_paused = true)]
    async fn edit_before_load_is_rejected() {
        let service = Arc::new(MockPreferencesService::new());
        let engine = SyncEngine::spawn(service, config()).unwrap();

        let res = engine.set(EnableMeetingPrep, true);
        assert!(matches!(res, Err(SyncError::Store(_))));
        assert!(engine.render(Role::Admin).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn write_payload_is_the_partial_not_the_full_set() {
        let mut mock = MockPreferencesService::new();
        mock.expect_fetch()
            .times(1)
            .returning(|| Ok(PreferenceSet::uniform(false)));
        mock.expect_write()
            .withf(|partial| *partial == PreferenceSet::new().with(EnableBudgetAlerts, true))
            .times(1)
            .returning(|partial| Ok(Ack { keys: partial.len() }));

        let engine = SyncEngine::spawn(Arc::new(mock), config()).unwrap();
        engine.load().await.unwrap();
        engine.set(EnableBudgetAlerts, true).unwrap();

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(engine.status().writes_acknowledged, 1);
        engine.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn failed_load_surfaces_error_and_stays_empty() {
        let mut mock = MockPreferencesService::new();
        mock.expect_fetch()
            .times(1)
            .returning(|| Err(ServiceError::Transport("offline".into()).into()));

        let engine = SyncEngine::spawn(Arc::new(mock), config()).unwrap();
        let err = engine.load().await.unwrap_err();

        assert!(matches!(err, SyncError::Fetch(_)));
        assert!(engine.snapshot().is_none());
        let status = engine.status();
        assert!(!status.loaded);
        assert_eq!(
            status.last_error.as_deref(),
            Some("Could not load notification settings: offline")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn drop_stops_worker_without_touching_status() {
        let service = Arc::new(MockPreferencesService::new());
        let engine = SyncEngine::spawn(service, config()).unwrap();
        let shared = engine.shared.clone();
        drop(engine);

        // The status channel outlives the handle but nothing changes it.
        assert_eq!(*shared.status.borrow(), SyncStatus::initial());
    }
}
