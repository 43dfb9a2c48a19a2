//! Sync simulator - randomized end-to-end runs against the in-memory backend
//!
//! Each simulated user gets its own backend and engine, then plays a seeded
//! script of edit bursts. Bursts are separated by more than the settle
//! window; edits inside a burst are closer together than half of it. After
//! the script the engine is flushed and checked against the backend.

use futures::future::join_all;
use prefsync_engine::{EngineConfig, SyncEngine};
use prefsync_model::{PreferenceKey, PreferenceSet};
use prefsync_service::InMemoryPreferencesService;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;
use std::fmt;
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

/// Simulator configuration
#[derive(Debug, Clone, Serialize)]
pub struct SimulatorConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// Independent users, run concurrently
    pub users: usize,
    /// Edits per user
    pub edits_per_user: usize,
    /// Settle window in milliseconds
    pub settle_ms: u64,
    /// Chance that an edit closes its burst
    pub burst_end_probability: f64,
    /// Fail every n-th write on each backend
    pub fail_every: Option<usize>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            users: 4,
            edits_per_user: 40,
            settle_ms: 25,
            burst_end_probability: 0.2,
            fail_every: None,
        }
    }
}

/// Property broken during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// More writes than bursts
    ExcessWrites {
        /// User index
        user: usize,
        /// Write attempts seen by the backend
        writes: usize,
        /// Bursts in the script
        bursts: usize,
    },
    /// A write carried no keys
    EmptyWrite {
        /// User index
        user: usize,
    },
    /// Engine and backend disagree after the final flush
    Diverged {
        /// User index
        user: usize,
    },
    /// No failures injected, yet the backend is missing an edit
    LostEdits {
        /// User index
        user: usize,
    },
    /// Engine call failed outside of injected failures
    EngineError {
        /// User index
        user: usize,
        /// Error text
        message: String,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExcessWrites { user, writes, bursts } => {
                write!(f, "user {user}: {writes} writes for {bursts} bursts")
            }
            Self::EmptyWrite { user } => write!(f, "user {user}: empty write payload"),
            Self::Diverged { user } => write!(f, "user {user}: engine and backend diverged"),
            Self::LostEdits { user } => write!(f, "user {user}: backend is missing edits"),
            Self::EngineError { user, message } => write!(f, "user {user}: {message}"),
        }
    }
}

/// Counters for one user
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserStats {
    /// Edits applied
    pub edits: usize,
    /// Bursts in the script
    pub bursts: usize,
    /// Write attempts
    pub writes: usize,
    /// Writes the backend accepted
    pub accepted: usize,
    /// Fetches, including the initial load and recoveries
    pub fetches: usize,
}

/// Outcome of a simulator run
#[derive(Debug, Clone, Serialize)]
pub struct SimulatorReport {
    /// Configuration used
    pub config: SimulatorConfig,
    /// Per-user counters
    pub users: Vec<UserStats>,
    /// Violations in user order
    pub violations: Vec<Violation>,
}

impl SimulatorReport {
    /// Check if simulation passed
    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    /// Total write attempts
    #[must_use]
    pub fn total_writes(&self) -> usize {
        self.users.iter().map(|u| u.writes).sum()
    }

    /// Total edits
    #[must_use]
    pub fn total_edits(&self) -> usize {
        self.users.iter().map(|u| u.edits).sum()
    }

    /// Human-readable summary
    #[must_use]
    pub fn generate_text(&self) -> String {
        let mut report = String::new();
        let _ = writeln!(report, "=== Prefsync Simulator Report ===\n");
        let _ = writeln!(report, "Seed: {}", self.config.seed);
        let _ = writeln!(report, "Users: {}", self.users.len());
        let _ = writeln!(report, "Settle window: {}ms", self.config.settle_ms);
        let _ = writeln!(report, "Edits: {}", self.total_edits());
        let _ = writeln!(report, "Writes: {}", self.total_writes());
        let _ = writeln!(
            report,
            "Accepted: {}",
            self.users.iter().map(|u| u.accepted).sum::<usize>()
        );
        let _ = writeln!(report, "Violations: {}", self.violations.len());

        if !self.violations.is_empty() {
            let _ = writeln!(report, "\n=== Violations ===");
            for (i, v) in self.violations.iter().enumerate() {
                let _ = writeln!(report, "{}. {v}", i + 1);
            }
        }

        let _ = writeln!(
            report,
            "\n=== Result: {} ===",
            if self.passed() { "PASS" } else { "FAIL" }
        );
        report
    }
}

#[derive(Debug, Clone, Copy)]
struct Step {
    key: PreferenceKey,
    value: bool,
    gap: Duration,
    ends_burst: bool,
}

fn random_set(rng: &mut StdRng) -> PreferenceSet {
    PreferenceKey::ALL
        .iter()
        .map(|key| (*key, rng.gen_bool(0.5)))
        .collect()
}

fn script(rng: &mut StdRng, config: &SimulatorConfig) -> Vec<Step> {
    let settle = Duration::from_millis(config.settle_ms);
    let max_inner = (config.settle_ms / 2).max(1);
    (0..config.edits_per_user)
        .map(|_| {
            let key = PreferenceKey::ALL[rng.gen_range(0..PreferenceKey::ALL.len())];
            let ends_burst = rng.gen_bool(config.burst_end_probability.clamp(0.0, 1.0));
            let gap = if ends_burst {
                settle * 2
            } else {
                Duration::from_millis(rng.gen_range(0..max_inner))
            };
            Step {
                key,
                value: rng.gen_bool(0.5),
                gap,
                ends_burst,
            }
        })
        .collect()
}

fn burst_count(steps: &[Step]) -> usize {
    let closed = steps.iter().filter(|s| s.ends_burst).count();
    let trailing = steps.last().is_some_and(|s| !s.ends_burst);
    closed + usize::from(trailing)
}

async fn run_user(user: usize, config: SimulatorConfig) -> (UserStats, Vec<Violation>) {
    let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(user as u64));
    let initial = random_set(&mut rng);
    let steps = script(&mut rng, &config);
    let bursts = burst_count(&steps);

    let service = Arc::new(InMemoryPreferencesService::new(initial.clone()));
    service.fail_every_nth_write(config.fail_every);

    let mut violations = Vec::new();
    let engine_error = |message: String| Violation::EngineError { user, message };

    let engine = match SyncEngine::spawn(
        service.clone(),
        EngineConfig::new().with_settle_window(Duration::from_millis(config.settle_ms)),
    ) {
        Ok(engine) => engine,
        Err(err) => return (UserStats::default(), vec![engine_error(err.to_string())]),
    };
    if let Err(err) = engine.load().await {
        return (UserStats::default(), vec![engine_error(err.to_string())]);
    }

    let mut expected = initial;
    for step in &steps {
        if let Err(err) = engine.set(step.key, step.value) {
            violations.push(engine_error(err.to_string()));
            break;
        }
        expected.set(step.key, step.value);
        tokio::time::sleep(step.gap).await;
    }

    // a failing final flush recovers from the backend, so both ends agree either way
    if let Err(err) = engine.flush_now().await {
        tracing::debug!(user, error = %err, "final flush failed");
    }
    let rendered = engine.snapshot();
    if let Err(err) = engine.shutdown().await {
        tracing::debug!(user, error = %err, "shutdown flush failed");
    }

    let server = service.snapshot();
    let log = service.write_log();

    if log.len() > bursts {
        violations.push(Violation::ExcessWrites {
            user,
            writes: log.len(),
            bursts,
        });
    }
    if log.iter().any(PreferenceSet::is_empty) {
        violations.push(Violation::EmptyWrite { user });
    }
    if rendered.as_ref() != Some(&server) {
        violations.push(Violation::Diverged { user });
    }
    if config.fail_every.is_none() && server != expected {
        violations.push(Violation::LostEdits { user });
    }

    let stats = UserStats {
        edits: steps.len(),
        bursts,
        writes: log.len(),
        accepted: service.accepted_writes(),
        fetches: service.fetch_count(),
    };
    tracing::debug!(user, writes = stats.writes, bursts, "simulated user finished");
    (stats, violations)
}

/// Run every simulated user concurrently
pub async fn run_simulator(config: SimulatorConfig) -> SimulatorReport {
    tracing::info!(
        seed = config.seed,
        users = config.users,
        settle_ms = config.settle_ms,
        "starting simulation"
    );

    let outcomes = join_all((0..config.users).map(|user| run_user(user, config.clone()))).await;

    let mut users = Vec::with_capacity(outcomes.len());
    let mut violations = Vec::new();
    for (stats, found) in outcomes {
        users.push(stats);
        violations.extend(found);
    }

    SimulatorReport {
        config,
        users,
        violations,
    }
}
