//! Prefsync Engine - debounced preference write-back
//!
//! Takes per-interaction edits from the UI, renders them immediately, and
//! writes them back as few times as possible:
//! - Optimistic local application of every edit
//! - Coalescing of edits within a settle window into one partial write
//! - At most one service call in flight; later edits wait for the next batch
//! - Recovery by re-fetching server truth when a write fails
//!
//! # Example
//!
//! ```rust,ignore
//! use prefsync_engine::{EngineConfig, SyncEngine};
//! use prefsync_model::PreferenceKey;
//!
//! # async fn example(service: std::sync::Arc<dyn prefsync_service::PreferencesService>)
//! #     -> Result<(), Box<dyn std::error::Error>> {
//! let engine = SyncEngine::spawn(service, EngineConfig::new())?;
//! engine.load().await?;
//!
//! engine.set(PreferenceKey::EnableTodoReminders, true)?;
//! engine.set(PreferenceKey::TodoRemindersSlack, true)?;
//! // one write, about a second later
//!
//! engine.shutdown().await?;
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod config;
pub mod engine;
pub mod error;
pub mod phase;
pub mod status;

pub use config::{AppConfig, EngineConfig};
pub use engine::{EngineId, SyncEngine};
pub use error::{ConfigError, SyncError, TransitionError};
pub use phase::{allowed_transitions, validate_transition, SyncPhase};
pub use status::SyncStatus;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
