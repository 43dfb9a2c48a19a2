//! Sync phase state machine
//!
//! Every phase change in the engine goes through [`validate_transition`].
//! Illegal moves are logged and ignored (or panic under `strict-debug`).

use crate::error::TransitionError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the engine is in its write-back cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    /// Nothing buffered, nothing in flight
    Idle,
    /// Edits buffered, settle timer armed
    PendingEdits,
    /// One batch in flight
    Writing,
    /// Write failed; recovery fetch in flight
    Reconciling,
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::PendingEdits => "pending_edits",
            Self::Writing => "writing",
            Self::Reconciling => "reconciling",
        })
    }
}

/// Validates a phase transition.
///
/// Staying in the same phase is not a transition and is rejected here;
/// callers skip no-op moves.
///
/// # Errors
/// `TransitionError` if `to` is not reachable from `from`.
pub fn validate_transition(from: SyncPhase, to: SyncPhase) -> Result<(), TransitionError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(TransitionError { from, to })
    }
}

/// Phases reachable from `from` in one step
#[must_use]
pub fn allowed_transitions(from: SyncPhase) -> Vec<SyncPhase> {
    use SyncPhase::*;
    match from {
        Idle => vec![PendingEdits],
        // Idle: an explicit load discarded the buffer
        PendingEdits => vec![Writing, Idle],
        Writing => vec![Idle, PendingEdits, Reconciling],
        Reconciling => vec![Idle, PendingEdits],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_cycle() {
        use SyncPhase::*;
        assert!(validate_transition(Idle, PendingEdits).is_ok());
        assert!(validate_transition(PendingEdits, Writing).is_ok());
        assert!(validate_transition(Writing, Idle).is_ok());
    }

    #[test]
    fn reconciling_only_after_writing() {
        use SyncPhase::*;
        assert!(validate_transition(Writing, Reconciling).is_ok());
        assert!(validate_transition(Idle, Reconciling).is_err());
        assert!(validate_transition(PendingEdits, Reconciling).is_err());
    }

    #[test]
    fn no_write_without_edits() {
        let err = validate_transition(SyncPhase::Idle, SyncPhase::Writing).unwrap_err();
        assert_eq!(err.to_string(), "illegal sync phase transition: idle -> writing");
    }

    #[test]
    fn allowed_transitions_agree_with_validation() {
        use SyncPhase::*;
        for from in [Idle, PendingEdits, Writing, Reconciling] {
            let allowed = allowed_transitions(from);
            assert!(!allowed.contains(&from), "{from} lists itself");
            for to in [Idle, PendingEdits, Writing, Reconciling] {
                assert_eq!(validate_transition(from, to).is_ok(), allowed.contains(&to));
            }
        }
    }
}
