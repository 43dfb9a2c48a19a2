//! Prefsync CLI - command-line front end
//!
//! Library half of the `prefsync` binary, kept separate so the pieces can
//! be tested without spawning a process.

#![warn(unreachable_pub)]

pub mod commands;
pub mod logging;
pub mod simulator;

pub use commands::{format_groups, parse_assignment, AssignmentError};
pub use simulator::{run_simulator, SimulatorConfig, SimulatorReport, Violation};
