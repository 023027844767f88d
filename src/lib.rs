//! hab-test - end-to-end harness for the `hab` package-management CLI.
//!
//! A run builds an immutable [`Platform`](platform::Platform), generates keys
//! and a fresh studio through the real `hab` binary, runs a fixed list of
//! scenarios against it, then tears down exactly once.

pub mod command;
pub mod config;
pub mod error;
pub mod hab;
pub mod identity;
pub mod logging;
pub mod platform;
pub mod suite;

// Re-export core types for convenient access
pub use command::{CommandResult, CommandRunner, Invocation, RunnerConfig};
pub use config::{HarnessSettings, Retention};
pub use error::{HarnessError, HarnessResult};
pub use platform::Platform;
pub use suite::{Suite, SuiteOptions, SuiteReport};
