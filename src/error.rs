//! Centralized error types for the harness.
//!
//! `HarnessError` covers every failure the harness itself can hit. A non-zero
//! exit code from an external `hab` process is never one of them: it is
//! returned as data in a [`CommandResult`](crate::command::CommandResult) and
//! only scenarios decide whether it means failure.
//!
//! # Example
//!
//! ```
//! use hab_test::error::{HarnessError, HarnessResult};
//!
//! fn pick_platform(os: &str) -> HarnessResult<()> {
//!     if os != "linux" {
//!         return Err(HarnessError::unsupported_platform("windows"));
//!     }
//!     Ok(())
//! }
//!
//! let err = pick_platform("windows").unwrap_err();
//! assert_eq!(err.to_string(), "platform: windows is not supported");
//! ```

use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias using `HarnessError`.
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Errors raised by the harness itself.
#[derive(Debug, Error)]
pub enum HarnessError {
    // ============== Platform Errors ==============
    /// The host operating system has no platform implementation.
    #[error("platform: {0} is not supported")]
    UnsupportedPlatform(&'static str),

    /// A scratch directory could not be created or released.
    #[error("platform: {action} {what} failed: {source}")]
    ScratchDir {
        /// What was being done ("create" or "remove").
        action: &'static str,
        /// Which directory ("key cache" or "studio root").
        what: &'static str,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    // ============== Command Errors ==============
    /// The external program could not be started at all.
    #[error("command: failed to spawn '{program}': {source}")]
    Spawn {
        /// The program that failed to start.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The external program outlived the configured timeout and was killed.
    #[error("command: '{command}' timed out after {}", humantime::format_duration(*.timeout))]
    Timeout {
        /// The command line that timed out.
        command: String,
        /// The limit that was exceeded.
        timeout: Duration,
    },

    /// The run log could not be opened or written.
    #[error("log: I/O error for '{}': {source}", .path.display())]
    Log {
        /// Path to the run log.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    // ============== Fixture Errors ==============
    /// Copying a fixture tree into a scratch directory failed.
    #[error("fixture: failed to copy '{}': {message}", .from.display())]
    FixtureCopy {
        /// The fixture source path.
        from: PathBuf,
        /// Description of the failure.
        message: String,
    },

    // ============== Configuration Errors ==============
    /// Settings failed validation.
    #[error("config: {0}")]
    Config(String),

    /// Settings file was not valid TOML.
    #[error("config: TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Any other I/O error.
    #[error("io: {0}")]
    Io(#[from] io::Error),
}

impl HarnessError {
    /// Creates an unsupported-platform error.
    #[must_use]
    pub fn unsupported_platform(os: &'static str) -> Self {
        Self::UnsupportedPlatform(os)
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a log I/O error for the given path.
    #[must_use]
    pub fn log(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Log {
            path: path.into(),
            source,
        }
    }
}
