//! Command execution against the run log.
//!
//! Every external program the harness starts goes through [`CommandRunner`].
//! A run has three steps:
//!
//! 1. record the intended invocation in the run log and on stdout,
//! 2. spawn the program with stdout and stderr appended to the run log,
//! 3. record the exit code in the run log.
//!
//! The key cache path is passed to the child only. The harness's own
//! environment is never modified.
//!
//! # Examples
//!
//! ```no_run
//! use hab_test::command::{CommandRunner, Invocation, RunnerConfig};
//!
//! # async fn example() -> hab_test::error::HarnessResult<()> {
//! let runner = CommandRunner::new(RunnerConfig::new("/tmp/run.log", "/tmp/keys"));
//! let result = runner.run(&Invocation::new("/bin/hab").arg("--version")).await?;
//! assert!(result.success());
//! # Ok(())
//! # }
//! ```

use std::ffi::OsString;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::{HarnessError, HarnessResult};
use crate::platform::{Platform, KEY_CACHE_ENV_VAR};

/// A program and its argument list. Never passed through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: PathBuf,
    args: Vec<OsString>,
}

impl Invocation {
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Appends one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn arguments(&self) -> &[OsString] {
        &self.args
    }
}

impl fmt::Display for Invocation {
    /// Renders a shell-like line for the audit trail. Arguments that are empty
    /// or contain whitespace are single-quoted.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            let arg = arg.to_string_lossy();
            if arg.is_empty() || arg.chars().any(char::is_whitespace) {
                write!(f, " '{arg}'")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Outcome of one external command.
///
/// # Examples
///
/// ```
/// use hab_test::command::CommandResult;
///
/// assert!(CommandResult::new(0).success());
/// assert!(!CommandResult::new(127).success());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct CommandResult {
    exit_code: i32,
}

impl CommandResult {
    pub fn new(exit_code: i32) -> Self {
        Self { exit_code }
    }

    /// The process exit code, or `-1` if it was killed by a signal.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// What the runner hands to every child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Run log that receives the audit trail and all child output.
    pub log_file: PathBuf,
    /// Exported to the child as `HAB_CACHE_KEY_PATH`.
    pub key_cache: PathBuf,
    /// Upper bound per command. `None` waits forever.
    pub timeout: Option<Duration>,
}

impl RunnerConfig {
    #[must_use]
    pub fn new(log_file: impl Into<PathBuf>, key_cache: impl Into<PathBuf>) -> Self {
        Self {
            log_file: log_file.into(),
            key_cache: key_cache.into(),
            timeout: None,
        }
    }

    /// Takes the log file and key cache from a platform.
    #[must_use]
    pub fn for_platform(platform: &dyn Platform) -> Self {
        Self::new(platform.log_file_path(), platform.key_cache())
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Runs external programs sequentially against one run log.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    config: RunnerConfig,
}

impl CommandRunner {
    #[must_use]
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Runs `invocation` to completion and returns its exit code.
    ///
    /// A non-zero exit code is returned as data, not as an error. The command
    /// line is printed to stdout as well as recorded in the run log.
    ///
    /// # Errors
    ///
    /// - [`HarnessError::Log`] if the run log cannot be opened or written
    /// - [`HarnessError::Spawn`] if the program cannot be started
    /// - [`HarnessError::Timeout`] if the configured timeout elapsed; the child is killed
    pub async fn run(&self, invocation: &Invocation) -> HarnessResult<CommandResult> {
        let mut log = self.open_log()?;
        self.record(&mut log, format_args!("$ {invocation}"))?;
        println!("$ {invocation}");
        info!(command = %invocation, "Running command");

        let stdout = log.try_clone().map_err(|e| self.log_error(e))?;
        let stderr = log.try_clone().map_err(|e| self.log_error(e))?;

        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .env(KEY_CACHE_ENV_VAR, &self.config.key_cache)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| {
                warn!(program = %invocation.program.display(), error = %source, "Spawn failed");
                HarnessError::Spawn {
                    program: invocation.program.display().to_string(),
                    source,
                }
            })?;

        let status = match self.config.timeout {
            None => child.wait().await?,
            Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
                Ok(status) => status?,
                Err(_) => {
                    if let Err(e) = child.kill().await {
                        debug!(error = %e, "Kill after timeout failed");
                    }
                    warn!(
                        command = %invocation,
                        timeout_ms = %limit.as_millis(),
                        "Command timed out and was killed"
                    );
                    self.record(
                        &mut log,
                        format_args!("timed out after {}", humantime::format_duration(limit)),
                    )?;
                    return Err(HarnessError::Timeout {
                        command: invocation.to_string(),
                        timeout: limit,
                    });
                }
            },
        };

        let result = CommandResult::new(status.code().unwrap_or(-1));
        self.record(&mut log, format_args!("exit code: {}", result.exit_code()))?;
        debug!(command = %invocation, exit_code = result.exit_code(), "Command finished");
        Ok(result)
    }

    fn open_log(&self) -> HarnessResult<File> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.config.log_file)
            .map_err(|e| self.log_error(e))
    }

    fn record(&self, log: &mut File, line: fmt::Arguments<'_>) -> HarnessResult<()> {
        writeln!(log, "{line}").map_err(|e| self.log_error(e))
    }

    fn log_error(&self, source: std::io::Error) -> HarnessError {
        HarnessError::log(&self.config.log_file, source)
    }
}
