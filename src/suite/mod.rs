//! Suite lifecycle: setup once, scenarios in order, teardown exactly once.
//!
//! Setup problems never abort the run. A key that failed to generate or a
//! studio that failed to build shows up later as a scenario failure, which is
//! the only place pass/fail is decided. Teardown runs after the last scenario
//! whatever the outcomes were, and its own failures are reported as warnings
//! that never change the verdict.

pub mod fixture;
pub mod scenarios;

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::command::{CommandResult, CommandRunner, Invocation, RunnerConfig};
use crate::config::{HarnessSettings, Retention};
use crate::error::{HarnessError, HarnessResult};
use crate::hab::HabCli;
use crate::platform::Platform;

/// Why a scenario did not pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScenarioFailure {
    /// A postcondition did not hold.
    #[error("{what}: expected {expected}, got {observed}")]
    Assertion {
        what: String,
        expected: String,
        observed: String,
    },

    /// Fixture staging failed before the command under test ran.
    #[error("fixture: {0}")]
    Fixture(String),

    /// The harness could not run the command under test.
    #[error("harness: {0}")]
    Harness(String),

    /// The scenario panicked. Carries the panic message.
    #[error("panicked: {0}")]
    Panicked(String),
}

impl ScenarioFailure {
    #[must_use]
    pub fn assertion(
        what: impl Into<String>,
        expected: impl Into<String>,
        observed: impl Into<String>,
    ) -> Self {
        Self::Assertion {
            what: what.into(),
            expected: expected.into(),
            observed: observed.into(),
        }
    }
}

impl From<HarnessError> for ScenarioFailure {
    fn from(err: HarnessError) -> Self {
        match err {
            HarnessError::FixtureCopy { .. } => Self::Fixture(err.to_string()),
            other => Self::Harness(other.to_string()),
        }
    }
}

/// What a scenario can see while it runs.
#[derive(Debug, Clone, Copy)]
pub struct ScenarioContext<'a> {
    pub platform: &'a dyn Platform,
    pub runner: &'a CommandRunner,
    pub hab: &'a HabCli,
    pub fixture_dir: &'a Path,
}

/// A named unit of verification.
#[allow(async_fn_in_trait)]
pub trait Scenario {
    fn name(&self) -> &str;

    /// Performs the scenario's actions and checks its postcondition.
    ///
    /// # Errors
    ///
    /// Returns the first failed assertion or harness problem.
    async fn run(&self, ctx: &ScenarioContext<'_>) -> Result<(), ScenarioFailure>;
}

/// An extra action run during teardown, after studio removal and before the
/// scratch directories are released.
pub trait TeardownHook {
    fn name(&self) -> &str;

    /// # Errors
    ///
    /// Errors are reported as teardown warnings.
    fn run(&mut self, report: &SuiteReport) -> HarnessResult<()>;
}

/// Outcome of one setup step.
#[derive(Debug)]
pub struct StepOutcome {
    pub name: &'static str,
    pub result: Result<CommandResult, String>,
}

impl StepOutcome {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        matches!(&self.result, Ok(r) if r.success())
    }
}

/// Outcome of one scenario.
#[derive(Debug)]
pub struct ScenarioOutcome {
    pub name: String,
    pub result: Result<(), ScenarioFailure>,
    pub duration: Duration,
}

impl ScenarioOutcome {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.result.is_ok()
    }
}

/// Everything a run produced.
#[derive(Debug, Default)]
pub struct SuiteReport {
    /// Expected-clear variables that were set when the run started.
    pub preexisting_env: Vec<String>,
    pub setup: Vec<StepOutcome>,
    pub scenarios: Vec<ScenarioOutcome>,
    pub teardown_warnings: Vec<String>,
    /// Scratch directories kept by the retention policy.
    pub retained: Vec<PathBuf>,
}

impl SuiteReport {
    /// Aggregate verdict: every scenario passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.scenarios.iter().all(ScenarioOutcome::passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ScenarioOutcome> {
        self.scenarios.iter().filter(|s| !s.passed())
    }

    fn teardown_warning(&mut self, message: String) {
        warn!(warning = %message, "Teardown problem");
        self.teardown_warnings.push(message);
    }
}

/// Run-wide knobs that are not part of the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteOptions {
    pub fixture_dir: PathBuf,
    pub command_timeout: Option<Duration>,
    pub retention: Retention,
}

impl From<&HarnessSettings> for SuiteOptions {
    fn from(settings: &HarnessSettings) -> Self {
        Self {
            fixture_dir: settings.fixture_dir.clone(),
            command_timeout: settings.command_timeout,
            retention: settings.retention,
        }
    }
}

/// One run of the harness.
pub struct Suite<S> {
    platform: Box<dyn Platform>,
    scenarios: Vec<S>,
    options: SuiteOptions,
    teardown_hooks: Vec<Box<dyn TeardownHook>>,
}

impl<S: Scenario> Suite<S> {
    #[must_use]
    pub fn new(platform: Box<dyn Platform>, scenarios: Vec<S>, options: SuiteOptions) -> Self {
        Self {
            platform,
            scenarios,
            options,
            teardown_hooks: Vec::new(),
        }
    }

    /// Registers a teardown hook. Hooks run in registration order.
    #[must_use]
    pub fn with_teardown_hook(mut self, hook: Box<dyn TeardownHook>) -> Self {
        self.teardown_hooks.push(hook);
        self
    }

    /// Runs setup, every scenario, then teardown, consuming the suite.
    pub async fn run(self) -> SuiteReport {
        let Self {
            platform,
            scenarios,
            options,
            mut teardown_hooks,
        } = self;

        let runner = CommandRunner::new(
            RunnerConfig::for_platform(platform.as_ref()).with_timeout(options.command_timeout),
        );
        let hab = HabCli::for_platform(platform.as_ref());

        let mut report = SuiteReport {
            preexisting_env: preexisting_env(platform.expected_clear_env_vars()),
            ..SuiteReport::default()
        };

        report.setup = setup(platform.as_ref(), &runner, &hab).await;

        let ctx = ScenarioContext {
            platform: platform.as_ref(),
            runner: &runner,
            hab: &hab,
            fixture_dir: &options.fixture_dir,
        };
        for scenario in &scenarios {
            report.scenarios.push(run_scenario(scenario, &ctx).await);
        }

        teardown(
            platform,
            &runner,
            &hab,
            &mut teardown_hooks,
            options.retention,
            &mut report,
        )
        .await;
        report
    }
}

/// Returns the names in `vars` that are set in this process's environment.
#[must_use]
pub fn preexisting_env(vars: &[&str]) -> Vec<String> {
    let set: Vec<String> = vars
        .iter()
        .filter(|name| std::env::var_os(name).is_some())
        .map(|name| (*name).to_string())
        .collect();
    for name in &set {
        warn!(variable = %name, "Variable expected to be unset is set");
    }
    set
}

async fn setup(platform: &dyn Platform, runner: &CommandRunner, hab: &HabCli) -> Vec<StepOutcome> {
    let ids = platform.identities();
    let steps: [(&'static str, Invocation); 5] = [
        ("origin key generate", hab.origin_key_generate(ids.origin())),
        ("user key generate", hab.user_key_generate(ids.user())),
        ("ring key generate", hab.ring_key_generate(ids.ring())),
        ("studio remove", hab.studio_remove(ids.origin())),
        ("studio new", hab.studio_new(ids.origin())),
    ];

    let mut outcomes = Vec::with_capacity(steps.len());
    for (name, invocation) in steps {
        info!(step = name, "Setup step");
        let result = runner.run(&invocation).await.map_err(|e| e.to_string());
        match &result {
            Ok(r) if r.success() => {}
            // A missing studio makes `studio rm` exit non-zero.
            Ok(r) if name == "studio remove" => {
                debug!(exit_code = r.exit_code(), "No studio to remove");
            }
            Ok(r) => warn!(step = name, exit_code = r.exit_code(), "Setup step failed"),
            Err(e) => warn!(step = name, error = %e, "Setup step could not run"),
        }
        outcomes.push(StepOutcome { name, result });
    }
    outcomes
}

async fn run_scenario<S: Scenario>(scenario: &S, ctx: &ScenarioContext<'_>) -> ScenarioOutcome {
    let name = scenario.name().to_string();
    info!(scenario = %name, "Running scenario");
    let started = Instant::now();
    let result = match AssertUnwindSafe(scenario.run(ctx)).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(ScenarioFailure::Panicked(panic_message(payload.as_ref()))),
    };
    let duration = started.elapsed();

    match &result {
        Ok(()) => info!(scenario = %name, duration_ms = %duration.as_millis(), "Scenario passed"),
        Err(failure) => warn!(scenario = %name, failure = %failure, "Scenario failed"),
    }
    ScenarioOutcome {
        name,
        result,
        duration,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

async fn teardown(
    platform: Box<dyn Platform>,
    runner: &CommandRunner,
    hab: &HabCli,
    hooks: &mut [Box<dyn TeardownHook>],
    retention: Retention,
    report: &mut SuiteReport,
) {
    let retain = retention.retain(!report.passed());

    if !retain {
        match runner.run(&hab.studio_remove(platform.identities().origin())).await {
            Ok(result) if result.success() => {}
            Ok(result) => report.teardown_warning(format!(
                "studio removal exited with code {}",
                result.exit_code()
            )),
            Err(e) => report.teardown_warning(format!("studio removal could not run: {e}")),
        }
    }

    for hook in hooks.iter_mut() {
        if let Err(e) = hook.run(report) {
            report.teardown_warning(format!("teardown hook '{}' failed: {e}", hook.name()));
        }
    }

    match platform.into_scratch().release(retain) {
        Ok(kept) => {
            for path in &kept {
                info!(path = %path.display(), "Kept scratch directory");
            }
            report.retained = kept;
        }
        Err(e) => report.teardown_warning(e.to_string()),
    }
}
