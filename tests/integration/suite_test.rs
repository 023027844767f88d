//! End-to-end lifecycle tests: setup, scenarios, teardown.

use pretty_assertions::assert_eq;
use serial_test::serial;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use hab_test::config::{HarnessSettings, Retention};
use hab_test::error::HarnessResult;
use hab_test::platform::{LinuxPlatform, Platform};
use hab_test::suite::scenarios::BuiltinScenario;
use hab_test::suite::{
    Scenario, ScenarioContext, ScenarioFailure, Suite, SuiteOptions, SuiteReport, TeardownHook,
};

use crate::common::TestWorkspace;

/// Counts how often teardown reached it.
struct CountingHook {
    runs: Arc<AtomicUsize>,
}

impl TeardownHook for CountingHook {
    fn name(&self) -> &str {
        "counter"
    }

    fn run(&mut self, _report: &SuiteReport) -> HarnessResult<()> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Scenarios with a fixed verdict.
enum Injected {
    Fail,
    Pass,
    Panic,
}

impl Scenario for Injected {
    fn name(&self) -> &str {
        match self {
            Self::Fail => "injected-failure",
            Self::Pass => "injected-pass",
            Self::Panic => "injected-panic",
        }
    }

    async fn run(&self, _ctx: &ScenarioContext<'_>) -> Result<(), ScenarioFailure> {
        match self {
            Self::Fail => Err(ScenarioFailure::assertion("injected", "pass", "fail")),
            Self::Pass => Ok(()),
            Self::Panic => panic!("scenario blew up"),
        }
    }
}

fn platform(settings: &HarnessSettings) -> Box<dyn Platform> {
    Box::new(LinuxPlatform::new(settings).unwrap())
}

#[tokio::test]
#[serial]
async fn test_full_run_passes_with_working_cli() {
    let ws = TestWorkspace::new();
    ws.plan_fixture();
    let settings = ws.settings(&ws.fake_hab(""), &ws.fake_sup());
    let platform = platform(&settings);
    let origin = platform.identities().origin().to_string();
    let user = platform.identities().user().to_string();
    let ring = platform.identities().ring().to_string();
    let key_cache = platform.key_cache().to_path_buf();
    let log_file = platform.log_file_path();

    let report = Suite::new(platform, BuiltinScenario::all(), SuiteOptions::from(&settings))
        .run()
        .await;

    assert!(report.passed(), "{:?}", report.scenarios);
    assert_eq!(report.setup.len(), 5);
    assert!(report.setup.iter().all(|s| s.succeeded()));
    let names: Vec<&str> = report.scenarios.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, BuiltinScenario::NAMES.to_vec());

    let calls = ws.calls();
    assert_eq!(calls[0], format!("origin key generate {origin}"));
    assert_eq!(calls[1], format!("user key generate {user}"));
    assert_eq!(calls[2], format!("ring key generate {ring}"));
    assert!(calls[3].ends_with(&format!("-o {origin} rm")));
    assert!(calls[4].ends_with(&format!("-o {origin} new")));
    assert_eq!(calls[5], "pkg install core/bc");
    assert!(calls[6].contains(&format!("-o {origin} build ")));
    // teardown removes the studio again
    assert!(calls[7].ends_with(&format!("-o {origin} rm")));
    assert_eq!(calls.len(), 8);

    assert!(report.retained.is_empty());
    assert!(!key_cache.exists());
    assert!(log_file.is_file());
}

#[tokio::test]
#[serial]
async fn test_teardown_runs_once_after_failed_scenario() {
    let ws = TestWorkspace::new();
    let settings = ws.settings(&ws.fake_hab(""), &ws.fake_sup());
    let runs = Arc::new(AtomicUsize::new(0));

    let report = Suite::new(
        platform(&settings),
        vec![Injected::Fail, Injected::Pass],
        SuiteOptions::from(&settings),
    )
    .with_teardown_hook(Box::new(CountingHook { runs: runs.clone() }))
    .run()
    .await;

    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert!(!report.passed());
    assert_eq!(report.scenarios.len(), 2, "later scenarios still run");
    assert!(report.scenarios[1].passed());
    assert_eq!(report.failures().count(), 1);
}

#[tokio::test]
#[serial]
async fn test_panicking_scenario_still_reaches_teardown() {
    let ws = TestWorkspace::new();
    let settings = ws.settings(&ws.fake_hab(""), &ws.fake_sup());
    let platform = platform(&settings);
    let key_cache = platform.key_cache().to_path_buf();
    let runs = Arc::new(AtomicUsize::new(0));

    let report = Suite::new(
        platform,
        vec![Injected::Panic, Injected::Pass],
        SuiteOptions::from(&settings),
    )
    .with_teardown_hook(Box::new(CountingHook { runs: runs.clone() }))
    .run()
    .await;

    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert!(!report.passed());
    assert_eq!(
        report.scenarios[0].result,
        Err(ScenarioFailure::Panicked("scenario blew up".to_string()))
    );
    assert!(report.scenarios[1].passed());
    // teardown removed the studio and the scratch dirs
    assert!(ws.calls().last().unwrap().ends_with(" rm"));
    assert!(!key_cache.exists());
}

#[tokio::test]
#[serial]
async fn test_setup_failures_do_not_abort() {
    let ws = TestWorkspace::new();
    let hab = ws.fake_hab(r#"[ "$2" = "key" ] && exit 1; [ "$6" = "rm" ] && exit 1"#);
    let settings = ws.settings(&hab, &ws.fake_sup());

    let report = Suite::new(
        platform(&settings),
        vec![Injected::Pass],
        SuiteOptions::from(&settings),
    )
    .run()
    .await;

    let failed: Vec<&str> = report
        .setup
        .iter()
        .filter(|s| !s.succeeded())
        .map(|s| s.name)
        .collect();
    assert_eq!(
        failed,
        vec![
            "origin key generate",
            "user key generate",
            "ring key generate",
            "studio remove"
        ]
    );
    assert!(report.passed());
    // teardown's studio removal exited non-zero as well
    assert_eq!(report.teardown_warnings.len(), 1);
    assert!(report.teardown_warnings[0].contains("exited with code 1"));
}

#[tokio::test]
#[serial]
async fn test_missing_cli_surfaces_in_scenarios() {
    let ws = TestWorkspace::new();
    let missing = ws.path().join("bin/hab");
    let settings = ws.settings(&missing, &ws.fake_sup());

    let report = Suite::new(
        platform(&settings),
        vec![BuiltinScenario::BinaryPresence],
        SuiteOptions::from(&settings),
    )
    .run()
    .await;

    assert!(report.setup.iter().all(|s| s.result.is_err()));
    assert!(!report.passed());
    let failure = report.scenarios[0].result.as_ref().unwrap_err();
    assert!(failure.to_string().contains(&missing.display().to_string()));
}

#[tokio::test]
#[serial]
async fn test_failed_run_retains_scratch_dirs_on_failure() {
    let ws = TestWorkspace::new();
    let settings = HarnessSettings {
        retention: Retention::OnFailure,
        ..ws.settings(&ws.fake_hab(""), &ws.fake_sup())
    };
    let platform = platform(&settings);
    let key_cache = platform.key_cache().to_path_buf();
    let studio_root = platform.studio_root().to_path_buf();

    let report = Suite::new(platform, vec![Injected::Fail], SuiteOptions::from(&settings))
        .run()
        .await;

    assert_eq!(report.retained, vec![key_cache.clone(), studio_root.clone()]);
    assert!(key_cache.is_dir());
    assert!(studio_root.is_dir());
    // a retained studio is not removed
    let calls = ws.calls();
    assert_eq!(calls.len(), 5);
    assert!(calls[4].ends_with(" new"));
    std::fs::remove_dir_all(key_cache).unwrap();
    std::fs::remove_dir_all(studio_root).unwrap();
}
