//! Tests for the built-in scenarios with fake `hab` binaries.

use pretty_assertions::assert_eq;
use serial_test::serial;
use std::path::Path;

use hab_test::command::{CommandRunner, RunnerConfig};
use hab_test::config::HarnessSettings;
use hab_test::hab::{HabCli, PackageIdent};
use hab_test::platform::LinuxPlatform;
use hab_test::suite::scenarios::BuiltinScenario;
use hab_test::suite::{Scenario, ScenarioContext, ScenarioFailure};

use crate::common::TestWorkspace;

/// Runs one scenario against a fresh platform built from `settings`.
async fn run(settings: &HarnessSettings, scenario: BuiltinScenario) -> Result<(), ScenarioFailure> {
    let platform = LinuxPlatform::new(settings).unwrap();
    let runner = CommandRunner::new(RunnerConfig::for_platform(&platform));
    let hab = HabCli::for_platform(&platform);
    let ctx = ScenarioContext {
        platform: &platform,
        runner: &runner,
        hab: &hab,
        fixture_dir: &settings.fixture_dir,
    };
    scenario.run(&ctx).await
}

fn install() -> BuiltinScenario {
    BuiltinScenario::PackageInstall(PackageIdent::new("core", "bc"))
}

// ============================================================================
// Binary presence
// ============================================================================

#[tokio::test]
#[serial]
async fn test_binary_presence_passes_for_executables() {
    let ws = TestWorkspace::new();
    let settings = ws.settings(&ws.fake_hab(""), &ws.fake_sup());

    run(&settings, BuiltinScenario::BinaryPresence).await.unwrap();
}

#[tokio::test]
#[serial]
async fn test_binary_presence_names_missing_path() {
    let ws = TestWorkspace::new();
    let missing = ws.path().join("bin/hab-sup");
    let settings = ws.settings(&ws.fake_hab(""), &missing);

    let failure = run(&settings, BuiltinScenario::BinaryPresence)
        .await
        .unwrap_err();
    assert!(matches!(failure, ScenarioFailure::Assertion { .. }));
    assert!(
        failure.to_string().contains(&missing.display().to_string()),
        "{failure}"
    );
}

#[tokio::test]
#[serial]
async fn test_binary_presence_rejects_non_executable() {
    let ws = TestWorkspace::new();
    let plain = ws.create_file("bin/hab", "not a program");
    let settings = ws.settings(&plain, &ws.fake_sup());

    let failure = run(&settings, BuiltinScenario::BinaryPresence)
        .await
        .unwrap_err();
    assert!(failure.to_string().contains("executable"), "{failure}");
}

// ============================================================================
// Package install
// ============================================================================

#[tokio::test]
#[serial]
async fn test_install_creates_package_path() {
    let ws = TestWorkspace::new();
    let settings = ws.settings(&ws.fake_hab(""), &ws.fake_sup());
    let install_path = ws.pkg_root().join("core/bc");
    assert!(!install_path.exists());

    run(&settings, install()).await.unwrap();

    assert!(install_path.is_dir());
    assert_eq!(ws.calls(), vec!["pkg install core/bc"]);
}

#[tokio::test]
#[serial]
async fn test_install_reports_non_zero_exit() {
    let ws = TestWorkspace::new();
    let hab = ws.fake_hab(r#"[ "$1" = "pkg" ] && exit 1"#);
    let settings = ws.settings(&hab, &ws.fake_sup());

    let failure = run(&settings, install()).await.unwrap_err();
    assert_eq!(
        failure,
        ScenarioFailure::assertion("hab pkg install exit code", "0", "1")
    );
    assert!(!ws.pkg_root().join("core/bc").exists());
}

#[tokio::test]
#[serial]
async fn test_install_fails_when_path_already_present() {
    let ws = TestWorkspace::new();
    std::fs::create_dir_all(ws.pkg_root().join("core/bc")).unwrap();
    let settings = ws.settings(&ws.fake_hab(""), &ws.fake_sup());

    let failure = run(&settings, install()).await.unwrap_err();
    assert!(failure.to_string().contains("to not exist"), "{failure}");
    assert!(ws.calls().is_empty(), "install must not run");
}

#[tokio::test]
#[serial]
async fn test_install_reports_missing_path_after_success() {
    let ws = TestWorkspace::new();
    let hab = ws.fake_hab(r#"[ "$1" = "pkg" ] && exit 0"#);
    let settings = ws.settings(&hab, &ws.fake_sup());

    let failure = run(&settings, install()).await.unwrap_err();
    assert!(failure.to_string().contains("install path present after install"));
}

// ============================================================================
// Package build
// ============================================================================

#[tokio::test]
#[serial]
async fn test_build_succeeds_with_fixture() {
    let ws = TestWorkspace::new();
    ws.plan_fixture();
    let settings = ws.settings(&ws.fake_hab(""), &ws.fake_sup());

    run(&settings, BuiltinScenario::PackageBuild).await.unwrap();

    let calls = ws.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].starts_with("studio -r "));
    assert!(calls[0].contains(" build "));
}

#[tokio::test]
#[serial]
async fn test_build_with_missing_fixture_fails_before_build() {
    let ws = TestWorkspace::new();
    let settings = ws.settings(&ws.fake_hab(""), &ws.fake_sup());
    assert!(!Path::new(&settings.fixture_dir).exists());

    let failure = run(&settings, BuiltinScenario::PackageBuild)
        .await
        .unwrap_err();
    assert!(matches!(failure, ScenarioFailure::Fixture(_)), "{failure:?}");
    assert!(ws.calls().is_empty(), "build must not be invoked");
}

#[tokio::test]
#[serial]
async fn test_build_command_failure_is_an_assertion() {
    let ws = TestWorkspace::new();
    ws.plan_fixture();
    let hab = ws.fake_hab(r#"[ "$6" = "build" ] && exit 2"#);
    let settings = ws.settings(&hab, &ws.fake_sup());

    let failure = run(&settings, BuiltinScenario::PackageBuild)
        .await
        .unwrap_err();
    assert_eq!(
        failure,
        ScenarioFailure::assertion("hab studio build exit code", "0", "2")
    );
}

#[tokio::test]
#[serial]
async fn test_missing_hab_is_harness_failure() {
    let ws = TestWorkspace::new();
    ws.plan_fixture();
    let settings = ws.settings(&ws.path().join("bin/hab"), &ws.fake_sup());

    let failure = run(&settings, BuiltinScenario::PackageBuild)
        .await
        .unwrap_err();
    assert!(matches!(failure, ScenarioFailure::Harness(_)), "{failure:?}");
}
