//! The built-in scenarios.
//!
//! Each scenario asserts one postcondition against the shared platform. None
//! depends on another scenario's outcome, only on setup having run.

use std::path::Path;
use std::time::Instant;
use tracing::info;

use super::fixture::copy_tree;
use super::{Scenario, ScenarioContext, ScenarioFailure};
use crate::hab::PackageIdent;

/// The package the install scenario installs.
pub const INSTALL_NAMESPACE: &str = "core";
pub const INSTALL_NAME: &str = "bc";

/// Scenarios the harness ships with, in declared run order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuiltinScenario {
    /// Both binaries exist and are executable.
    BinaryPresence,
    /// `hab pkg install` puts the package under the package root.
    PackageInstall(PackageIdent),
    /// `hab studio build` succeeds on a copy of the fixture plan.
    PackageBuild,
}

impl BuiltinScenario {
    /// Scenario names in declared order.
    pub const NAMES: [&'static str; 3] = ["binary-presence", "package-install", "package-build"];

    /// All scenarios in declared order.
    #[must_use]
    pub fn all() -> Vec<Self> {
        vec![
            Self::BinaryPresence,
            Self::PackageInstall(PackageIdent::new(INSTALL_NAMESPACE, INSTALL_NAME)),
            Self::PackageBuild,
        ]
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().into_iter().find(|s| s.name() == name)
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::BinaryPresence => Self::NAMES[0],
            Self::PackageInstall(_) => Self::NAMES[1],
            Self::PackageBuild => Self::NAMES[2],
        }
    }
}

impl Scenario for BuiltinScenario {
    fn name(&self) -> &str {
        BuiltinScenario::name(self)
    }

    async fn run(&self, ctx: &ScenarioContext<'_>) -> Result<(), ScenarioFailure> {
        match self {
            Self::BinaryPresence => check_binaries(ctx),
            Self::PackageInstall(ident) => install_package(ctx, ident).await,
            Self::PackageBuild => build_package(ctx).await,
        }
    }
}

fn check_binaries(ctx: &ScenarioContext<'_>) -> Result<(), ScenarioFailure> {
    assert_executable(ctx.platform.hab_bin())?;
    assert_executable(ctx.platform.sup_bin())
}

/// Fails unless `path` is a regular file with an execute bit set.
pub fn assert_executable(path: &Path) -> Result<(), ScenarioFailure> {
    let metadata = std::fs::metadata(path).map_err(|e| {
        ScenarioFailure::assertion(
            "binary exists",
            format!("'{}' to exist", path.display()),
            e.to_string(),
        )
    })?;
    if !metadata.is_file() {
        return Err(ScenarioFailure::assertion(
            "binary is a file",
            format!("'{}' to be a regular file", path.display()),
            "not a regular file",
        ));
    }
    if !is_executable(&metadata) {
        return Err(ScenarioFailure::assertion(
            "binary is executable",
            format!("'{}' to be executable", path.display()),
            "no execute permission",
        ));
    }
    Ok(())
}

#[cfg(unix)]
fn is_executable(metadata: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &std::fs::Metadata) -> bool {
    true
}

async fn install_package(
    ctx: &ScenarioContext<'_>,
    ident: &PackageIdent,
) -> Result<(), ScenarioFailure> {
    let path = ident.install_path(ctx.platform.pkg_root());
    if path.exists() {
        return Err(ScenarioFailure::assertion(
            "install path absent before install",
            format!("'{}' to not exist", path.display()),
            "it exists",
        ));
    }

    let result = ctx.runner.run(&ctx.hab.pkg_install(ident)).await?;
    if !result.success() {
        return Err(ScenarioFailure::assertion(
            "hab pkg install exit code",
            "0",
            result.exit_code().to_string(),
        ));
    }

    if !path.exists() {
        return Err(ScenarioFailure::assertion(
            "install path present after install",
            format!("'{}' to exist", path.display()),
            "it does not",
        ));
    }
    Ok(())
}

async fn build_package(ctx: &ScenarioContext<'_>) -> Result<(), ScenarioFailure> {
    let workspace = tempfile::Builder::new()
        .prefix("hab-test-build-")
        .tempdir()
        .map_err(|e| ScenarioFailure::Fixture(format!("cannot create build directory: {e}")))?;
    let plan_dir = workspace.path().join("plan");
    copy_tree(ctx.fixture_dir, &plan_dir)?;

    let started = Instant::now();
    let origin = ctx.platform.identities().origin();
    let result = ctx.runner.run(&ctx.hab.studio_build(origin, &plan_dir)).await?;
    info!(
        elapsed_secs = started.elapsed().as_secs(),
        exit_code = result.exit_code(),
        "Studio build finished"
    );

    if !result.success() {
        return Err(ScenarioFailure::assertion(
            "hab studio build exit code",
            "0",
            result.exit_code().to_string(),
        ));
    }
    Ok(())
}
