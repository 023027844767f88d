//! hab-test - end-to-end harness for the `hab` package-management CLI

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use hab_test::config::{HarnessSettings, Retention};
use hab_test::hab::PackageIdent;
use hab_test::suite::{Suite, SuiteOptions, SuiteReport};
use hab_test::{logging, platform, Platform};

#[derive(Parser, Debug)]
#[command(name = "hab-test")]
#[command(about = "End-to-end harness for the hab package-management CLI")]
#[command(version)]
struct Args {
    /// TOML settings file. Flags override its values.
    #[arg(short, long, env = "HAB_TEST_CONFIG")]
    config: Option<PathBuf>,

    /// Path to the hab CLI
    #[arg(long, env = "HAB_TEST_HAB_BIN")]
    hab_bin: Option<PathBuf>,

    /// Path to the supervisor daemon
    #[arg(long, env = "HAB_TEST_SUP_BIN")]
    sup_bin: Option<PathBuf>,

    /// Package install root
    #[arg(long, env = "HAB_TEST_PKG_ROOT")]
    pkg_root: Option<PathBuf>,

    /// Directory for the run log (defaults to the current directory)
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Plan tree copied for the build scenario
    #[arg(long)]
    fixture_dir: Option<PathBuf>,

    /// Per-command timeout, e.g. "30m". Unbounded when not set.
    #[arg(long, value_parser = humantime::parse_duration)]
    timeout: Option<Duration>,

    /// Whether the key cache and studio root survive the run
    #[arg(long, value_enum)]
    retention: Option<Retention>,

    /// Package for the install scenario, as <namespace>/<name>
    #[arg(long, value_name = "IDENT")]
    install_package: Option<PackageIdent>,

    /// Run only these scenarios (repeatable)
    #[arg(long = "scenario", value_name = "NAME")]
    scenarios: Vec<String>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

impl Args {
    fn into_settings(self) -> Result<HarnessSettings> {
        let mut settings = match &self.config {
            Some(path) => HarnessSettings::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => HarnessSettings::default(),
        };

        if let Some(hab_bin) = self.hab_bin {
            settings.hab_bin = hab_bin;
        }
        if let Some(sup_bin) = self.sup_bin {
            settings.sup_bin = sup_bin;
        }
        if let Some(pkg_root) = self.pkg_root {
            settings.pkg_root = pkg_root;
        }
        if self.log_dir.is_some() {
            settings.log_dir = self.log_dir;
        }
        if let Some(fixture_dir) = self.fixture_dir {
            settings.fixture_dir = fixture_dir;
        }
        if self.timeout.is_some() {
            settings.command_timeout = self.timeout;
        }
        if let Some(retention) = self.retention {
            settings.retention = retention;
        }
        if let Some(ident) = self.install_package {
            settings.install_package = ident;
        }
        if !self.scenarios.is_empty() {
            settings.scenarios = Some(self.scenarios);
        }

        settings.validate()?;
        Ok(settings)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(e) = logging::init(args.debug) {
        eprintln!("warning: logging unavailable: {e}");
    }

    match run(args).await {
        Ok(report) => {
            print_summary(&report);
            if report.passed() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            }
        }
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

async fn run(args: Args) -> Result<SuiteReport> {
    let settings = args.into_settings()?;
    let platform = platform::for_host(&settings).context("building platform")?;
    let log_file = platform.log_file_path();
    println!("Run log: {}", log_file.display());

    let suite = Suite::new(
        platform,
        settings.selected_scenarios(),
        SuiteOptions::from(&settings),
    );
    Ok(suite.run().await)
}

fn print_summary(report: &SuiteReport) {
    println!();
    for outcome in &report.scenarios {
        match &outcome.result {
            Ok(()) => println!(
                "PASS {} ({})",
                outcome.name,
                humantime::format_duration(Duration::from_secs(outcome.duration.as_secs()))
            ),
            Err(failure) => println!("FAIL {}: {failure}", outcome.name),
        }
    }
    for warning in &report.teardown_warnings {
        println!("WARN teardown: {warning}");
    }
    for path in &report.retained {
        println!("KEPT {}", path.display());
    }
    let failed = report.failures().count();
    println!(
        "{} passed, {failed} failed",
        report.scenarios.len() - failed
    );
}
