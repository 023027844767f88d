//! Harness settings.
//!
//! Settings come from an optional TOML file and are then overridden by
//! command-line flags. Every field has a default, so an empty file is valid.
//!
//! # Example
//!
//! ```toml
//! hab_bin = "/usr/local/bin/hab"
//! sup_bin = "/usr/local/bin/hab-sup"
//! pkg_root = "/hab/pkgs"
//! command_timeout = "45m"
//! retention = "on-failure"
//! install_package = "core/bc"
//! scenarios = ["binary-presence", "package-install"]
//! ```

use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{HarnessError, HarnessResult};
use crate::hab::PackageIdent;
use crate::suite::scenarios::{BuiltinScenario, INSTALL_NAME, INSTALL_NAMESPACE};

/// Default location of the `hab` CLI.
pub const DEFAULT_HAB_BIN: &str = "/bin/hab";
/// Default location of the supervisor daemon.
pub const DEFAULT_SUP_BIN: &str = "/bin/hab-sup";
/// Default package install root.
pub const DEFAULT_PKG_ROOT: &str = "/hab/pkgs";
/// Default fixture plan used by the build scenario.
pub const DEFAULT_FIXTURE_DIR: &str = "fixtures/simple_plan";

/// Whether scratch directories survive teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Retention {
    /// Keep the key cache and studio root after every run.
    Always,
    /// Keep them only when a scenario failed.
    #[default]
    OnFailure,
    /// Always remove them.
    Never,
}

impl Retention {
    /// Returns `true` if scratch directories should be kept.
    #[must_use]
    pub fn retain(self, run_failed: bool) -> bool {
        match self {
            Self::Always => true,
            Self::OnFailure => run_failed,
            Self::Never => false,
        }
    }
}

/// Everything the harness needs to know before building a platform.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessSettings {
    /// Path to the `hab` CLI.
    pub hab_bin: PathBuf,
    /// Path to the supervisor daemon.
    pub sup_bin: PathBuf,
    /// Pre-existing package install root. Not owned by the run.
    pub pkg_root: PathBuf,
    /// Directory for the run log. `None` means the current directory.
    pub log_dir: Option<PathBuf>,
    /// Plan tree copied into a scratch directory by the build scenario.
    pub fixture_dir: PathBuf,
    /// Upper bound for any single command. `None` waits forever.
    #[serde(deserialize_with = "deserialize_timeout")]
    pub command_timeout: Option<Duration>,
    /// Scratch directory retention policy.
    pub retention: Retention,
    /// Scenario names to run. `None` runs all of them.
    pub scenarios: Option<Vec<String>>,
    /// Package the install scenario installs, as `<namespace>/<name>`.
    #[serde(deserialize_with = "deserialize_ident")]
    pub install_package: PackageIdent,
}

impl Default for HarnessSettings {
    fn default() -> Self {
        Self {
            hab_bin: PathBuf::from(DEFAULT_HAB_BIN),
            sup_bin: PathBuf::from(DEFAULT_SUP_BIN),
            pkg_root: PathBuf::from(DEFAULT_PKG_ROOT),
            log_dir: None,
            fixture_dir: PathBuf::from(DEFAULT_FIXTURE_DIR),
            command_timeout: None,
            retention: Retention::default(),
            scenarios: None,
            install_package: PackageIdent::new(INSTALL_NAMESPACE, INSTALL_NAME),
        }
    }
}

impl HarnessSettings {
    /// Parses settings from TOML text and validates them.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML, contains unknown keys,
    /// or fails [`validate`](Self::validate).
    pub fn from_toml_str(text: &str) -> HarnessResult<Self> {
        let settings: Self = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reads and parses a settings file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> HarnessResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            HarnessError::config(format!("cannot read '{}': {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks the settings for values that would make a run meaningless.
    ///
    /// # Errors
    ///
    /// Returns an error for a zero timeout, an unknown scenario name, or an
    /// empty scenario selection.
    pub fn validate(&self) -> HarnessResult<()> {
        if self.command_timeout == Some(Duration::ZERO) {
            return Err(HarnessError::config("command_timeout must be non-zero"));
        }
        if let Some(names) = &self.scenarios {
            if names.is_empty() {
                return Err(HarnessError::config("scenarios must not be empty"));
            }
            for name in names {
                if BuiltinScenario::from_name(name).is_none() {
                    return Err(HarnessError::config(format!(
                        "unknown scenario '{name}' (expected one of: {})",
                        BuiltinScenario::NAMES.join(", ")
                    )));
                }
            }
        }
        Ok(())
    }

    /// Resolves the selected scenarios, preserving declared order.
    ///
    /// The install scenario targets [`install_package`](Self::install_package).
    #[must_use]
    pub fn selected_scenarios(&self) -> Vec<BuiltinScenario> {
        BuiltinScenario::all()
            .into_iter()
            .filter(|s| match &self.scenarios {
                None => true,
                Some(names) => names.iter().any(|n| n == s.name()),
            })
            .map(|s| match s {
                BuiltinScenario::PackageInstall(_) => {
                    BuiltinScenario::PackageInstall(self.install_package.clone())
                }
                other => other,
            })
            .collect()
    }
}

fn deserialize_timeout<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.map(|text| humantime::parse_duration(&text).map_err(serde::de::Error::custom))
        .transpose()
}

fn deserialize_ident<'de, D>(deserializer: D) -> Result<PackageIdent, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}
