//! Platform abstraction.
//!
//! A platform is the immutable test context of one run: where the binaries
//! live, which names the run operates under, which scratch directories it
//! owns, and where the run log goes. Everything is derived once at
//! construction and only read afterwards.
//!
//! # Examples
//!
//! ```no_run
//! use hab_test::config::HarnessSettings;
//! use hab_test::platform::{self, Platform};
//!
//! # fn example() -> hab_test::error::HarnessResult<()> {
//! let platform = platform::for_host(&HarnessSettings::default())?;
//! println!("logging to {}", platform.log_file_path().display());
//! # Ok(())
//! # }
//! ```

mod linux;
mod scratch;
mod windows;

pub use linux::LinuxPlatform;
pub use scratch::ScratchDirs;
pub use windows::WindowsPlatform;

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::config::HarnessSettings;
use crate::error::HarnessResult;
use crate::identity::Identities;

/// Environment variable the `hab` CLI reads to locate key material.
pub const KEY_CACHE_ENV_VAR: &str = "HAB_CACHE_KEY_PATH";

/// Variables expected to be unset before a run. Checked and reported, never
/// enforced.
pub const EXPECTED_CLEAR_ENV_VARS: &[&str] = &[
    "HAB_ORG",
    "HAB_ORIGIN",
    "HAB_DEPOT_URL",
    "HAB_ORIGIN_KEYS",
    "HAB_RING",
    "HAB_RING_KEY",
    "HAB_STUDIOS_HOME",
    "HAB_STUDIO_ROOT",
    "HAB_USER",
    "HAB_AUTH_TOKEN",
];

/// Capability set every platform provides.
pub trait Platform: fmt::Debug + Send + Sync {
    /// Path to the `hab` CLI.
    fn hab_bin(&self) -> &Path;

    /// Path to the supervisor daemon.
    fn sup_bin(&self) -> &Path;

    /// Pre-existing package install root.
    fn pkg_root(&self) -> &Path;

    /// Scratch directory handed to every command as its key cache.
    fn key_cache(&self) -> &Path;

    /// Scratch directory used as the studio root.
    fn studio_root(&self) -> &Path;

    /// Directory holding the run log.
    fn log_dir(&self) -> &Path;

    /// File name of the run log, fixed at construction.
    fn log_file_name(&self) -> &str;

    /// Names this run operates under.
    fn identities(&self) -> &Identities;

    /// Full path of the run log.
    fn log_file_path(&self) -> PathBuf {
        self.log_dir().join(self.log_file_name())
    }

    /// Variables the run expects to be unset.
    fn expected_clear_env_vars(&self) -> &'static [&'static str] {
        EXPECTED_CLEAR_ENV_VARS
    }

    /// Gives up the platform and returns ownership of its scratch directories.
    fn into_scratch(self: Box<Self>) -> ScratchDirs;
}

/// Builds the platform for the operating system this binary was compiled for.
///
/// # Errors
///
/// Returns an error if the host has no implementation or if scratch
/// directories cannot be created.
pub fn for_host(settings: &HarnessSettings) -> HarnessResult<Box<dyn Platform>> {
    if cfg!(windows) {
        Ok(Box::new(WindowsPlatform::new(settings)?))
    } else {
        Ok(Box::new(LinuxPlatform::new(settings)?))
    }
}

/// Returns `hab_test-<UTC timestamp>.log` with colons replaced by dashes.
#[must_use]
pub fn log_file_name_at(time: SystemTime) -> String {
    let stamp = humantime::format_rfc3339_seconds(time)
        .to_string()
        .replace(':', "-");
    format!("hab_test-{stamp}.log")
}
