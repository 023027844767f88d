use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::info;

use super::{log_file_name_at, Platform, ScratchDirs};
use crate::config::HarnessSettings;
use crate::error::HarnessResult;
use crate::identity::Identities;

/// Platform for Linux hosts.
#[derive(Debug)]
pub struct LinuxPlatform {
    hab_bin: PathBuf,
    sup_bin: PathBuf,
    pkg_root: PathBuf,
    log_dir: PathBuf,
    log_file_name: String,
    identities: Identities,
    scratch: ScratchDirs,
}

impl LinuxPlatform {
    /// Derives every value of the run and creates the scratch directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the scratch directories cannot be created or the
    /// current directory cannot be resolved for the default log location.
    pub fn new(settings: &HarnessSettings) -> HarnessResult<Self> {
        let log_dir = match &settings.log_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        };
        let platform = Self {
            hab_bin: settings.hab_bin.clone(),
            sup_bin: settings.sup_bin.clone(),
            pkg_root: settings.pkg_root.clone(),
            log_dir,
            log_file_name: log_file_name_at(SystemTime::now()),
            identities: Identities::generate(),
            scratch: ScratchDirs::create()?,
        };
        info!(
            origin = %platform.identities.origin(),
            log_file = %platform.log_file_path().display(),
            "Platform ready"
        );
        Ok(platform)
    }
}

impl Platform for LinuxPlatform {
    fn hab_bin(&self) -> &Path {
        &self.hab_bin
    }

    fn sup_bin(&self) -> &Path {
        &self.sup_bin
    }

    fn pkg_root(&self) -> &Path {
        &self.pkg_root
    }

    fn key_cache(&self) -> &Path {
        self.scratch.key_cache()
    }

    fn studio_root(&self) -> &Path {
        self.scratch.studio_root()
    }

    fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    fn log_file_name(&self) -> &str {
        &self.log_file_name
    }

    fn identities(&self) -> &Identities {
        &self.identities
    }

    fn into_scratch(self: Box<Self>) -> ScratchDirs {
        self.scratch
    }
}
