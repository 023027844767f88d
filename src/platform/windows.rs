use std::path::Path;

use super::{Platform, ScratchDirs};
use crate::config::HarnessSettings;
use crate::error::{HarnessError, HarnessResult};
use crate::identity::Identities;

/// Windows has no path layout yet.
#[derive(Debug)]
enum Unimplemented {}

/// Placeholder platform for Windows hosts.
///
/// Construction always fails, so no value of this type can exist.
#[derive(Debug)]
pub struct WindowsPlatform {
    never: Unimplemented,
}

impl WindowsPlatform {
    /// # Errors
    ///
    /// Always returns [`HarnessError::UnsupportedPlatform`].
    pub fn new(_settings: &HarnessSettings) -> HarnessResult<Self> {
        Err(HarnessError::unsupported_platform("windows"))
    }
}

impl Platform for WindowsPlatform {
    fn hab_bin(&self) -> &Path {
        match self.never {}
    }

    fn sup_bin(&self) -> &Path {
        match self.never {}
    }

    fn pkg_root(&self) -> &Path {
        match self.never {}
    }

    fn key_cache(&self) -> &Path {
        match self.never {}
    }

    fn studio_root(&self) -> &Path {
        match self.never {}
    }

    fn log_dir(&self) -> &Path {
        match self.never {}
    }

    fn log_file_name(&self) -> &str {
        match self.never {}
    }

    fn identities(&self) -> &Identities {
        match self.never {}
    }

    fn into_scratch(self: Box<Self>) -> ScratchDirs {
        match self.never {}
    }
}
