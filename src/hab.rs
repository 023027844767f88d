//! Argument lists for the `hab` subcommands the harness drives.
//!
//! The harness owns no `hab` behavior. It only knows which arguments each
//! operation takes.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::command::Invocation;
use crate::error::HarnessError;
use crate::platform::Platform;

/// A `<namespace>/<name>` package identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageIdent {
    namespace: String,
    name: String,
}

impl PackageIdent {
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Where the package lands under `pkg_root` once installed.
    #[must_use]
    pub fn install_path(&self, pkg_root: &Path) -> PathBuf {
        pkg_root.join(&self.namespace).join(&self.name)
    }
}

impl fmt::Display for PackageIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

impl FromStr for PackageIdent {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((namespace, name))
                if !namespace.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self::new(namespace, name))
            }
            _ => Err(HarnessError::config(format!(
                "invalid package ident '{s}' (expected <namespace>/<name>)"
            ))),
        }
    }
}

/// Builds `hab` invocations for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabCli {
    bin: PathBuf,
    studio_root: PathBuf,
}

impl HabCli {
    #[must_use]
    pub fn new(bin: impl Into<PathBuf>, studio_root: impl Into<PathBuf>) -> Self {
        Self {
            bin: bin.into(),
            studio_root: studio_root.into(),
        }
    }

    #[must_use]
    pub fn for_platform(platform: &dyn Platform) -> Self {
        Self::new(platform.hab_bin(), platform.studio_root())
    }

    #[must_use]
    pub fn origin_key_generate(&self, origin: &str) -> Invocation {
        self.hab().args(["origin", "key", "generate", origin])
    }

    #[must_use]
    pub fn user_key_generate(&self, user: &str) -> Invocation {
        self.hab().args(["user", "key", "generate", user])
    }

    #[must_use]
    pub fn ring_key_generate(&self, ring: &str) -> Invocation {
        self.hab().args(["ring", "key", "generate", ring])
    }

    #[must_use]
    pub fn studio_remove(&self, origin: &str) -> Invocation {
        self.studio(origin).arg("rm")
    }

    #[must_use]
    pub fn studio_new(&self, origin: &str) -> Invocation {
        self.studio(origin).arg("new")
    }

    #[must_use]
    pub fn pkg_install(&self, ident: &PackageIdent) -> Invocation {
        self.hab().args(["pkg", "install"]).arg(ident.to_string())
    }

    #[must_use]
    pub fn studio_build(&self, origin: &str, plan_dir: &Path) -> Invocation {
        self.studio(origin).arg("build").arg(plan_dir)
    }

    fn hab(&self) -> Invocation {
        Invocation::new(&self.bin)
    }

    fn studio(&self, origin: &str) -> Invocation {
        self.hab()
            .arg("studio")
            .arg("-r")
            .arg(&self.studio_root)
            .args(["-o", origin])
    }
}
