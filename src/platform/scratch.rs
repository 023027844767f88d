//! Scratch directories owned by a run.

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

use crate::error::{HarnessError, HarnessResult};

/// The key cache and studio root of one run.
///
/// Dropping this value removes both directories silently. Use
/// [`release`](Self::release) to choose between keeping them and removing
/// them with errors reported.
#[derive(Debug)]
pub struct ScratchDirs {
    key_cache: TempDir,
    studio_root: TempDir,
}

impl ScratchDirs {
    /// Creates both directories under the system temp directory.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::ScratchDir`] if either directory cannot be created.
    pub fn create() -> HarnessResult<Self> {
        let key_cache = make_dir("hab-test-keys-", "key cache")?;
        let studio_root = make_dir("hab-test-studio-", "studio root")?;
        debug!(
            key_cache = %key_cache.path().display(),
            studio_root = %studio_root.path().display(),
            "Created scratch directories"
        );
        Ok(Self {
            key_cache,
            studio_root,
        })
    }

    pub fn key_cache(&self) -> &Path {
        self.key_cache.path()
    }

    pub fn studio_root(&self) -> &Path {
        self.studio_root.path()
    }

    /// Keeps or removes both directories.
    ///
    /// Returns the kept paths when `retain` is set, or an empty list after a
    /// successful removal. Removal of the second directory is attempted even
    /// when the first fails; the first error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::ScratchDir`] if a directory could not be removed.
    pub fn release(self, retain: bool) -> HarnessResult<Vec<PathBuf>> {
        if retain {
            return Ok(vec![self.key_cache.keep(), self.studio_root.keep()]);
        }

        let key_cache = self.key_cache.close().map_err(|source| HarnessError::ScratchDir {
            action: "remove",
            what: "key cache",
            source,
        });
        let studio_root = self
            .studio_root
            .close()
            .map_err(|source| HarnessError::ScratchDir {
                action: "remove",
                what: "studio root",
                source,
            });
        key_cache.and(studio_root)?;
        Ok(Vec::new())
    }
}

fn make_dir(prefix: &str, what: &'static str) -> HarnessResult<TempDir> {
    tempfile::Builder::new()
        .prefix(prefix)
        .tempdir()
        .map_err(|source| HarnessError::ScratchDir {
            action: "create",
            what,
            source,
        })
}
