//! Fixture staging.

use std::fs;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{HarnessError, HarnessResult};

/// Recursively copies the directory `from` into `to`, creating `to`.
///
/// Returns the number of files copied. Symlinks are recreated on Unix and
/// skipped elsewhere.
///
/// # Errors
///
/// Returns [`HarnessError::FixtureCopy`] if `from` is not a directory or any
/// entry cannot be read or written.
pub fn copy_tree(from: &Path, to: &Path) -> HarnessResult<usize> {
    let fail = |message: String| HarnessError::FixtureCopy {
        from: from.to_path_buf(),
        message,
    };

    if !from.is_dir() {
        return Err(fail("not a directory".to_string()));
    }

    let mut copied = 0;
    for entry in WalkDir::new(from).follow_links(false) {
        let entry = entry.map_err(|e| fail(e.to_string()))?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(|e| fail(e.to_string()))?;
        let target = to.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target)
                .map_err(|e| fail(format!("{}: {e}", target.display())))?;
        } else if file_type.is_file() {
            fs::copy(entry.path(), &target)
                .map_err(|e| fail(format!("{}: {e}", target.display())))?;
            copied += 1;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)
                .map_err(|e| fail(format!("{}: {e}", target.display())))?;
        }
    }

    debug!(from = %from.display(), to = %to.display(), files = copied, "Copied fixture");
    Ok(copied)
}

#[cfg(unix)]
fn copy_symlink(link: &Path, target: &Path) -> std::io::Result<()> {
    let points_to = fs::read_link(link)?;
    std::os::unix::fs::symlink(points_to, target)
}

#[cfg(not(unix))]
fn copy_symlink(link: &Path, _target: &Path) -> std::io::Result<()> {
    debug!(link = %link.display(), "Skipping symlink in fixture");
    Ok(())
}
