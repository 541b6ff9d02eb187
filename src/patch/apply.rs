//! Applying a patch set with `git am`.

use crate::error::{MigrateError, Result};
use crate::git::{Git, RepoLock};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize)]
pub struct ApplyOutcome {
    pub changed: bool,
    pub applied: usize,
    pub msg: String,
}

/// Orders a patch set for application.
///
/// Lexical order is history order because format-patch zero-pads the
/// sequence number in every file name.
pub fn ordered(patches: &[PathBuf]) -> Vec<PathBuf> {
    let mut sorted = patches.to_vec();
    sorted.sort();
    sorted
}

/// Applies every patch in ascending order, stopping at the first failure.
///
/// Nothing is undone on failure: the repository stays at the last commit
/// that applied cleanly, with `git am` still in progress.
///
/// # Errors
///
/// - `NotFound`: one of the patch files does not exist (checked up front)
/// - `PatchFailed`: `git am` rejected the patch at the reported 1-based index
pub fn apply_patches(repo: &Path, patches: &[PathBuf]) -> Result<ApplyOutcome> {
    let patches = ordered(patches)
        .into_iter()
        .map(std::path::absolute)
        .collect::<std::io::Result<Vec<_>>>()?;

    if let Some(missing) = patches.iter().find(|p| !p.is_file()) {
        return Err(MigrateError::NotFound(missing.clone()));
    }

    let git = Git::new(repo);
    let _lock = RepoLock::acquire(&git)?;
    let total = patches.len();

    for (idx, patch) in patches.iter().enumerate() {
        log::info!("Applying {} ({}/{})", patch.display(), idx + 1, total);

        match git.run([
            Path::new("am"),
            Path::new("--3way"),
            Path::new("--keep-non-patch"),
            patch.as_path(),
        ]) {
            Ok(_) => {}
            Err(MigrateError::CommandFailed {
                code,
                stdout,
                stderr,
                ..
            }) => {
                return Err(MigrateError::PatchFailed {
                    patch: patch.clone(),
                    index: idx + 1,
                    total,
                    code,
                    stdout,
                    stderr,
                });
            }
            Err(e) => return Err(e),
        }
    }

    Ok(ApplyOutcome {
        changed: total > 0,
        applied: total,
        msg: format!("{} successfully applied", total),
    })
}
