//! Advisory lease over a repository for the duration of one run.
//!
//! The lease is a file inside the git directory created with `create_new`,
//! so two runs against the same checkout cannot both hold it. It is removed
//! when the guard is dropped.

use crate::error::{MigrateError, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::Git;

const LOCK_FILE: &str = "collection-migrate.lock";

/// Held lease; released on drop.
#[derive(Debug)]
pub struct RepoLock {
    path: PathBuf,
}

impl RepoLock {
    /// Acquires the lease for the repository `git` operates on.
    ///
    /// # Errors
    ///
    /// - `Locked`: another run holds the lease
    /// - `CommandFailed`: the path is not a git repository
    pub fn acquire(git: &Git) -> Result<Self> {
        let path = git.git_dir()?.join(LOCK_FILE);
        Self::acquire_at(path, git.repo())
    }

    fn acquire_at(path: PathBuf, repo: &Path) -> Result<Self> {
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                let holder = fs::read_to_string(&path).unwrap_or_default();
                log::error!(
                    "Lease {} is held by process {}",
                    path.display(),
                    holder.trim()
                );
                log::info!("Hint: remove the file if no other run is in progress");
                return Err(MigrateError::Locked(repo.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };

        writeln!(file, "{}", std::process::id())?;
        log::debug!("Acquired {}", path.display());
        Ok(Self { path })
    }
}

impl Drop for RepoLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            log::warn!("Could not release {}: {}", self.path.display(), e);
        } else {
            log::debug!("Released {}", self.path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_second_acquire_fails_until_release() {
        let temp = TempDir::new().unwrap();
        let lock_path = temp.path().join(LOCK_FILE);

        let first = RepoLock::acquire_at(lock_path.clone(), temp.path()).unwrap();
        let second = RepoLock::acquire_at(lock_path.clone(), temp.path());
        assert!(matches!(second, Err(MigrateError::Locked(_))));

        drop(first);
        assert!(!lock_path.exists());
        assert!(RepoLock::acquire_at(lock_path, temp.path()).is_ok());
    }
}
