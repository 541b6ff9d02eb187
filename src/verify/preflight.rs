//! Pre-flight checks performed before a step touches a repository.
//!
//! Unlike `rules`, these functions perform I/O (running git, checking that
//! files exist).

use crate::collection::layout;
use crate::error::{MigrateError, Result};
use crate::git::Git;
use std::path::{Path, PathBuf};

/// Fails if `git` cannot be executed.
pub fn check_git_available() -> Result<()> {
    if Git::new(".").probe(["--version"]) {
        Ok(())
    } else {
        Err(MigrateError::NotFound(PathBuf::from("git")))
    }
}

/// Fails unless `path` is inside a git work tree.
pub fn check_work_tree(path: &Path) -> Result<()> {
    if !path.is_dir() {
        return Err(MigrateError::NotFound(path.to_path_buf()));
    }
    if !Git::new(path).probe(["rev-parse", "--is-inside-work-tree"]) {
        return Err(MigrateError::InvalidArguments(format!(
            "'{}' is not a git work tree",
            path.display()
        )));
    }
    Ok(())
}

/// Fails unless `path` holds a collection (`galaxy.yml` present).
pub fn check_collection(path: &Path) -> Result<()> {
    let manifest = path.join("galaxy.yml");
    if !manifest.is_file() {
        return Err(MigrateError::NotFound(manifest));
    }
    Ok(())
}

/// Fails on the first module whose source file is missing.
pub fn check_modules_exist(collection: &Path, modules: &[String]) -> Result<()> {
    for module in modules {
        let path = layout::module_path(collection, module);
        if !path.is_file() {
            return Err(MigrateError::NotFound(path));
        }
    }
    Ok(())
}

/// Warns about uncommitted changes to tracked files.
///
/// Returns `true` if the work tree is clean. Untracked files are ignored
/// because no step reads them.
pub fn check_clean(path: &Path) -> bool {
    let status = match Git::new(path).run(["status", "--porcelain", "-uno"]) {
        Ok(out) => out,
        Err(e) => {
            log::warn!("Failed to execute git status: {}", e);
            return true;
        }
    };

    let modified: Vec<&str> = status.lines().map(str::trim).collect();
    if modified.is_empty() {
        return true;
    }

    log::warn!("Uncommitted changes detected in {}:", path.display());
    for file in modified.iter().take(5) {
        log::warn!("  {}", file);
    }
    if modified.len() > 5 {
        log::warn!("  ... and {} more files", modified.len() - 5);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_check_collection() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            check_collection(temp.path()).unwrap_err(),
            MigrateError::NotFound(_)
        ));

        fs::write(temp.path().join("galaxy.yml"), "namespace: a\nname: b\n").unwrap();
        assert!(check_collection(temp.path()).is_ok());
    }

    #[test]
    fn test_check_modules_exist() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("plugins/modules")).unwrap();
        fs::write(temp.path().join("plugins/modules/foo.py"), "").unwrap();

        assert!(check_modules_exist(temp.path(), &["foo".into()]).is_ok());
        let err = check_modules_exist(temp.path(), &["foo".into(), "bar".into()]).unwrap_err();
        assert!(matches!(err, MigrateError::NotFound(p) if p.ends_with("plugins/modules/bar.py")));
    }

    #[test]
    fn test_missing_work_tree() {
        let temp = TempDir::new().unwrap();
        let err = check_work_tree(&temp.path().join("missing")).unwrap_err();
        assert!(matches!(err, MigrateError::NotFound(_)));
    }
}
