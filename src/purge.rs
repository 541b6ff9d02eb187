//! Removing migrated files from the source repository.
//!
//! The branch is recreated from upstream so the removal lands on a clean
//! history, then a single commit deletes every migrated path.

use crate::collection::layout;
use crate::error::{MigrateError, Result};
use crate::git::{Git, RepoLock};
use serde::Serialize;
use std::path::Path;

const INDEX_CHUNK: usize = 500;

#[derive(Debug, Clone, Serialize)]
pub struct PurgeOutcome {
    pub changed: bool,
    pub branch: String,
    pub removed: Vec<String>,
    pub stdout: String,
    pub stderr: String,
}

/// `-x` patterns selecting the migrated files for `git ls-files -i`.
pub fn exclude_patterns(modules: &[String], integration_tests: &[String]) -> Vec<String> {
    let mut patterns = Vec::new();
    for module in modules {
        patterns.push(layout::module_file(module));
        patterns.push(format!("{}*", layout::target_dir(module)));
    }
    for target in integration_tests {
        let pattern = format!("{}*", layout::target_dir(target));
        if !patterns.contains(&pattern) {
            patterns.push(pattern);
        }
    }
    patterns
}

pub fn commit_message(modules: &[String]) -> String {
    format!("Remove modules {} and corresponding tests.", modules.join(","))
}

/// Recreates `branch` from `upstream` and commits the removal of the
/// migrated modules and test targets.
///
/// # Errors
///
/// - `NothingToRemove`: no file matched the migrated paths
/// - `CommandFailed`: any git step failed; nothing is undone
pub fn remove_modules(
    repo: &Path,
    branch: &str,
    upstream: &str,
    modules: &[String],
    integration_tests: &[String],
) -> Result<PurgeOutcome> {
    if modules.is_empty() {
        return Err(MigrateError::InvalidArguments(
            "at least one module is required".into(),
        ));
    }

    let git = Git::new(repo);
    let _lock = RepoLock::acquire(&git)?;

    git.run(["checkout", upstream])?;
    if git.branch_exists(branch) {
        log::info!("Deleting existing branch '{}'", branch);
        git.run(["branch", "-D", branch])?;
    }
    git.reset_branch(branch, upstream)?;

    let mut list = vec![
        "ls-files".to_string(),
        "-z".into(),
        "-c".into(),
        "-o".into(),
        "-i".into(),
    ];
    for pattern in exclude_patterns(modules, integration_tests) {
        list.push("-x".into());
        list.push(pattern);
    }
    let listed = git.run(&list)?;

    let mut removed: Vec<String> = listed.entries().map(str::to_string).collect();
    removed.dedup();
    if removed.is_empty() {
        return Err(MigrateError::NothingToRemove);
    }
    log::info!("Removing {} files from '{}'", removed.len(), branch);

    for chunk in removed.chunks(INDEX_CHUNK) {
        let mut args = vec!["update-index", "--force-remove", "--"];
        args.extend(chunk.iter().map(String::as_str));
        git.run(&args)?;
    }
    git.run(["add", "-u"])?;
    git.run(["commit", "-m", commit_message(modules).as_str()])?;
    let cleaned = git.run(["clean", "-ffdx"])?;

    Ok(PurgeOutcome {
        changed: true,
        branch: branch.to_string(),
        removed,
        stdout: cleaned.stdout,
        stderr: cleaned.stderr,
    })
}
