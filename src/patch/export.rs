//! Exporting the history of selected paths as a patch set.
//!
//! ## Steps
//!
//! 1. Reset the migration branch from the upstream reference
//! 2. Record every commit in topological order ([`CommitQueue`])
//! 3. Rewrite each message: tag it and point at the original commit
//! 4. Rewrite each tree down to the migrated paths, pruning empty commits
//! 5. `git format-patch` the result, one file per remaining commit
//!
//! The repository is left on the rewritten branch; nothing is rolled back
//! on failure.

use crate::collection::layout;
use crate::error::{MigrateError, Result};
use crate::git::{Git, RepoLock, SQUELCH_ENV, shell_quote};
use serde::Serialize;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

/// What to export and where it came from.
#[derive(Debug, Clone)]
pub struct ExportRequest<'a> {
    pub repo: &'a Path,
    pub branch: &'a str,
    pub upstream: &'a str,
    pub modules: &'a [String],
    pub integration_tests: &'a [String],
    /// Collection the history originates from, named in every footer.
    pub origin: &'a str,
    pub origin_url: &'a str,
}

/// Commit hashes of the branch, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitQueue(VecDeque<String>);

impl CommitQueue {
    /// Parses `git log --pretty=tformat:%H` output.
    pub fn from_log(stdout: &str) -> Self {
        Self(
            stdout
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn newest(&self) -> Option<&str> {
        self.0.front().map(String::as_str)
    }

    /// filter-branch rewrites starting from this one.
    pub fn oldest(&self) -> Option<&str> {
        self.0.back().map(String::as_str)
    }

    /// Upper bound for `git format-patch -<n>`.
    ///
    /// Rewriting only prunes commits, so the original count never truncates.
    pub fn format_patch_bound(&self) -> usize {
        self.0.len().max(1)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportOutcome {
    pub changed: bool,
    pub branch: String,
    /// Commits on the branch before rewriting.
    pub commits: usize,
    pub files: Vec<PathBuf>,
}

/// Runs the export. `filter_exe` is this program, re-entered by
/// filter-branch through the hidden `msg-filter`/`index-filter` subcommands.
pub fn create_patches(request: &ExportRequest<'_>, filter_exe: &Path) -> Result<ExportOutcome> {
    if request.modules.is_empty() {
        return Err(MigrateError::InvalidArguments(
            "at least one module is required".into(),
        ));
    }

    let git = Git::new(request.repo);
    let _lock = RepoLock::acquire(&git)?;

    log::info!(
        "Resetting branch '{}' from '{}'",
        request.branch,
        request.upstream
    );
    git.reset_branch(request.branch, request.upstream)?;

    let history = git.run(["log", "--pretty=tformat:%H", "--topo-order"])?;
    let queue = CommitQueue::from_log(&history.stdout);
    log::info!(
        "Rewriting {} commits ({}..{})",
        queue.len(),
        queue.oldest().unwrap_or("-"),
        queue.newest().unwrap_or("-")
    );

    let git = git.with_env(SQUELCH_ENV, "1");
    let exe = shell_quote(&filter_exe.to_string_lossy());

    let msg_filter = format!(
        "{exe} msg-filter --origin {} --origin-url {}",
        shell_quote(request.origin),
        shell_quote(request.origin_url)
    );
    git.run(["filter-branch", "-f", "--msg-filter", msg_filter.as_str()])?;

    let keep = layout::migrated_prefixes(request.modules, request.integration_tests);
    let index_filter = index_filter_command(&exe, &keep);
    log::debug!("Keeping: {}", keep.join(", "));
    git.run([
        "filter-branch",
        "-f",
        "--prune-empty",
        "--index-filter",
        index_filter.as_str(),
        "--",
        "HEAD",
    ])?;

    let bound = format!("-{}", queue.format_patch_bound());
    let out = git.run(["format-patch", bound.as_str(), request.branch])?;

    let mut files = out
        .lines()
        .map(|name| std::path::absolute(request.repo.join(name.trim())))
        .collect::<std::io::Result<Vec<PathBuf>>>()?;
    files.sort();
    log::info!("Exported {} patches", files.len());

    Ok(ExportOutcome {
        changed: true,
        branch: request.branch.to_string(),
        commits: queue.len(),
        files,
    })
}

fn index_filter_command(exe: &str, keep: &[String]) -> String {
    let mut command = format!("{exe} index-filter");
    for prefix in keep {
        command.push_str(" --keep ");
        command.push_str(&shell_quote(prefix));
    }
    command
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_queue_from_log() {
        let queue = CommitQueue::from_log("ccc\nbbb\n\naaa\n");
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.format_patch_bound(), 3);
        assert_eq!(queue.oldest(), Some("aaa"));
        assert_eq!(queue.newest(), Some("ccc"));
    }

    #[test]
    fn test_empty_queue_bound() {
        let queue = CommitQueue::from_log("");
        assert!(queue.is_empty());
        assert_eq!(queue.format_patch_bound(), 1);
    }

    #[test]
    fn test_index_filter_command_quotes_prefixes() {
        let command = index_filter_command(
            "'/opt/my tools/collection-migrate'",
            &["plugins/modules/foo.py".into(), "tests/integration/targets/foo/".into()],
        );
        assert_eq!(
            command,
            "'/opt/my tools/collection-migrate' index-filter \
             --keep plugins/modules/foo.py --keep tests/integration/targets/foo/"
        );
    }

    #[test]
    fn test_requires_modules() {
        let request = ExportRequest {
            repo: Path::new("."),
            branch: "promote",
            upstream: "upstream/main",
            modules: &[],
            integration_tests: &[],
            origin: "community.aws",
            origin_url: crate::patch::filter::DEFAULT_ORIGIN_URL,
        };
        let err = create_patches(&request, Path::new("collection-migrate")).unwrap_err();
        assert!(matches!(err, MigrateError::InvalidArguments(_)));
    }
}
