//! Filters run by `git filter-branch` while exporting history.
//!
//! filter-branch evaluates each filter through the shell once per commit,
//! with `GIT_COMMIT` naming the original commit being rewritten. Both
//! filters here are stateless: they read what they need from that variable
//! and from git, so the number of invocations never has to match anything.

use crate::error::{MigrateError, Result};
use crate::git::{Git, LITERAL_PATHSPECS_ENV};
use std::io::{Read, Write};

pub const PROMOTED_TAG: &str = "[promoted]";
pub const DEFAULT_ORIGIN_URL: &str = "https://github.com/ansible-collections";

/// `git rm` arguments per invocation, to stay well below `ARG_MAX`.
const RM_CHUNK: usize = 500;

/// Tags a commit message and appends a footer pointing at the original commit.
pub fn promote_message(message: &str, origin_url: &str, origin: &str, commit: &str) -> String {
    let origin_url = origin_url.trim_end_matches('/');
    format!(
        "{PROMOTED_TAG} {}\n\n\
         This commit was initially merged in {origin_url}/{origin}\n\
         See: {origin_url}/{origin}/commit/{commit}\n",
        message.trim_end()
    )
}

/// Files of a tree that fall outside every `keep` prefix.
pub fn files_to_drop<'a>(
    files: impl IntoIterator<Item = &'a str>,
    keep: &[String],
) -> Vec<&'a str> {
    files
        .into_iter()
        .filter(|file| !file.is_empty())
        .filter(|file| !keep.iter().any(|prefix| file.starts_with(prefix.as_str())))
        .collect()
}

fn current_commit() -> Result<String> {
    std::env::var("GIT_COMMIT").map_err(|_| {
        MigrateError::InvalidArguments(
            "GIT_COMMIT is not set; this filter is meant to be run by git filter-branch".into(),
        )
    })
}

/// `--msg-filter`: message on stdin, rewritten message on stdout.
pub fn run_msg_filter(origin_url: &str, origin: &str) -> Result<()> {
    let commit = current_commit()?;

    let mut message = String::new();
    std::io::stdin().read_to_string(&mut message)?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(promote_message(&message, origin_url, origin, &commit).as_bytes())?;
    stdout.flush()?;
    Ok(())
}

/// `--index-filter`: removes everything but the `keep` prefixes from the index.
///
/// Returns the number of paths removed.
pub fn run_index_filter(keep: &[String]) -> Result<usize> {
    let commit = current_commit()?;
    // filter-branch exports GIT_DIR, GIT_WORK_TREE and GIT_INDEX_FILE for us.
    let git = Git::new(".").with_env(LITERAL_PATHSPECS_ENV, "1");

    let tree = git.run([
        "ls-tree",
        "-r",
        "-z",
        "--name-only",
        "--full-tree",
        commit.as_str(),
    ])?;
    let dropped = files_to_drop(tree.entries(), keep);

    for chunk in dropped.chunks(RM_CHUNK) {
        let mut args = vec!["rm", "--cached", "--ignore-unmatch", "-r", "-f", "-q", "--"];
        args.extend_from_slice(chunk);
        git.run(&args)?;
    }

    log::debug!("{}: dropped {} paths", commit, dropped.len());
    Ok(dropped.len())
}
