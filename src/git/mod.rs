//! Thin wrappers over the `git` command line.

pub mod command;
pub mod lock;

pub use command::{Git, GitOutput, shell_quote};
pub use lock::RepoLock;

/// Set for every `filter-branch` call to silence its deprecation notice.
pub const SQUELCH_ENV: &str = "FILTER_BRANCH_SQUELCH_WARNING";

/// Makes git treat every pathspec as a literal file name.
pub const LITERAL_PATHSPECS_ENV: &str = "GIT_LITERAL_PATHSPECS";
