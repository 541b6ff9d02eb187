//! Running git in a repository.
//!
//! Every invocation is logged at debug level, waits for completion, and
//! turns a non-zero exit into [`MigrateError::CommandFailed`] carrying the
//! captured output.

use crate::error::{MigrateError, Result};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Captured output of a successful git invocation.
#[derive(Debug, Clone, Default)]
pub struct GitOutput {
    pub stdout: String,
    pub stderr: String,
}

impl GitOutput {
    /// Non-empty stdout lines.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.stdout.lines().filter(|line| !line.is_empty())
    }

    /// Non-empty stdout records of a `-z` invocation.
    ///
    /// Paths arrive unquoted, whatever `core.quotePath` says.
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.stdout.split('\0').filter(|entry| !entry.is_empty())
    }
}

/// A git working tree.
#[derive(Debug, Clone)]
pub struct Git {
    repo: PathBuf,
    envs: Vec<(String, String)>,
}

impl Git {
    pub fn new(repo: impl Into<PathBuf>) -> Self {
        Self {
            repo: repo.into(),
            envs: Vec::new(),
        }
    }

    pub fn repo(&self) -> &Path {
        &self.repo
    }

    /// Returns a copy that sets `key=value` for every invocation.
    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.envs.push((key.to_string(), value.to_string()));
        self
    }

    /// Runs `git <args>` and requires success.
    pub fn run<I, S>(&self, args: I) -> Result<GitOutput>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<_> = args.into_iter().map(|a| a.as_ref().to_owned()).collect();
        let command = describe(&args);
        let output = self.output(&args)?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            log::debug!("{} failed: {}", command, stderr.trim());
            return Err(MigrateError::CommandFailed {
                command,
                code: output.status.code(),
                stdout,
                stderr,
            });
        }

        Ok(GitOutput { stdout, stderr })
    }

    /// Runs `git <args>` and reports only whether it succeeded.
    pub fn probe<I, S>(&self, args: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<_> = args.into_iter().map(|a| a.as_ref().to_owned()).collect();
        self.output(&args)
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn output(&self, args: &[std::ffi::OsString]) -> Result<Output> {
        log::debug!("Running {} in {}", describe(args), self.repo.display());

        let mut cmd = Command::new("git");
        cmd.args(args).current_dir(&self.repo);
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }

        cmd.output().map_err(|e| {
            MigrateError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to execute git: {}", e),
            ))
        })
    }

    /// `git checkout -B <branch> <start>`
    pub fn reset_branch(&self, branch: &str, start: &str) -> Result<GitOutput> {
        self.run(["checkout", "-B", branch, start])
    }

    pub fn branch_exists(&self, branch: &str) -> bool {
        let reference = format!("refs/heads/{branch}");
        self.probe(["rev-parse", "--verify", "--quiet", reference.as_str()])
    }

    /// Absolute path of the repository's git directory.
    pub fn git_dir(&self) -> Result<PathBuf> {
        let out = self.run(["rev-parse", "--absolute-git-dir"])?;
        Ok(PathBuf::from(out.stdout.trim()))
    }
}

fn describe(args: &[std::ffi::OsString]) -> String {
    let mut command = String::from("git");
    for arg in args {
        command.push(' ');
        command.push_str(&arg.to_string_lossy());
    }
    command
}

/// Quotes `s` for inclusion in a `sh -c` command line.
///
/// `git filter-branch` evaluates its filters through the shell.
pub fn shell_quote(s: &str) -> String {
    if !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:@+,".contains(c))
    {
        return s.to_string();
    }
    format!("'{}'", s.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("plugins/modules/foo.py"), "plugins/modules/foo.py");
        assert_eq!(shell_quote("/opt/my tools/bin"), "'/opt/my tools/bin'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(shell_quote(""), "''");
    }

    #[test]
    fn test_entries_split_on_nul() {
        let out = GitOutput {
            stdout: "docs/caf\u{e9}.md\0plugins/modules/foo.py\0\0".into(),
            stderr: String::new(),
        };
        assert_eq!(
            out.entries().collect::<Vec<_>>(),
            vec!["docs/caf\u{e9}.md", "plugins/modules/foo.py"]
        );
    }

    #[test]
    fn test_failure_outside_repository() {
        let temp = TempDir::new().unwrap();
        let ceiling = temp.path().parent().unwrap().to_string_lossy().into_owned();
        let git = Git::new(temp.path()).with_env("GIT_CEILING_DIRECTORIES", &ceiling);

        let err = git.run(["rev-parse", "--git-dir"]).unwrap_err();
        match err {
            MigrateError::CommandFailed { command, code, .. } => {
                assert_eq!(command, "git rev-parse --git-dir");
                assert_ne!(code, Some(0));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!git.probe(["rev-parse", "--git-dir"]));
    }
}
