//! Printing step results.
//!
//! Every step outcome is `Serialize`; `--json` prints it as one object on
//! stdout, otherwise a short colored summary is printed. Failures follow
//! the same split.

use crate::error::{ErrorKind, MigrateError, Result};
use colored::Colorize;
use serde::Serialize;
use std::path::Path;

/// A step result that can be printed both ways.
pub trait Outcome: Serialize {
    /// Prints the human summary to stdout.
    fn print_human(&self);
}

pub fn emit<T: Outcome>(outcome: &T, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(outcome)?);
    } else {
        outcome.print_human();
    }
    Ok(())
}

/// The failure half of the result contract.
#[derive(Debug, Serialize)]
pub struct Failure<'a> {
    pub failed: bool,
    pub msg: String,
    pub kind: ErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rc: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<&'a [serde_json::Value]>,
}

impl<'a> Failure<'a> {
    pub fn from_error(err: &'a MigrateError) -> Self {
        let (rc, stdout, stderr) = match err.command_output() {
            Some((rc, stdout, stderr)) => (rc, Some(stdout), Some(stderr)),
            None => (None, None, None),
        };
        let errors = match err {
            MigrateError::Api { errors, .. } => Some(errors.as_slice()),
            _ => None,
        };

        Self {
            failed: true,
            msg: err.to_string(),
            kind: err.kind(),
            rc,
            stdout,
            stderr,
            errors,
        }
    }
}

/// Reports a failed step; JSON on stdout, text on stderr.
pub fn print_failure(err: &MigrateError, json: bool) {
    let failure = Failure::from_error(err);
    if json {
        match serde_json::to_string(&failure) {
            Ok(line) => println!("{}", line),
            Err(e) => eprintln!("{} {} ({})", "Error:".red(), err, e),
        }
        return;
    }

    eprintln!("{} {}", "Error:".red(), failure.msg);
    if let Some(stderr) = failure.stderr.map(str::trim).filter(|s| !s.is_empty()) {
        for line in stderr.lines() {
            eprintln!("  {}", line.dimmed());
        }
    }
    if let Some(errors) = failure.errors {
        for error in errors {
            eprintln!("  {}", error.to_string().dimmed());
        }
    }
}

/// Path relative to `root` with forward slashes, for summaries.
pub fn display_path(path: &Path, root: &Path) -> String {
    pathdiff::diff_paths(path, root)
        .filter(|p| !p.starts_with(".."))
        .unwrap_or_else(|| path.to_path_buf())
        .to_string_lossy()
        .replace('\\', "/")
}

pub(crate) fn print_status(changed: bool, what: &str) {
    if changed {
        println!("{} {}", "✓".green().bold(), what);
    } else {
        println!("{} {}", "•".yellow(), what);
    }
}
