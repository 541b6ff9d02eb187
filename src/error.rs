//! Error types for collection-migrate.
//!
//! All operations return `Result<T>` which aliases `Result<T, MigrateError>`.
//! Every variant maps onto one [`ErrorKind`] so callers can tell a bad
//! invocation from a failed git command or a rejected API call.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from migration steps.
#[derive(Debug, Error)]
pub enum MigrateError {
    /// A required file or directory is missing.
    #[error("The following file '{}' does not exist", .0.display())]
    NotFound(PathBuf),

    /// Required parameter combination is missing or contradictory.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Collection, module or branch name is not usable.
    #[error("Invalid name '{0}': {1}")]
    InvalidName(String, String),

    /// Another run holds the repository lease.
    #[error("Repository '{}' is locked by another migration run", .0.display())]
    Locked(PathBuf),

    /// An input document does not have the expected shape.
    #[error("Malformed {}: {reason}", .path.display())]
    Malformed { path: PathBuf, reason: String },

    /// None of the migrated paths exist in the repository.
    #[error("No files matched the modules and tests to remove")]
    NothingToRemove,

    /// An external command exited unsuccessfully.
    #[error("`{command}` failed with exit code {}", display_code(.code))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    /// `git am` rejected one patch of the set.
    #[error("error while applying patch '{}' ({index} out of {total})", .patch.display())]
    PatchFailed {
        patch: PathBuf,
        index: usize,
        total: usize,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    /// The hosting API answered with an error payload.
    #[error("Failed to create pull request due to: {message} ({status})")]
    Api {
        status: u16,
        message: String,
        errors: Vec<serde_json::Value>,
    },

    /// File system operation failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML parse or serialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parse or serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport failed before any API answer was received.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Migration plan is not valid TOML.
    #[error("TOML error: {0}")]
    Toml(#[from] toml_edit::TomlError),

    /// Regex compilation failed (indicates bug).
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// Unexpected error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Coarse classification of a [`MigrateError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing input, bad parameters, or a repository held by another run.
    Precondition,
    /// A git invocation exited non-zero.
    ExternalCommand,
    /// The hosting API rejected the request.
    ExternalApi,
    /// Anything else: I/O, parse failures, transport errors.
    Unexpected,
}

impl MigrateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MigrateError::NotFound(_)
            | MigrateError::InvalidArguments(_)
            | MigrateError::InvalidName(..)
            | MigrateError::Locked(_)
            | MigrateError::Malformed { .. }
            | MigrateError::NothingToRemove => ErrorKind::Precondition,
            MigrateError::CommandFailed { .. } | MigrateError::PatchFailed { .. } => {
                ErrorKind::ExternalCommand
            }
            MigrateError::Api { .. } => ErrorKind::ExternalApi,
            MigrateError::Io(_)
            | MigrateError::Yaml(_)
            | MigrateError::Json(_)
            | MigrateError::Http(_)
            | MigrateError::Toml(_)
            | MigrateError::Regex(_)
            | MigrateError::Other(_) => ErrorKind::Unexpected,
        }
    }

    /// Exit code, stdout and stderr of the failed command, if any.
    pub fn command_output(&self) -> Option<(Option<i32>, &str, &str)> {
        match self {
            MigrateError::CommandFailed {
                code,
                stdout,
                stderr,
                ..
            }
            | MigrateError::PatchFailed {
                code,
                stdout,
                stderr,
                ..
            } => Some((*code, stdout.as_str(), stderr.as_str())),
            _ => None,
        }
    }
}

fn display_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "none (terminated by signal)".to_string(), |c| c.to_string())
}

/// Result type alias for collection-migrate operations.
pub type Result<T> = std::result::Result<T, MigrateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_failure_message_names_position() {
        let err = MigrateError::PatchFailed {
            patch: PathBuf::from("0003-fix.patch"),
            index: 3,
            total: 10,
            code: Some(128),
            stdout: String::new(),
            stderr: "patch does not apply".into(),
        };

        assert_eq!(
            err.to_string(),
            "error while applying patch '0003-fix.patch' (3 out of 10)"
        );
        assert_eq!(err.kind(), ErrorKind::ExternalCommand);
        assert_eq!(
            err.command_output(),
            Some((Some(128), "", "patch does not apply"))
        );
    }

    #[test]
    fn test_kinds() {
        assert_eq!(
            MigrateError::NotFound(PathBuf::from("galaxy.yml")).kind(),
            ErrorKind::Precondition
        );
        assert_eq!(
            MigrateError::Api {
                status: 422,
                message: "Validation Failed".into(),
                errors: vec![],
            }
            .kind(),
            ErrorKind::ExternalApi
        );
        assert_eq!(
            MigrateError::Other(anyhow::anyhow!("boom")).kind(),
            ErrorKind::Unexpected
        );
    }

    #[test]
    fn test_signal_exit_code_display() {
        let err = MigrateError::CommandFailed {
            command: "git am".into(),
            code: None,
            stdout: String::new(),
            stderr: String::new(),
        };
        assert!(err.to_string().contains("terminated by signal"));
        assert!(err.command_output().is_some());
    }
}
