//! All-or-nothing file rewrites with rollback support.
//!
//! Every file-rewriting step (module sources, `meta/runtime.yml`, changelog
//! fragments, integration-test YAML, sanity ignore files) stages its writes
//! here and commits them together, so a failure halfway through a batch
//! leaves the collection as it was.
//!
//! ## Phases
//!
//! 1. **Build**: Stage operations via `update_file()` and `write_file()`
//! 2. **Validate**: Check paths exist, are writable, no duplicates
//! 3. **Execute**: Apply in staging order, creating parent directories
//! 4. **Rollback** (on failure): Reverse executed operations in LIFO order
//!
//! ## Example
//!
//! ```no_run
//! # use collection_migrate::fs::Transaction;
//! # use std::path::PathBuf;
//! # fn example() -> collection_migrate::error::Result<()> {
//! let mut txn = Transaction::new(false);
//!
//! txn.update_file(PathBuf::from("meta/runtime.yml"), "---\nrequires_ansible: '>=2.14'\n".into())?;
//! txn.write_file(PathBuf::from("changelogs/fragments/migrate_foo.yml"), "---\n".into())?;
//!
//! txn.commit()?;
//! # Ok(())
//! # }
//! ```

use crate::error::{MigrateError, Result};
use crate::report::display_path;

use colored::Colorize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// A file system operation that can be committed or rolled back.
#[derive(Debug, Clone)]
pub enum Operation {
    /// Replace the contents of an existing file.
    ///
    /// Stores original content for rollback.
    UpdateFile {
        path: PathBuf,
        original: String,
        new: String,
    },
    /// Create a file that did not exist when staged.
    ///
    /// Rolled back by removing the file again.
    CreateFile { path: PathBuf, new: String },
}

impl Operation {
    pub fn path(&self) -> &Path {
        match self {
            Operation::UpdateFile { path, .. } | Operation::CreateFile { path, .. } => path,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransactionState {
    /// Staging operations.
    Building,
    /// All operations succeeded.
    Committed,
    /// Rolled back after commit or after a failed commit.
    RolledBack,
    /// Validation failed; nothing executed.
    Failed,
}

/// Transaction coordinating a batch of file writes.
///
/// Must be explicitly committed. If dropped without committing, logs a warning
/// but doesn't roll back (since operations weren't applied).
///
/// ## Dry-Run Mode
///
/// When `dry_run = true`, operations are staged and reported but never written.
#[must_use = "Transaction must be committed or rolled back"]
pub struct Transaction {
    operations: Vec<Operation>,
    dry_run: bool,
    state: TransactionState,
    executed_indices: Vec<usize>,
}

impl Transaction {
    /// Creates a new transaction.
    pub fn new(dry_run: bool) -> Self {
        Self {
            operations: Vec::new(),
            dry_run,
            state: TransactionState::Building,
            executed_indices: Vec::new(),
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Returns true if successfully committed.
    pub fn is_committed(&self) -> bool {
        self.state == TransactionState::Committed
    }

    /// Paths touched by the staged operations, in staging order.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.operations
            .iter()
            .map(|op| op.path().to_path_buf())
            .collect()
    }

    fn ensure_building(&self) -> Result<()> {
        if self.state != TransactionState::Building {
            return Err(MigrateError::Other(anyhow::anyhow!(
                "Cannot modify transaction after commit/rollback"
            )));
        }
        Ok(())
    }

    /// Stages a file update.
    ///
    /// Reads current content and compares to `new_content`. If identical,
    /// skips (idempotent). Otherwise stages for commit.
    pub fn update_file(&mut self, path: PathBuf, new_content: String) -> Result<()> {
        self.ensure_building()?;

        log::debug!("Staging update for: {}", path.display());

        let original = fs::read_to_string(&path).map_err(|e| {
            log::error!("Failed to read {}: {}", path.display(), e);
            MigrateError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read {}: {}", path.display(), e),
            ))
        })?;

        if original == new_content {
            log::debug!("Content unchanged, skipping: {}", path.display());
            return Ok(());
        }

        if self.dry_run {
            log::info!("Would update: {}", path.display());
        }

        self.operations.push(Operation::UpdateFile {
            path,
            original,
            new: new_content,
        });

        Ok(())
    }

    /// Stages a write that may create the file.
    ///
    /// Existing files are treated like [`Transaction::update_file`].
    pub fn write_file(&mut self, path: PathBuf, new_content: String) -> Result<()> {
        if path.exists() {
            return self.update_file(path, new_content);
        }
        self.ensure_building()?;

        if self.dry_run {
            log::info!("Would create: {}", path.display());
        } else {
            log::debug!("Staging creation of: {}", path.display());
        }

        self.operations.push(Operation::CreateFile {
            path,
            new: new_content,
        });
        Ok(())
    }

    /// Validates all staged operations.
    ///
    /// Checks:
    /// - No duplicate file operations
    /// - Updated files still exist and are writable
    /// - Created files were not created behind our back
    fn validate(&self) -> Result<()> {
        let mut file_paths = HashSet::new();

        for op in &self.operations {
            let path = op.path();
            if !file_paths.insert(path.to_path_buf()) {
                return Err(MigrateError::Other(anyhow::anyhow!(
                    "Duplicate file operation: {}",
                    path.display()
                )));
            }

            match op {
                Operation::UpdateFile { path, .. } => {
                    if !path.exists() {
                        return Err(MigrateError::Io(std::io::Error::new(
                            std::io::ErrorKind::NotFound,
                            format!("File no longer exists: {}", path.display()),
                        )));
                    }

                    if let Ok(metadata) = fs::metadata(path)
                        && metadata.permissions().readonly()
                    {
                        return Err(MigrateError::Io(std::io::Error::new(
                            std::io::ErrorKind::PermissionDenied,
                            format!("File is read-only: {}", path.display()),
                        )));
                    }
                }
                Operation::CreateFile { path, .. } => {
                    if path.exists() {
                        return Err(MigrateError::Io(std::io::Error::new(
                            std::io::ErrorKind::AlreadyExists,
                            format!("File appeared while staging: {}", path.display()),
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    /// Commits all staged operations.
    ///
    /// On a write failure, operations already executed are rolled back
    /// before the error is returned.
    pub fn commit(&mut self) -> Result<()> {
        self.ensure_building()?;

        if self.dry_run {
            self.state = TransactionState::Committed;
            return Ok(());
        }

        if let Err(e) = self.validate() {
            self.state = TransactionState::Failed;
            return Err(e);
        }

        for idx in 0..self.operations.len() {
            if let Err(e) = self.execute(idx) {
                log::error!("Commit failed, rolling back: {}", e);
                if let Err(rollback_err) = self.rollback_partial() {
                    log::error!("{}", rollback_err);
                }
                return Err(e);
            }
            self.executed_indices.push(idx);
        }

        self.state = TransactionState::Committed;
        Ok(())
    }

    fn execute(&self, idx: usize) -> Result<()> {
        let (path, content) = match &self.operations[idx] {
            Operation::UpdateFile { path, new, .. } => (path, new),
            Operation::CreateFile { path, new } => {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                (path, new)
            }
        };

        fs::write(path, content).map_err(|e| {
            MigrateError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to write {}: {}", path.display(), e),
            ))
        })?;
        log::debug!("Wrote: {}", path.display());
        Ok(())
    }

    /// Manually rolls back a committed transaction.
    ///
    /// Reverses operations in LIFO order. Only works on committed transactions.
    pub fn rollback(&mut self) -> Result<()> {
        match self.state {
            TransactionState::Building => Ok(()),
            TransactionState::Committed if self.dry_run => Ok(()),
            TransactionState::Committed => {
                self.executed_indices = (0..self.operations.len()).collect();
                self.rollback_partial()
            }
            TransactionState::Failed => Err(MigrateError::Other(anyhow::anyhow!(
                "Transaction failed; nothing was written"
            ))),
            TransactionState::RolledBack => Err(MigrateError::Other(anyhow::anyhow!(
                "Transaction already rolled back"
            ))),
        }
    }

    /// Rolls back executed operations only.
    fn rollback_partial(&mut self) -> Result<()> {
        let mut errors = Vec::new();

        for &idx in self.executed_indices.iter().rev() {
            let result = match &self.operations[idx] {
                Operation::UpdateFile { path, original, .. } => fs::write(path, original)
                    .map_err(|e| format!("Failed to restore {}: {}", path.display(), e)),
                Operation::CreateFile { path, .. } => match fs::remove_file(path) {
                    Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                        Err(format!("Failed to remove {}: {}", path.display(), e))
                    }
                    _ => Ok(()),
                },
            };

            if let Err(e) = result {
                errors.push(e);
            }
        }

        self.executed_indices.clear();
        self.state = TransactionState::RolledBack;

        if errors.is_empty() {
            log::info!("Rollback completed");
            Ok(())
        } else {
            Err(MigrateError::Other(anyhow::anyhow!(
                "Rollback failed: {}",
                errors.join("; ")
            )))
        }
    }

    /// Prints the staged or applied files to stdout.
    ///
    /// Paths are relative to `root` with forward slashes.
    pub fn print_summary(&self, root: &Path) {
        if self.operations.is_empty() {
            println!("{}", "No changes needed".yellow());
            return;
        }

        if self.dry_run {
            println!("{}", "DRY RUN - No changes will be made".yellow().bold());
        }

        let mut lines: Vec<(String, bool)> = self
            .operations
            .iter()
            .map(|op| {
                (
                    display_path(op.path(), root),
                    matches!(op, Operation::CreateFile { .. }),
                )
            })
            .collect();
        lines.sort();

        for (path, created) in &lines {
            let marker = match (self.dry_run, created) {
                (true, _) => "•".to_string(),
                (false, true) => "+".green().to_string(),
                (false, false) => "✓".green().to_string(),
            };
            println!("   {} {}", marker, path.dimmed());
        }
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if self.state == TransactionState::Building && !self.operations.is_empty() && !self.dry_run
        {
            log::warn!("Transaction dropped without commit");
        }
    }
}
