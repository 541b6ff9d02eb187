//! `run`: a whole migration from one plan file.
//!
//! ## Order
//!
//! 1. Preflight both repositories and identify both collections
//! 2. Export the history of the migrated paths from the source
//! 3. Reset the destination branch and apply the patches there
//! 4. Commit the removal of the migrated paths in the source
//! 5. Rewrite modules, `meta/runtime.yml`, test targets and sanity ignores
//! 6. Commit the rewrites in each repository
//!
//! Patches must be applied before the removal commit: the removal runs
//! `git clean -ffdx`, which would delete the exported patch files.

use crate::branch;
use crate::collection::{self, CollectionName};
use crate::error::{MigrateError, Result};
use crate::fs::Transaction;
use crate::git::Git;
use crate::meta::{self, RuntimeRequest, RuntimeUpdate};
use crate::patch::filter::DEFAULT_ORIGIN_URL;
use crate::patch::{self, ApplyOutcome, ExportOutcome, ExportRequest};
use crate::plan::Plan;
use crate::purge::{self, PurgeOutcome};
use crate::report::{self, Outcome, print_status};
use crate::rewrite::{self, DEST_IMPORT, ModulePatterns, SOURCE_IMPORT, TestsUpdate};
use crate::sanity::{self, IgnoreUpdate};
use crate::verify::{
    check_clean, check_collection, check_git_available, check_modules_exist, check_work_tree,
    validate_branch_name, validate_selection,
};
use clap::Parser;
use colored::Colorize;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Migration plan (TOML)
    #[arg(long, value_name = "FILE")]
    pub plan: PathBuf,
}

#[derive(Debug, Serialize)]
pub struct RunOutcome {
    pub changed: bool,
    pub branch: String,
    pub src: String,
    pub dest: String,
    pub export: ExportOutcome,
    pub apply: ApplyOutcome,
    pub purge: PurgeOutcome,
    pub modules: Vec<String>,
    pub runtime: RuntimeUpdate,
    pub tests: TestsUpdate,
    pub ignore: IgnoreUpdate,
    /// Repositories that received a rewrite commit.
    pub committed: Vec<PathBuf>,
}

impl Outcome for RunOutcome {
    fn print_human(&self) {
        println!(
            "{} {} {} {} on '{}'",
            "Migrating".bold(),
            self.src.cyan(),
            "->".dimmed(),
            self.dest.cyan(),
            self.branch
        );
        self.export.print_human();
        self.apply.print_human();
        self.purge.print_human();
        print_status(
            !self.modules.is_empty(),
            &format!("{} modules rewritten", self.modules.len()),
        );
        self.runtime.print_human();
        self.tests.print_human();
        self.ignore.print_human();
        for repo in &self.committed {
            print_status(true, &format!("Committed rewrites in {}", repo.display()));
        }
    }
}

fn collection_name(path: &Path) -> Result<CollectionName> {
    collection::identify(path)?
        .collection_name()
        .ok_or_else(|| MigrateError::Malformed {
            path: path.join("galaxy.yml"),
            reason: "namespace and name are both required".into(),
        })
}

/// `git add -A` and commit, unless nothing changed.
fn commit_all(repo: &Path, message: &str) -> Result<bool> {
    let git = Git::new(repo);
    git.run(["add", "-A"])?;
    let status = git.run(["status", "--porcelain"])?;
    if status.lines().all(|line| line.trim().is_empty()) {
        log::info!("Nothing to commit in {}", repo.display());
        return Ok(false);
    }
    git.run(["commit", "-m", message])?;
    Ok(true)
}

fn preflight(plan: &Plan) -> Result<()> {
    validate_selection(&plan.modules, &plan.integration_tests)?;
    check_git_available()?;
    for repo in [&plan.source, &plan.destination] {
        check_work_tree(repo)?;
        check_collection(repo)?;
    }
    check_modules_exist(&plan.source, &plan.modules)
}

pub fn execute(args: RunArgs, json: bool) -> Result<()> {
    let plan = Plan::load(&args.plan)?;
    preflight(&plan)?;

    let src_name = collection_name(&plan.source)?;
    let dest_name = collection_name(&plan.destination)?;
    let branch = branch::generate(&plan.branch_prefix);
    validate_branch_name(&branch)?;
    log::info!("Migrating {} -> {} on '{}'", src_name, dest_name, branch);

    let origin = src_name.to_string();
    let export = patch::create_patches(
        &ExportRequest {
            repo: &plan.source,
            branch: &branch,
            upstream: &plan.upstream,
            modules: &plan.modules,
            integration_tests: &plan.integration_tests,
            origin: &origin,
            origin_url: DEFAULT_ORIGIN_URL,
        },
        &std::env::current_exe()?,
    )?;

    check_clean(&plan.destination);
    Git::new(&plan.destination).reset_branch(&branch, &plan.upstream)?;
    let apply = patch::apply_patches(&plan.destination, &export.files)?;
    for file in &export.files {
        std::fs::remove_file(file)?;
    }

    let purge = purge::remove_modules(
        &plan.source,
        &branch,
        &plan.upstream,
        &plan.modules,
        &plan.integration_tests,
    )?;

    let patterns = ModulePatterns::new(
        &src_name.to_string(),
        &dest_name.to_string(),
        SOURCE_IMPORT,
        DEST_IMPORT,
    )?;
    let mut targets = plan.modules.clone();
    targets.extend(plan.integration_tests.iter().cloned());

    let mut txn = Transaction::new(false);
    let modules = rewrite::update_modules(&plan.destination, &plan.modules, &patterns, &mut txn)?;
    let runtime = meta::update_runtime(
        &RuntimeRequest {
            src: &plan.source,
            dest: &plan.destination,
            src_name: &src_name,
            dest_name: &dest_name,
            modules: &plan.modules,
        },
        &mut txn,
    )?;
    let tests = rewrite::update_tests(&plan.destination, &dest_name.to_string(), &targets, &mut txn)?;
    let ignore = sanity::refresh_ignore(
        &plan.source,
        &plan.destination,
        &plan.modules,
        &plan.integration_tests,
        &mut txn,
    )?;
    super::commit(&mut txn)?;

    let mut committed = Vec::new();
    let dest_message = format!("Promote {} from {}", plan.modules.join(", "), src_name);
    if commit_all(&plan.destination, &dest_message)? {
        committed.push(plan.destination.clone());
    }
    let src_message = format!("Redirect {} to {}", plan.modules.join(", "), dest_name);
    if commit_all(&plan.source, &src_message)? {
        committed.push(plan.source.clone());
    }

    report::emit(
        &RunOutcome {
            changed: true,
            branch,
            src: src_name.to_string(),
            dest: dest_name.to_string(),
            export,
            apply,
            purge,
            modules,
            runtime,
            tests,
            ignore,
            committed,
        },
        json,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_collection_name_requires_both_fields() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("galaxy.yml"), "namespace: community\n").unwrap();

        let err = collection_name(temp.path()).unwrap_err();
        assert!(matches!(err, MigrateError::Malformed { .. }));
    }

    #[test]
    fn test_collection_name() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("galaxy.yml"),
            "namespace: amazon\nname: aws\nversion: 1.0.0\n",
        )
        .unwrap();

        assert_eq!(collection_name(temp.path()).unwrap().to_string(), "amazon.aws");
    }
}
