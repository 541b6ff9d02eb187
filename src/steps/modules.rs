//! File-rewriting steps: `update-modules`, `update-runtime`,
//! `update-tests` and `refresh-ignore`.
//!
//! All four stage their writes in one transaction, so `--dry-run` shows the
//! exact set of files a real run would touch.

use super::{Selection, commit};
use crate::collection::CollectionName;
use crate::error::Result;
use crate::fs::Transaction;
use crate::meta::{self, RuntimeRequest, RuntimeUpdate};
use crate::report::{self, Outcome, print_status};
use crate::rewrite::{self, DEST_IMPORT, ModulePatterns, SOURCE_IMPORT, TestsUpdate};
use crate::sanity::{self, IgnoreUpdate};
use crate::verify::{
    check_collection, check_modules_exist, validate_module_name, validate_selection,
    validate_target_name,
};
use clap::Parser;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug, Clone)]
pub struct UpdateModulesArgs {
    /// Collection holding the migrated modules
    #[arg(long, value_name = "DIR")]
    pub path: PathBuf,

    /// Module to rewrite (repeatable or comma-separated)
    #[arg(long = "module", value_name = "NAME", required = true, value_delimiter = ',')]
    pub modules: Vec<String>,

    /// Collection the modules come from
    #[arg(long, value_name = "NAMESPACE.NAME")]
    pub src_name: CollectionName,

    /// Collection the modules now belong to
    #[arg(long, value_name = "NAMESPACE.NAME")]
    pub dest_name: CollectionName,

    /// Import line to replace
    #[arg(long, default_value = SOURCE_IMPORT)]
    pub import_from: String,

    /// Replacement import line
    #[arg(long, default_value = DEST_IMPORT)]
    pub import_to: String,

    /// Preview changes without writing them
    #[arg(long, short = 'n')]
    pub dry_run: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct UpdateRuntimeArgs {
    /// Source collection directory
    #[arg(long, value_name = "DIR")]
    pub src: PathBuf,

    /// Destination collection directory
    #[arg(long, value_name = "DIR")]
    pub dest: PathBuf,

    /// Migrated module (repeatable or comma-separated)
    #[arg(long = "module", value_name = "NAME", required = true, value_delimiter = ',')]
    pub modules: Vec<String>,

    #[arg(long, value_name = "NAMESPACE.NAME")]
    pub src_name: CollectionName,

    #[arg(long, value_name = "NAMESPACE.NAME")]
    pub dest_name: CollectionName,

    /// Preview changes without writing them
    #[arg(long, short = 'n')]
    pub dry_run: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct UpdateTestsArgs {
    /// Collection holding the test targets
    #[arg(long, value_name = "DIR")]
    pub collection_path: PathBuf,

    /// Collection to drop from `collections:` lists
    #[arg(long, value_name = "NAMESPACE.NAME")]
    pub collection_name: CollectionName,

    /// Integration test target (repeatable or comma-separated)
    #[arg(long = "target", value_name = "TARGET", required = true, value_delimiter = ',')]
    pub targets: Vec<String>,

    /// Preview changes without writing them
    #[arg(long, short = 'n')]
    pub dry_run: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct RefreshIgnoreArgs {
    /// Source collection directory
    #[arg(long, value_name = "DIR")]
    pub src: PathBuf,

    /// Destination collection directory
    #[arg(long, value_name = "DIR")]
    pub dest: PathBuf,

    #[command(flatten)]
    pub selection: Selection,

    /// Preview changes without writing them
    #[arg(long, short = 'n')]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModulesUpdate {
    pub changed: bool,
    pub modules: Vec<String>,
}

impl Outcome for ModulesUpdate {
    fn print_human(&self) {
        let what = if self.modules.is_empty() {
            "All modules already up to date".to_string()
        } else {
            format!("Updated modules: {}", self.modules.join(", "))
        };
        print_status(self.changed, &what);
    }
}

impl Outcome for RuntimeUpdate {
    fn print_human(&self) {
        let what = if self.merge.moved.is_empty() {
            format!("No '{}' action group entries to move", self.merge.action_group)
        } else {
            format!(
                "Moved to action group '{}': {}",
                self.merge.action_group,
                self.merge.moved.join(", ")
            )
        };
        print_status(self.changed, &what);
        if !self.merge.redirects.is_empty() {
            println!("   redirects: {}", self.merge.redirects.join(", "));
        }
    }
}

impl Outcome for TestsUpdate {
    fn print_human(&self) {
        print_status(
            self.changed,
            &format!("{} test files updated", self.files.len()),
        );
    }
}

impl Outcome for IgnoreUpdate {
    fn print_human(&self) {
        let what = if self.changed_versions.is_empty() {
            "No ignore entries to move".to_string()
        } else {
            format!("Moved ignore entries for {}", self.changed_versions.join(", "))
        };
        print_status(self.changed, &what);
    }
}

/// Prints the outcome, then the staged files unless printing JSON.
fn finish<T: Outcome>(outcome: &T, txn: &Transaction, root: &Path, json: bool) -> Result<()> {
    report::emit(outcome, json)?;
    if !json {
        txn.print_summary(root);
    }
    Ok(())
}

fn cwd() -> PathBuf {
    std::env::current_dir().unwrap_or_default()
}

pub fn update_modules(args: UpdateModulesArgs, json: bool) -> Result<()> {
    for module in &args.modules {
        validate_module_name(module)?;
    }
    check_modules_exist(&args.path, &args.modules)?;

    let patterns = ModulePatterns::new(
        &args.src_name.to_string(),
        &args.dest_name.to_string(),
        &args.import_from,
        &args.import_to,
    )?;

    let mut txn = Transaction::new(args.dry_run);
    let modules = rewrite::update_modules(&args.path, &args.modules, &patterns, &mut txn)?;
    commit(&mut txn)?;

    let outcome = ModulesUpdate {
        changed: !modules.is_empty(),
        modules,
    };
    finish(&outcome, &txn, &args.path, json)
}

pub fn update_runtime(args: UpdateRuntimeArgs, json: bool) -> Result<()> {
    for module in &args.modules {
        validate_module_name(module)?;
    }
    check_collection(&args.src)?;
    check_collection(&args.dest)?;

    let mut txn = Transaction::new(args.dry_run);
    let outcome = meta::update_runtime(
        &RuntimeRequest {
            src: &args.src,
            dest: &args.dest,
            src_name: &args.src_name,
            dest_name: &args.dest_name,
            modules: &args.modules,
        },
        &mut txn,
    )?;
    commit(&mut txn)?;

    finish(&outcome, &txn, &cwd(), json)
}

pub fn update_tests(args: UpdateTestsArgs, json: bool) -> Result<()> {
    for target in &args.targets {
        validate_target_name(target)?;
    }

    let mut txn = Transaction::new(args.dry_run);
    let outcome = rewrite::update_tests(
        &args.collection_path,
        &args.collection_name.to_string(),
        &args.targets,
        &mut txn,
    )?;
    commit(&mut txn)?;

    finish(&outcome, &txn, &args.collection_path, json)
}

pub fn refresh_ignore(args: RefreshIgnoreArgs, json: bool) -> Result<()> {
    validate_selection(&args.selection.modules, &args.selection.integration_tests)?;

    let mut txn = Transaction::new(args.dry_run);
    let outcome = sanity::refresh_ignore(
        &args.src,
        &args.dest,
        &args.selection.modules,
        &args.selection.integration_tests,
        &mut txn,
    )?;
    commit(&mut txn)?;

    finish(&outcome, &txn, &cwd(), json)
}
