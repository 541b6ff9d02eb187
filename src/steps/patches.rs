//! Git history steps: `create-patches`, `apply-patches` and `remove-modules`.

use super::Selection;
use crate::collection::CollectionName;
use crate::error::Result;
use crate::patch::filter::DEFAULT_ORIGIN_URL;
use crate::patch::{self, ApplyOutcome, ExportOutcome, ExportRequest};
use crate::plan::DEFAULT_UPSTREAM;
use crate::purge::{self, PurgeOutcome};
use crate::report::{self, Outcome, print_status};
use crate::verify::{check_git_available, check_work_tree, validate_branch_name, validate_selection};
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
pub struct CreatePatchesArgs {
    /// Repository to export history from
    #[arg(long, value_name = "DIR")]
    pub path: PathBuf,

    /// Branch to reset and rewrite
    #[arg(long)]
    pub branch: String,

    #[command(flatten)]
    pub selection: Selection,

    /// Collection the history comes from, named in every commit footer
    #[arg(long, value_name = "NAMESPACE.NAME")]
    pub collection_name: CollectionName,

    /// Reference the branch is reset from
    #[arg(long, default_value = DEFAULT_UPSTREAM)]
    pub upstream: String,

    /// Organisation URL the footer links commits under
    #[arg(long, default_value = DEFAULT_ORIGIN_URL)]
    pub origin_url: String,
}

#[derive(Parser, Debug, Clone)]
pub struct ApplyPatchesArgs {
    /// Repository to apply the patches to
    #[arg(long, value_name = "DIR")]
    pub path: PathBuf,

    /// Patch file (repeatable); applied in file name order
    #[arg(long = "patch", value_name = "FILE", required = true)]
    pub patches: Vec<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct RemoveModulesArgs {
    /// Repository to remove the migrated files from
    #[arg(long, value_name = "DIR")]
    pub path: PathBuf,

    /// Branch to recreate for the removal commit
    #[arg(long)]
    pub branch: String,

    #[command(flatten)]
    pub selection: Selection,

    /// Reference the branch is recreated from
    #[arg(long, default_value = DEFAULT_UPSTREAM)]
    pub upstream: String,
}

impl Outcome for ExportOutcome {
    fn print_human(&self) {
        print_status(
            !self.files.is_empty(),
            &format!(
                "Exported {} patches from {} commits on '{}'",
                self.files.len(),
                self.commits,
                self.branch
            ),
        );
        for file in &self.files {
            println!("   {}", file.display().to_string().dimmed());
        }
    }
}

impl Outcome for ApplyOutcome {
    fn print_human(&self) {
        print_status(self.changed, &self.msg);
    }
}

impl Outcome for PurgeOutcome {
    fn print_human(&self) {
        print_status(
            self.changed,
            &format!("Removed {} files on '{}'", self.removed.len(), self.branch),
        );
        for file in &self.removed {
            println!("   {} {}", "-".red(), file.dimmed());
        }
    }
}

pub fn create(args: CreatePatchesArgs, json: bool) -> Result<()> {
    validate_branch_name(&args.branch)?;
    validate_selection(&args.selection.modules, &args.selection.integration_tests)?;
    check_git_available()?;
    check_work_tree(&args.path)?;

    let origin = args.collection_name.to_string();
    let request = ExportRequest {
        repo: &args.path,
        branch: &args.branch,
        upstream: &args.upstream,
        modules: &args.selection.modules,
        integration_tests: &args.selection.integration_tests,
        origin: &origin,
        origin_url: &args.origin_url,
    };

    let outcome = patch::create_patches(&request, &std::env::current_exe()?)?;
    report::emit(&outcome, json)
}

pub fn apply(args: ApplyPatchesArgs, json: bool) -> Result<()> {
    check_git_available()?;
    check_work_tree(&args.path)?;

    let outcome = patch::apply_patches(&args.path, &args.patches)?;
    report::emit(&outcome, json)
}

pub fn remove(args: RemoveModulesArgs, json: bool) -> Result<()> {
    validate_branch_name(&args.branch)?;
    validate_selection(&args.selection.modules, &args.selection.integration_tests)?;
    check_git_available()?;
    check_work_tree(&args.path)?;

    let outcome = purge::remove_modules(
        &args.path,
        &args.branch,
        &args.upstream,
        &args.selection.modules,
        &args.selection.integration_tests,
    )?;
    report::emit(&outcome, json)
}
