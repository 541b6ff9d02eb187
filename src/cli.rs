use crate::steps;
use clap::{ArgAction, Parser, Subcommand};

/// Migrate Ansible modules, their tests and their history between collections.
#[derive(Parser, Debug)]
#[command(name = "collection-migrate", version, about)]
pub struct Cli {
    /// Print the step result as a single JSON object
    #[arg(long, global = true)]
    pub json: bool,

    /// Raise log verbosity (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read a collection's namespace and name from its galaxy.yml
    Identify(steps::identify::IdentifyArgs),

    /// Generate a unique migration branch name
    BranchName(steps::identify::BranchNameArgs),

    /// Rewrite history down to the migrated paths and export it as patches
    CreatePatches(steps::patches::CreatePatchesArgs),

    /// Apply a patch set with `git am --3way`
    ApplyPatches(steps::patches::ApplyPatchesArgs),

    /// Point migrated modules at their new collection
    UpdateModules(steps::modules::UpdateModulesArgs),

    /// Move action groups and redirects between meta/runtime.yml files
    UpdateRuntime(steps::modules::UpdateRuntimeArgs),

    /// Drop a collection from the `collections:` keyword of test targets
    UpdateTests(steps::modules::UpdateTestsArgs),

    /// Move sanity ignore entries for migrated paths
    RefreshIgnore(steps::modules::RefreshIgnoreArgs),

    /// Commit the removal of migrated modules from the source repository
    RemoveModules(steps::patches::RemoveModulesArgs),

    /// Open a pull request, or report the one that already exists
    CreatePr(steps::pr::CreatePrArgs),

    /// Run a whole migration described by a TOML plan
    Run(steps::run::RunArgs),

    /// Message filter invoked by git filter-branch
    #[command(hide = true)]
    MsgFilter(steps::filter::MsgFilterArgs),

    /// Index filter invoked by git filter-branch
    #[command(hide = true)]
    IndexFilter(steps::filter::IndexFilterArgs),
}
