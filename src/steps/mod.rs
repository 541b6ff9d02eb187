//! One executor per subcommand.
//!
//! Executors validate their arguments, call into the library, and print
//! the outcome. File-rewriting steps stage every write in a
//! [`Transaction`] and commit it once all files are staged.

pub mod filter;
pub mod identify;
pub mod modules;
pub mod patches;
pub mod pr;
pub mod run;

use crate::cli::Command;
use crate::error::Result;
use crate::fs::Transaction;
use clap::Args;

/// Modules and integration test targets selected for migration.
#[derive(Args, Debug, Clone)]
pub struct Selection {
    /// Module to migrate (repeatable or comma-separated)
    #[arg(long = "module", value_name = "NAME", required = true, value_delimiter = ',')]
    pub modules: Vec<String>,

    /// Additional integration test target to migrate (repeatable or comma-separated)
    #[arg(long = "integration-test", value_name = "TARGET", value_delimiter = ',')]
    pub integration_tests: Vec<String>,
}

pub fn execute(command: Command, json: bool) -> Result<()> {
    match command {
        Command::Identify(args) => identify::identify(args, json),
        Command::BranchName(args) => identify::branch_name(args, json),
        Command::CreatePatches(args) => patches::create(args, json),
        Command::ApplyPatches(args) => patches::apply(args, json),
        Command::RemoveModules(args) => patches::remove(args, json),
        Command::UpdateModules(args) => modules::update_modules(args, json),
        Command::UpdateRuntime(args) => modules::update_runtime(args, json),
        Command::UpdateTests(args) => modules::update_tests(args, json),
        Command::RefreshIgnore(args) => modules::refresh_ignore(args, json),
        Command::CreatePr(args) => pr::execute(args, json),
        Command::Run(args) => run::execute(args, json),
        Command::MsgFilter(args) => filter::msg_filter(args),
        Command::IndexFilter(args) => filter::index_filter(args),
    }
}

/// Commits staged writes, logging what went wrong on failure.
pub(crate) fn commit(txn: &mut Transaction) -> Result<()> {
    if let Err(e) = txn.commit() {
        log::error!("Failed to write changes: {}", e);
        log::info!("Files written before the failure were restored");
        return Err(e);
    }
    Ok(())
}
