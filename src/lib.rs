#![doc = include_str!("../README.md")]

pub mod branch;
pub mod cli;
pub mod collection;
pub mod error;
pub mod fs;
pub mod git;
pub mod github;
pub mod meta;
pub mod patch;
pub mod plan;
pub mod purge;
pub mod report;
pub mod rewrite;
pub mod sanity;
pub mod steps;
pub mod verify;

pub use error::*;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Runs the parsed command line.
pub fn run(cli: cli::Cli) -> Result<()> {
    steps::execute(cli.command, cli.json)
}
