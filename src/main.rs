//! Binary entry point for `collection-migrate`.

use clap::Parser;
use collection_migrate::cli::Cli;
use collection_migrate::report;
use env_logger::Env;
use std::process;

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    let json = cli.json;
    if let Err(e) = collection_migrate::run(cli) {
        report::print_failure(&e, json);
        process::exit(1);
    }
}
