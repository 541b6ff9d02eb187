//! Hidden entry points for `git filter-branch`.
//!
//! `create-patches` passes this binary to filter-branch as its message and
//! index filters; these executors are what filter-branch ends up calling.

use crate::error::Result;
use crate::patch::filter::{DEFAULT_ORIGIN_URL, run_index_filter, run_msg_filter};
use clap::Parser;

#[derive(Parser, Debug, Clone)]
pub struct MsgFilterArgs {
    /// Collection the commit was originally merged in
    #[arg(long)]
    pub origin: String,

    #[arg(long, default_value = DEFAULT_ORIGIN_URL)]
    pub origin_url: String,
}

#[derive(Parser, Debug, Clone)]
pub struct IndexFilterArgs {
    /// Path prefix to keep (repeatable)
    #[arg(long = "keep", value_name = "PREFIX", required = true)]
    pub keep: Vec<String>,
}

pub fn msg_filter(args: MsgFilterArgs) -> Result<()> {
    run_msg_filter(&args.origin_url, &args.origin)
}

pub fn index_filter(args: IndexFilterArgs) -> Result<()> {
    run_index_filter(&args.keep).map(|_| ())
}
