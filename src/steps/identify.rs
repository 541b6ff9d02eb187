//! `identify` and `branch-name`: the two steps without side effects.

use crate::branch::{self, DEFAULT_PREFIX};
use crate::collection;
use crate::error::Result;
use crate::report::{self, Outcome};
use crate::verify::validate_branch_name;
use clap::Parser;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
pub struct IdentifyArgs {
    /// Collection directory containing galaxy.yml
    #[arg(long, value_name = "DIR")]
    pub path: PathBuf,
}

#[derive(Parser, Debug, Clone)]
pub struct BranchNameArgs {
    /// Branch name prefix
    #[arg(long, default_value = DEFAULT_PREFIX)]
    pub prefix: String,
}

#[derive(Debug, Serialize)]
pub struct Identity {
    pub changed: bool,
    pub namespace: Option<String>,
    pub name: Option<String>,
}

impl Outcome for Identity {
    fn print_human(&self) {
        let show = |v: &Option<String>| v.clone().unwrap_or_else(|| "~".to_string());
        println!("{} {}", "namespace:".bold(), show(&self.namespace));
        println!("{} {}", "name:".bold(), show(&self.name));
    }
}

#[derive(Debug, Serialize)]
pub struct BranchName {
    pub changed: bool,
    pub branch: String,
}

impl Outcome for BranchName {
    fn print_human(&self) {
        println!("{}", self.branch);
    }
}

pub fn identify(args: IdentifyArgs, json: bool) -> Result<()> {
    let galaxy = collection::identify(&args.path)?;
    if galaxy.collection_name().is_none() {
        log::warn!("{} does not name both namespace and name", args.path.display());
    }

    report::emit(
        &Identity {
            changed: false,
            namespace: galaxy.namespace,
            name: galaxy.name,
        },
        json,
    )
}

pub fn branch_name(args: BranchNameArgs, json: bool) -> Result<()> {
    let branch = branch::generate(&args.prefix);
    validate_branch_name(&branch)?;

    report::emit(
        &BranchName {
            changed: false,
            branch,
        },
        json,
    )
}
