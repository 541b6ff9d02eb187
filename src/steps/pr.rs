//! `create-pr`: open a pull request for the migration branch.

use crate::error::Result;
use crate::github::{DEFAULT_API_URL, GithubClient, Head, PullOutcome, PullRequest};
use crate::report::{self, Outcome, print_status};
use clap::Parser;
use colored::Colorize;

#[derive(Parser, Debug, Clone)]
pub struct CreatePrArgs {
    /// Target repository as `owner/name`
    #[arg(long, value_name = "OWNER/NAME")]
    pub repository: String,

    /// Branch the pull request merges into
    #[arg(long, default_value = "main")]
    pub base_branch: String,

    /// Branch of the target repository holding the changes
    #[arg(long)]
    pub head_branch: Option<String>,

    /// Owner of the fork holding the changes
    #[arg(long, requires = "fork_branch")]
    pub fork_owner: Option<String>,

    /// Branch of the fork holding the changes
    #[arg(long, requires = "fork_owner")]
    pub fork_branch: Option<String>,

    #[arg(long)]
    pub title: String,

    #[arg(long, default_value = "")]
    pub body: String,

    /// API token with pull request write access
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: String,

    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,
}

impl Outcome for PullOutcome {
    fn print_human(&self) {
        match (&self.url, &self.msg) {
            (Some(url), _) => {
                let number = self.number.map(|n| format!("#{n} ")).unwrap_or_default();
                print_status(true, &format!("Opened pull request {}{}", number, url.cyan()));
            }
            (None, Some(msg)) => print_status(false, msg),
            (None, None) => print_status(self.changed, "No pull request opened"),
        }
    }
}

pub fn execute(args: CreatePrArgs, json: bool) -> Result<()> {
    let head = Head::from_parts(args.head_branch, args.fork_owner, args.fork_branch)?;
    let client = GithubClient::new(&args.api_url, &args.token)?;

    let outcome = client.create_pull(&PullRequest {
        repository: args.repository,
        base: args.base_branch,
        head,
        title: args.title,
        body: args.body,
    })?;
    report::emit(&outcome, json)
}
