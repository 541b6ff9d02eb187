//! Opening pull requests through the GitHub REST API.

use crate::error::{MigrateError, Result};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
const API_VERSION: &str = "2022-11-28";
const ALREADY_EXISTS: &str = "A pull request already exists";

/// Where the proposed changes live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Head {
    /// A branch of the target repository.
    Branch(String),
    /// A branch of a fork, referenced as `owner:branch`.
    Fork { owner: String, branch: String },
}

impl Head {
    /// Picks the head from the flags; an explicit branch wins over a fork.
    pub fn from_parts(
        head_branch: Option<String>,
        fork_owner: Option<String>,
        fork_branch: Option<String>,
    ) -> Result<Self> {
        match (head_branch, fork_owner, fork_branch) {
            (Some(branch), _, _) => Ok(Head::Branch(branch)),
            (None, Some(owner), Some(branch)) => Ok(Head::Fork { owner, branch }),
            _ => Err(MigrateError::InvalidArguments(
                "at least one of --head-branch or --fork-owner/--fork-branch should be specified"
                    .into(),
            )),
        }
    }

    pub fn reference(&self) -> String {
        match self {
            Head::Branch(branch) => branch.clone(),
            Head::Fork { owner, branch } => format!("{owner}:{branch}"),
        }
    }
}

/// A pull request to open on `repository` (`owner/name`).
#[derive(Debug, Clone)]
pub struct PullRequest {
    pub repository: String,
    pub base: String,
    pub head: Head,
    pub title: String,
    pub body: String,
}

#[derive(Serialize)]
struct CreatePull<'a> {
    title: &'a str,
    body: &'a str,
    base: &'a str,
    head: String,
}

#[derive(Deserialize)]
struct CreatedPull {
    html_url: String,
    id: u64,
    number: u64,
    #[serde(default)]
    commits: Option<u64>,
    #[serde(default)]
    changed_files: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PullOutcome {
    pub changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commits: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changed_files: Option<u64>,
    /// Host message when nothing was created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}

/// Turns an API answer into an outcome.
///
/// A 422 saying the pull request already exists is a successful no-op;
/// every other non-success status is an `Api` error.
pub fn classify(status: StatusCode, body: &str) -> Result<PullOutcome> {
    if status.is_success() {
        let created: CreatedPull = serde_json::from_str(body)?;
        return Ok(PullOutcome {
            changed: true,
            url: Some(created.html_url),
            id: Some(created.id),
            number: Some(created.number),
            commits: created.commits,
            changed_files: created.changed_files,
            msg: None,
        });
    }

    let error: ApiErrorBody = serde_json::from_str(body).unwrap_or_default();

    if status == StatusCode::UNPROCESSABLE_ENTITY {
        let existing = error
            .errors
            .iter()
            .filter_map(|e| e.get("message").and_then(|m| m.as_str()))
            .find(|m| m.contains(ALREADY_EXISTS));
        if let Some(msg) = existing {
            return Ok(PullOutcome {
                msg: Some(msg.to_string()),
                ..PullOutcome::default()
            });
        }
    }

    let message = if error.message.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string()
    } else {
        error.message
    };
    Err(MigrateError::Api {
        status: status.as_u16(),
        message,
        errors: error.errors,
    })
}

/// Blocking client bound to one API root and token.
pub struct GithubClient {
    client: Client,
    api_url: String,
    token: String,
}

impl GithubClient {
    pub fn new(api_url: &str, token: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(format!("collection-migrate/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    /// `POST /repos/{owner}/{repo}/pulls`
    pub fn create_pull(&self, request: &PullRequest) -> Result<PullOutcome> {
        let (owner, repo) = request
            .repository
            .split_once('/')
            .filter(|(o, r)| !o.is_empty() && !r.is_empty() && !r.contains('/'))
            .ok_or_else(|| {
                MigrateError::InvalidArguments(format!(
                    "repository '{}' must be '<owner>/<name>'",
                    request.repository
                ))
            })?;

        let url = format!("{}/repos/{}/{}/pulls", self.api_url, owner, repo);
        let head = request.head.reference();
        log::info!("Opening pull request {} -> {}:{}", head, request.repository, request.base);

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .json(&CreatePull {
                title: &request.title,
                body: &request.body,
                base: &request.base,
                head,
            })
            .send()?;

        let status = resp.status();
        let body = resp.text()?;
        log::debug!("{} answered {}", url, status);
        classify(status, &body)
    }
}
