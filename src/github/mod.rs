//! Talking to the code hosting service.

pub mod pulls;

pub use pulls::{DEFAULT_API_URL, GithubClient, Head, PullOutcome, PullRequest, classify};
