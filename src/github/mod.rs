//! GitHub capability used by the registration workflow and the instructor
//! organization listing.
//!
//! Everything goes through [`GithubApi`] so the HTTP client can be swapped
//! for a stub in tests.

pub mod client;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use client::GithubClient;

/// Permission granted to invited group members.
pub const MEMBER_PERMISSION: &str = "push";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Repository {
    pub name: String,
    pub full_name: String,
    pub html_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GithubError {
    /// The call did not complete within the configured timeout.
    Timeout,
    /// GitHub answered with a non-success status.
    Status { status: u16, message: String },
    /// Connection-level failure.
    Transport(String),
    /// The response body did not have the expected shape.
    Decode(String),
}

impl std::fmt::Display for GithubError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GithubError::Timeout => write!(f, "GitHub request timed out"),
            GithubError::Status { status, message } => {
                write!(f, "GitHub returned {status}: {message}")
            }
            GithubError::Transport(msg) => write!(f, "GitHub request failed: {msg}"),
            GithubError::Decode(msg) => write!(f, "Unexpected GitHub response: {msg}"),
        }
    }
}

impl std::error::Error for GithubError {}

#[async_trait]
pub trait GithubApi: Send + Sync {
    /// `Ok(false)` only for a definite not-found answer.
    async fn user_exists(&self, token: &str, username: &str) -> Result<bool, GithubError>;

    /// Logins of the organizations the token's user belongs to.
    async fn list_orgs(&self, token: &str) -> Result<Vec<String>, GithubError>;

    async fn repo_exists(&self, token: &str, org: &str, name: &str) -> Result<bool, GithubError>;

    /// Creates a private repository in `org`.
    async fn create_repo(
        &self,
        token: &str,
        org: &str,
        name: &str,
        description: &str,
    ) -> Result<Repository, GithubError>;

    async fn add_collaborator(
        &self,
        token: &str,
        org: &str,
        repo: &str,
        username: &str,
        permission: &str,
    ) -> Result<(), GithubError>;
}
