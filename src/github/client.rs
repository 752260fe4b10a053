use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;

use super::{GithubApi, GithubError, Repository};
use crate::config::GithubConfig;

const API_VERSION: &str = "2022-11-28";

/// reqwest-backed GitHub REST client.
pub struct GithubClient {
    client: reqwest::Client,
    api_url: String,
}

#[derive(Deserialize)]
struct OrgEntry {
    login: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl GithubClient {
    pub fn new(config: &GithubConfig) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("groupdesk/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| format!("Failed to build GitHub client: {e}"))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_url)
    }

    fn request(&self, method: reqwest::Method, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.url(path))
            .bearer_auth(token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    /// Sends a GET and reports whether the resource exists.
    async fn probe(&self, path: &str, token: &str) -> Result<bool, GithubError> {
        let resp = self
            .request(reqwest::Method::GET, path, token)
            .send()
            .await
            .map_err(transport_error)?;

        match resp.status() {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(status_error(resp).await),
        }
    }
}

fn transport_error(err: reqwest::Error) -> GithubError {
    if err.is_timeout() {
        GithubError::Timeout
    } else {
        GithubError::Transport(err.to_string())
    }
}

async fn status_error(resp: reqwest::Response) -> GithubError {
    let status = resp.status().as_u16();
    let message = resp
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| "no message".to_string());
    GithubError::Status { status, message }
}

#[async_trait]
impl GithubApi for GithubClient {
    async fn user_exists(&self, token: &str, username: &str) -> Result<bool, GithubError> {
        self.probe(&format!("/users/{username}"), token).await
    }

    async fn list_orgs(&self, token: &str) -> Result<Vec<String>, GithubError> {
        let resp = self
            .request(reqwest::Method::GET, "/user/orgs?per_page=100", token)
            .send()
            .await
            .map_err(transport_error)?;

        if !resp.status().is_success() {
            return Err(status_error(resp).await);
        }

        let orgs: Vec<OrgEntry> = resp
            .json()
            .await
            .map_err(|e| GithubError::Decode(e.to_string()))?;
        Ok(orgs.into_iter().map(|o| o.login).collect())
    }

    async fn repo_exists(&self, token: &str, org: &str, name: &str) -> Result<bool, GithubError> {
        self.probe(&format!("/repos/{org}/{name}"), token).await
    }

    async fn create_repo(
        &self,
        token: &str,
        org: &str,
        name: &str,
        description: &str,
    ) -> Result<Repository, GithubError> {
        let resp = self
            .request(reqwest::Method::POST, &format!("/orgs/{org}/repos"), token)
            .json(&json!({
                "name": name,
                "description": description,
                "private": true,
            }))
            .send()
            .await
            .map_err(transport_error)?;

        if !resp.status().is_success() {
            return Err(status_error(resp).await);
        }

        resp.json::<Repository>()
            .await
            .map_err(|e| GithubError::Decode(e.to_string()))
    }

    async fn add_collaborator(
        &self,
        token: &str,
        org: &str,
        repo: &str,
        username: &str,
        permission: &str,
    ) -> Result<(), GithubError> {
        let resp = self
            .request(
                reqwest::Method::PUT,
                &format!("/repos/{org}/{repo}/collaborators/{username}"),
                token,
            )
            .json(&json!({ "permission": permission }))
            .send()
            .await
            .map_err(transport_error)?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(status_error(resp).await)
        }
    }
}
