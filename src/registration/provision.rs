use serde::Serialize;

use super::identity::external;
use super::{RegistrationError, ValidMember};
use crate::github::{GithubApi, GithubError, Repository, MEMBER_PERMISSION};

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Invited,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct InvitationOutcome {
    pub github_username: String,
    pub status: InvitationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Creates the group's private repository. Timeouts count as an unavailable
/// service; every other failure as a provisioning failure.
pub async fn create_repository(
    github: &dyn GithubApi,
    token: &str,
    org: &str,
    name: &str,
    description: &str,
) -> Result<Repository, RegistrationError> {
    match github.create_repo(token, org, name, description).await {
        Ok(repo) => Ok(repo),
        Err(GithubError::Timeout) => Err(external(GithubError::Timeout)),
        Err(err) => Err(RegistrationError::ProvisioningFailed(err.to_string())),
    }
}

/// Invites every member. Failures are logged and reported, never propagated.
pub async fn invite_members(
    github: &dyn GithubApi,
    token: &str,
    org: &str,
    repo: &str,
    members: &[ValidMember],
) -> Vec<InvitationOutcome> {
    let mut outcomes = Vec::with_capacity(members.len());

    for member in members {
        let outcome = match github
            .add_collaborator(token, org, repo, &member.github_username, MEMBER_PERMISSION)
            .await
        {
            Ok(()) => InvitationOutcome {
                github_username: member.github_username.clone(),
                status: InvitationStatus::Invited,
                error: None,
            },
            Err(err) => {
                tracing::warn!(
                    "Failed to invite {} to {org}/{repo}: {err}",
                    member.github_username
                );
                InvitationOutcome {
                    github_username: member.github_username.clone(),
                    status: InvitationStatus::Failed,
                    error: Some(err.to_string()),
                }
            }
        };
        outcomes.push(outcome);
    }

    outcomes
}
