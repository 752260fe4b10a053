//! Student self-registration into project groups.
//!
//! [`register_group`] runs the whole flow: key check, input validation,
//! GitHub identity checks, duplicate detection, group naming, repository
//! creation, the database commit and finally the collaborator invitations.
//! Every step before the commit is fatal on failure and leaves no trace;
//! invitations happen after the commit and only report their failures.

pub mod duplicates;
pub mod gate;
pub mod identity;
pub mod locks;
pub mod naming;
pub mod provision;
pub mod validate;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::crypto;
use crate::db;
use crate::db::groups::NewMember;
use crate::middleware::audit;
use crate::models::{GroupWithMembers, Project};
use crate::state::SharedState;

pub use locks::ProjectLocks;
pub use provision::{InvitationOutcome, InvitationStatus};
pub use validate::{MemberInput, ValidMember};

#[derive(Debug, Clone, PartialEq)]
pub enum RegistrationError {
    NotFound,
    Forbidden,
    InvalidInput(String),
    ExternalIdentityNotFound(String),
    DuplicateMember(String),
    ProvisioningFailed(String),
    ExternalServiceError(String),
    PersistenceError(String),
}

impl RegistrationError {
    pub fn code(&self) -> &'static str {
        match self {
            RegistrationError::NotFound => "not_found",
            RegistrationError::Forbidden => "forbidden",
            RegistrationError::InvalidInput(_) => "invalid_input",
            RegistrationError::ExternalIdentityNotFound(_) => "external_identity_not_found",
            RegistrationError::DuplicateMember(_) => "duplicate_member",
            RegistrationError::ProvisioningFailed(_) => "provisioning_failed",
            RegistrationError::ExternalServiceError(_) => "external_service_error",
            RegistrationError::PersistenceError(_) => "persistence_error",
        }
    }

    /// The GitHub username the failure is about, if any.
    pub fn username(&self) -> Option<&str> {
        match self {
            RegistrationError::ExternalIdentityNotFound(u) | RegistrationError::DuplicateMember(u) => {
                Some(u.as_str())
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistrationError::NotFound => write!(f, "Project not found"),
            RegistrationError::Forbidden => write!(f, "Invalid project key"),
            RegistrationError::InvalidInput(msg) => write!(f, "{msg}"),
            RegistrationError::ExternalIdentityNotFound(u) => {
                write!(f, "GitHub user '{u}' does not exist")
            }
            RegistrationError::DuplicateMember(u) => {
                write!(f, "'{u}' is already registered in a group of this project")
            }
            RegistrationError::ProvisioningFailed(msg) => {
                write!(f, "Could not create the group repository: {msg}")
            }
            RegistrationError::ExternalServiceError(msg) => {
                write!(f, "GitHub is unavailable, please try again: {msg}")
            }
            RegistrationError::PersistenceError(msg) => write!(f, "Failed to save group: {msg}"),
        }
    }
}

impl std::error::Error for RegistrationError {}

impl From<sqlx::Error> for RegistrationError {
    fn from(err: sqlx::Error) -> Self {
        RegistrationError::PersistenceError(err.to_string())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisteredGroup {
    #[serde(flatten)]
    pub group: GroupWithMembers,
    pub invitations: Vec<InvitationOutcome>,
}

#[derive(Debug, Deserialize)]
pub struct RegistrationRequest {
    pub students: Vec<MemberInput>,
}

pub async fn register_group(
    state: &SharedState,
    project_id: Uuid,
    key: &str,
    input: &[MemberInput],
) -> Result<RegisteredGroup, RegistrationError> {
    let project = gate::open(&state.pool, project_id, key).await?;
    let members = validate::members(&project, input)?;

    let token = owner_github_token(state, &project).await?;
    let github = state.github.as_ref();

    identity::verify_all(github, &token, &members).await?;

    let guard = state.project_locks.acquire(project.id).await;

    duplicates::ensure_unregistered(&state.pool, project.id, &members).await?;
    let name = naming::resolve(&state.pool, github, &token, &project).await?;

    let description = format!("{} - {name}", project.name);
    let repo = provision::create_repository(github, &token, &project.github_org, &name, &description)
        .await?;

    let rows: Vec<NewMember<'_>> = members
        .iter()
        .map(|m| NewMember {
            full_name: &m.full_name,
            github_username: &m.github_username,
        })
        .collect();

    let group = match db::groups::create_with_members(
        &state.pool,
        project.id,
        &name,
        Some(&repo.html_url),
        &rows,
    )
    .await
    {
        Ok(group) => group,
        Err(err) => {
            tracing::warn!(
                project_id = %project.id,
                repo = %repo.full_name,
                "Group commit failed after repository creation, repository left in place: {err}"
            );
            return Err(commit_error(state, &project, &members, err).await);
        }
    };

    drop(guard);

    tracing::info!(
        project_id = %project.id,
        group_id = %group.group.id,
        name = %group.group.name,
        members = group.members.len(),
        "Group registered"
    );

    audit::log_event(
        &state.pool,
        None,
        Some(project.id),
        "group.created",
        "group",
        Some(group.group.id),
        Some(serde_json::json!({ "name": &group.group.name, "repo": &repo.full_name })),
    )
    .await;

    let invitations =
        provision::invite_members(github, &token, &project.github_org, &repo.name, &members).await;

    Ok(RegisteredGroup { group, invitations })
}

async fn owner_github_token(
    state: &SharedState,
    project: &Project,
) -> Result<String, RegistrationError> {
    let owner = db::users::find_by_id(&state.pool, project.owner_id)
        .await?
        .ok_or_else(|| RegistrationError::PersistenceError("Project owner missing".to_string()))?;

    let encrypted = owner.github_token_encrypted.ok_or_else(|| {
        RegistrationError::ExternalServiceError(
            "the project owner has not configured a GitHub token".to_string(),
        )
    })?;

    crypto::decrypt(&encrypted, &state.config.encryption_key)
        .map_err(RegistrationError::PersistenceError)
}

/// A unique violation on memberships means another process registered one of
/// the members between the duplicate check and the commit.
async fn commit_error(
    state: &SharedState,
    project: &Project,
    members: &[ValidMember],
    err: sqlx::Error,
) -> RegistrationError {
    match db::unique_violation(&err).as_deref() {
        Some("group_members_project_student_unique") => {
            let registered = db::groups::registered_logins(&state.pool, project.id)
                .await
                .unwrap_or_default();
            let username = duplicates::find_duplicate(&registered, members)
                .or_else(|| members.first())
                .map(|m| m.github_username.clone())
                .unwrap_or_default();
            RegistrationError::DuplicateMember(username)
        }
        _ => RegistrationError::from(err),
    }
}
