use std::sync::LazyLock;

use regex::Regex;
use sqlx::PgPool;

use super::identity::external;
use super::RegistrationError;
use crate::db;
use crate::github::GithubApi;
use crate::models::Project;

/// Token replaced by the group ordinal in a naming template.
pub const PLACEHOLDER: &str = "XX";

const MAX_REPO_NAME_LEN: usize = 100;

static REPO_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._-]+$").expect("valid regex"));

/// Whether GitHub would keep `name` as is for a repository or organization.
/// Anything else is rewritten by GitHub and breaks the collision probe.
pub fn is_repo_name(name: &str) -> bool {
    name.len() <= MAX_REPO_NAME_LEN && REPO_NAME.is_match(name) && name != "." && name != ".."
}

/// Name for the group that follows `existing` groups.
pub fn ordinal_name(template: &str, existing: i64) -> String {
    let ordinal = format!("{:02}", existing + 1);
    if template.contains(PLACEHOLDER) {
        template.replacen(PLACEHOLDER, &ordinal, 1)
    } else {
        format!("{template}-{ordinal}")
    }
}

pub fn disambiguate(name: &str) -> String {
    format!("{name}-2")
}

/// Computes the next group name. If the name is already used, by a group of
/// the project or by a repository in the organization, `-2` is appended once.
pub async fn resolve(
    pool: &PgPool,
    github: &dyn GithubApi,
    token: &str,
    project: &Project,
) -> Result<String, RegistrationError> {
    let existing = db::groups::count_by_project(pool, project.id).await?;
    let name = ordinal_name(&project.group_convention, existing);

    let taken = if db::groups::name_exists(pool, project.id, &name).await? {
        true
    } else {
        github
            .repo_exists(token, &project.github_org, &name)
            .await
            .map_err(external)?
    };

    if taken {
        let fallback = disambiguate(&name);
        tracing::debug!("Group name {name} is taken, using {fallback}");
        Ok(fallback)
    } else {
        Ok(name)
    }
}
