use std::collections::HashSet;

use sqlx::PgPool;
use uuid::Uuid;

use super::{RegistrationError, ValidMember};
use crate::db;

pub async fn ensure_unregistered(
    pool: &PgPool,
    project_id: Uuid,
    members: &[ValidMember],
) -> Result<(), RegistrationError> {
    let registered = db::groups::registered_logins(pool, project_id).await?;
    match find_duplicate(&registered, members) {
        Some(member) => Err(RegistrationError::DuplicateMember(
            member.github_username.clone(),
        )),
        None => Ok(()),
    }
}

/// First proposed member whose login is already taken. `registered` holds
/// normalized logins.
pub fn find_duplicate<'m>(registered: &[String], members: &'m [ValidMember]) -> Option<&'m ValidMember> {
    let taken: HashSet<String> = registered.iter().map(|l| l.to_lowercase()).collect();
    members.iter().find(|m| taken.contains(&m.login))
}
