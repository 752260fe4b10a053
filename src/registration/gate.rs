use sqlx::PgPool;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use super::RegistrationError;
use crate::db;
use crate::models::Project;

/// Loads the project and checks the candidate key against its secret key.
pub async fn open(pool: &PgPool, project_id: Uuid, key: &str) -> Result<Project, RegistrationError> {
    let project = db::projects::find_by_id_unscoped(pool, project_id)
        .await?
        .ok_or(RegistrationError::NotFound)?;

    check_key(&project, key)?;
    Ok(project)
}

pub fn check_key(project: &Project, key: &str) -> Result<(), RegistrationError> {
    let matches: bool = project.secret_key.as_bytes().ct_eq(key.as_bytes()).into();
    if matches && !key.is_empty() {
        Ok(())
    } else {
        Err(RegistrationError::Forbidden)
    }
}
