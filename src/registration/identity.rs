use super::{RegistrationError, ValidMember};
use crate::github::{GithubApi, GithubError};

/// Checks every member against GitHub, in input order. Stops at the first failure.
pub async fn verify_all(
    github: &dyn GithubApi,
    token: &str,
    members: &[ValidMember],
) -> Result<(), RegistrationError> {
    for member in members {
        match github.user_exists(token, &member.github_username).await {
            Ok(true) => {}
            Ok(false) => {
                return Err(RegistrationError::ExternalIdentityNotFound(
                    member.github_username.clone(),
                ));
            }
            Err(err) => return Err(external(err)),
        }
    }
    Ok(())
}

pub(crate) fn external(err: GithubError) -> RegistrationError {
    RegistrationError::ExternalServiceError(err.to_string())
}
