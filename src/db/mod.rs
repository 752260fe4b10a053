pub mod audit;
pub mod groups;
pub mod projects;
pub mod refresh_tokens;
pub mod users;

/// Name of the violated constraint, if `err` is a unique violation.
pub fn unique_violation(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            Some(db_err.constraint().unwrap_or_default().to_string())
        }
        _ => None,
    }
}
