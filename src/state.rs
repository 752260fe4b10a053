use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::github::GithubApi;
use crate::rate_limit::{LoginRateLimiter, SubmissionRateLimiter};
use crate::registration::ProjectLocks;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub github: Arc<dyn GithubApi>,
    pub project_locks: ProjectLocks,
    pub submission_limiter: SubmissionRateLimiter,
    pub login_limiter: LoginRateLimiter,
}
