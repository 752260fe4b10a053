pub mod auth;
pub mod csrf;
pub mod groups;
pub mod projects;
pub mod public;
pub mod users;

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Auth
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/refresh", post(auth::refresh))
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/csrf-token", get(csrf::issue))
        // Current user
        .route("/api/v1/users/me", get(users::me))
        .route("/api/v1/users/me/github-token", put(users::set_github_token))
        .route("/api/v1/users/me/github-orgs", get(users::github_orgs))
        // Projects
        .route("/api/v1/projects", get(projects::list).post(projects::create))
        .route(
            "/api/v1/projects/{id}",
            get(projects::get)
                .put(projects::update)
                .delete(projects::delete),
        )
        .route("/api/v1/projects/{id}/rotate-key", post(projects::rotate_key))
        .route("/api/v1/projects/{id}/groups", get(projects::groups))
        .route("/api/v1/projects/{id}/audit", get(projects::audit_log))
        // Groups
        .route("/api/v1/groups/{id}", delete(groups::delete))
}

/// Routes reachable with a project id and secret key, no account needed.
pub fn public_routes() -> Router<SharedState> {
    Router::new()
        .route("/api/v1/public/projects/{id}/{key}", get(public::project))
        .route(
            "/api/v1/public/projects/{id}/{key}/groups",
            get(public::groups).post(public::create_group),
        )
}
