pub mod auth;
pub mod config;
pub mod crypto;
pub mod db;
pub mod error;
pub mod github;
pub mod middleware;
pub mod models;
pub mod rate_limit;
pub mod registration;
pub mod routes;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, HeaderValue, Method, header};
use sqlx::PgPool;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::github::GithubApi;
use crate::rate_limit::{LoginRateLimiter, SubmissionRateLimiter};
use crate::registration::ProjectLocks;
use crate::state::{AppState, SharedState};

pub fn build_app(pool: PgPool, config: Config, github: Arc<dyn GithubApi>) -> (Router, SharedState) {
    let state: SharedState = Arc::new(AppState {
        pool,
        config,
        github,
        project_locks: ProjectLocks::new(),
        submission_limiter: SubmissionRateLimiter::new(),
        login_limiter: LoginRateLimiter::new(),
    });

    let app = Router::new()
        .merge(routes::api_routes())
        .merge(routes::public_routes())
        .route("/health", axum::routing::get(health))
        .layer(DefaultBodyLimit::max(state.config.max_body_size))
        .layer(cors_layer(&state.config))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    (app, state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Ignoring invalid CORS origin '{origin}': {e}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(auth::csrf::HEADER_NAME),
        ])
        .allow_credentials(true)
}

/// Periodically drops idle rate-limit windows and unheld project locks.
pub fn spawn_janitor(state: SharedState) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_secs(300));
        loop {
            tick.tick().await;
            state.submission_limiter.cleanup(Duration::from_secs(3600));
            state.login_limiter.cleanup(Duration::from_secs(3600));
            state.project_locks.cleanup();
            tracing::debug!("Janitor pass done");
        }
    })
}

async fn health() -> &'static str {
    "ok"
}
