use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use uuid::Uuid;

use crate::db;
use crate::error::AppError;
use crate::middleware::client_ip;
use crate::models::{GroupWithMembers, PublicProject};
use crate::registration::{self, gate, RegisteredGroup, RegistrationRequest};
use crate::state::SharedState;

pub async fn project(
    State(state): State<SharedState>,
    Path((id, key)): Path<(Uuid, String)>,
) -> Result<Json<PublicProject>, AppError> {
    let project = gate::open(&state.pool, id, &key).await?;
    let groups = db::groups::list_with_members(&state.pool, project.id).await?;
    Ok(Json(PublicProject::new(project, groups)))
}

pub async fn groups(
    State(state): State<SharedState>,
    Path((id, key)): Path<(Uuid, String)>,
) -> Result<Json<Vec<GroupWithMembers>>, AppError> {
    let project = gate::open(&state.pool, id, &key).await?;
    let groups = db::groups::list_with_members(&state.pool, project.id).await?;
    Ok(Json(groups))
}

pub async fn create_group(
    State(state): State<SharedState>,
    Path((id, key)): Path<(Uuid, String)>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<RegistrationRequest>,
) -> Result<(StatusCode, Json<RegisteredGroup>), AppError> {
    let ip = client_ip::resolve(&headers, addr.ip(), &state.config.trusted_proxies);
    if let Err(retry_after) = state.submission_limiter.check(
        id,
        ip,
        state.config.submission_limit,
        state.config.submission_window_secs,
    ) {
        return Err(AppError::RateLimited(format!(
            "Too many submissions. Retry after {retry_after}s"
        )));
    }

    let group = registration::register_group(&state, id, &key, &req.students).await?;
    Ok((StatusCode::CREATED, Json(group)))
}
