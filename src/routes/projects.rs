use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::db::projects::ProjectFields;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::{AuditEvent, GroupWithMembers, Project, ProjectView};
use crate::registration::naming::{self, PLACEHOLDER};
use crate::state::SharedState;

const MAX_GROUP_SIZE: i32 = 50;
const DEFAULT_CONVENTION: &str = "Groupe-XX";

#[derive(Deserialize)]
pub struct ProjectRequest {
    pub name: String,
    #[serde(alias = "githubOrg")]
    pub github_org: String,
    #[serde(default = "one", alias = "minStudents")]
    pub min_students: i32,
    #[serde(default = "one", alias = "maxStudents")]
    pub max_students: i32,
    #[serde(default, alias = "groupConvention")]
    pub group_convention: Option<String>,
}

fn one() -> i32 {
    1
}

#[derive(Deserialize)]
pub struct AuditQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ProjectRequest {
    fn fields(&self) -> Result<ProjectFields<'_>, AppError> {
        let name = self.name.trim();
        let github_org = self.github_org.trim();
        let group_convention = self
            .group_convention
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CONVENTION);

        if name.is_empty() || name.chars().count() > 200 {
            return Err(AppError::BadRequest(
                "Name must be between 1 and 200 characters".to_string(),
            ));
        }
        if github_org.is_empty() {
            return Err(AppError::BadRequest("GitHub organization is required".to_string()));
        }
        if !naming::is_repo_name(github_org) {
            return Err(AppError::BadRequest(format!(
                "'{github_org}' is not a valid GitHub organization"
            )));
        }
        if self.min_students < 1 || self.min_students > self.max_students {
            return Err(AppError::BadRequest(
                "Group size bounds must satisfy 1 <= min <= max".to_string(),
            ));
        }
        if self.max_students > MAX_GROUP_SIZE {
            return Err(AppError::BadRequest(format!(
                "Groups cannot have more than {MAX_GROUP_SIZE} students"
            )));
        }
        if !group_convention.contains(PLACEHOLDER) {
            return Err(AppError::BadRequest(format!(
                "Group naming convention must contain \"{PLACEHOLDER}\""
            )));
        }
        if !naming::is_repo_name(group_convention) {
            return Err(AppError::BadRequest(
                "Group naming convention may only use letters, digits, '.', '-' and '_'"
                    .to_string(),
            ));
        }

        Ok(ProjectFields {
            name,
            github_org,
            min_students: self.min_students,
            max_students: self.max_students,
            group_convention,
        })
    }
}

fn generate_secret_key() -> String {
    let bytes: [u8; 16] = rand::random();
    hex::encode(bytes)
}

fn view(state: &SharedState, project: Project) -> ProjectView {
    let share_url = state.config.share_url(project.id, &project.secret_key);
    ProjectView { project, share_url }
}

async fn find_owned(state: &SharedState, auth: &AuthUser, id: Uuid) -> Result<Project, AppError> {
    db::projects::find_by_id(&state.pool, id, auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Vec<ProjectView>>, AppError> {
    let projects = db::projects::list(&state.pool, auth.user_id).await?;
    Ok(Json(projects.into_iter().map(|p| view(&state, p)).collect()))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<ProjectRequest>,
) -> Result<Json<ProjectView>, AppError> {
    let fields = req.fields()?;
    let project =
        db::projects::create(&state.pool, auth.user_id, &fields, &generate_secret_key()).await?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        Some(project.id),
        "project.created",
        "project",
        Some(project.id),
        None,
    )
    .await;

    Ok(Json(view(&state, project)))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProjectView>, AppError> {
    let project = find_owned(&state, &auth, id).await?;
    Ok(Json(view(&state, project)))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ProjectRequest>,
) -> Result<Json<ProjectView>, AppError> {
    let fields = req.fields()?;

    let project = db::projects::update(&state.pool, id, auth.user_id, &fields)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound("Project not found".to_string()),
            _ => AppError::Database(e),
        })?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        Some(project.id),
        "project.updated",
        "project",
        Some(project.id),
        None,
    )
    .await;

    Ok(Json(view(&state, project)))
}

pub async fn rotate_key(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProjectView>, AppError> {
    let project = db::projects::set_secret_key(&state.pool, id, auth.user_id, &generate_secret_key())
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound("Project not found".to_string()),
            _ => AppError::Database(e),
        })?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        Some(project.id),
        "project.key_rotated",
        "project",
        Some(project.id),
        None,
    )
    .await;

    Ok(Json(view(&state, project)))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !db::projects::delete(&state.pool, id, auth.user_id).await? {
        return Err(AppError::NotFound("Project not found".to_string()));
    }

    // The project row is gone, so the event is not linked to it.
    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        None,
        "project.deleted",
        "project",
        Some(id),
        None,
    )
    .await;

    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}

pub async fn groups(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<GroupWithMembers>>, AppError> {
    let project = find_owned(&state, &auth, id).await?;
    let groups = db::groups::list_with_members(&state.pool, project.id).await?;
    Ok(Json(groups))
}

pub async fn audit_log(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Query(query): Query<AuditQuery>,
) -> Result<Json<Vec<AuditEvent>>, AppError> {
    let project = find_owned(&state, &auth, id).await?;
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let offset = query.offset.unwrap_or(0).max(0);
    let events = db::audit::list_for_project(&state.pool, project.id, limit, offset).await?;
    Ok(Json(events))
}
