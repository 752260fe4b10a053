use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::middleware::audit;
use crate::state::SharedState;

/// Removes the group and its memberships. The GitHub repository is kept.
pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let group = db::groups::find_owned(&state.pool, id, auth.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Group not found".to_string()))?;

    db::groups::delete(&state.pool, group.id).await?;

    audit::log_event(
        &state.pool,
        Some(auth.user_id),
        Some(group.project_id),
        "group.deleted",
        "group",
        Some(group.id),
        Some(serde_json::json!({ "name": group.name })),
    )
    .await;

    Ok(Json(serde_json::json!({ "message": "Deleted" })))
}
