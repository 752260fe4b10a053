use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::crypto;
use crate::db;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::User;
use crate::state::SharedState;

#[derive(Serialize)]
pub struct Profile {
    pub id: Uuid,
    pub username: String,
    pub has_github_token: bool,
}

#[derive(Deserialize)]
pub struct GithubTokenRequest {
    /// `None` or blank removes the stored token.
    pub token: Option<String>,
}

#[derive(Serialize)]
pub struct OrganizationsResponse {
    pub organizations: Vec<String>,
}

async fn current_user(state: &SharedState, auth: &AuthUser) -> Result<User, AppError> {
    db::users::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))
}

pub async fn me(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Profile>, AppError> {
    let user = current_user(&state, &auth).await?;
    Ok(Json(Profile {
        id: user.id,
        username: user.username,
        has_github_token: user.github_token_encrypted.is_some(),
    }))
}

pub async fn set_github_token(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<GithubTokenRequest>,
) -> Result<Json<Profile>, AppError> {
    let token = req
        .token
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let encrypted = token
        .map(|t| crypto::encrypt(t, &state.config.encryption_key))
        .transpose()
        .map_err(AppError::Internal)?;

    db::users::set_github_token(&state.pool, auth.user_id, encrypted.as_deref()).await?;

    let action = if encrypted.is_some() {
        "user.github_token_set"
    } else {
        "user.github_token_removed"
    };
    audit::log_event(&state.pool, Some(auth.user_id), None, action, "user", Some(auth.user_id), None)
        .await;

    Ok(Json(Profile {
        id: auth.user_id,
        username: auth.username,
        has_github_token: encrypted.is_some(),
    }))
}

pub async fn github_orgs(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<OrganizationsResponse>, AppError> {
    let user = current_user(&state, &auth).await?;
    let encrypted = user
        .github_token_encrypted
        .ok_or_else(|| AppError::NotFound("No GitHub token configured".to_string()))?;
    let token =
        crypto::decrypt(&encrypted, &state.config.encryption_key).map_err(AppError::Internal)?;

    let organizations = state
        .github
        .list_orgs(&token)
        .await
        .map_err(|e| AppError::BadGateway(e.to_string()))?;

    Ok(Json(OrganizationsResponse { organizations }))
}
