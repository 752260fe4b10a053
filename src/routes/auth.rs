use axum::extract::State;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::auth::jwt::{self, Claims, encode_token};
use crate::auth::password;
use crate::config::RegistrationMode;
use crate::db;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::User;
use crate::state::SharedState;

const REFRESH_TOKEN_DAYS: i64 = 7;

#[derive(Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

fn auth_cookies(access_token: &str, refresh_token: &str) -> CookieJar {
    let access = Cookie::build(("access_token", access_token.to_string()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::minutes(jwt::ACCESS_TOKEN_MINUTES))
        .build();

    let refresh = Cookie::build(("refresh_token", refresh_token.to_string()))
        .path("/api/v1/auth")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Strict)
        .max_age(time::Duration::days(REFRESH_TOKEN_DAYS))
        .build();

    CookieJar::new().add(access).add(refresh)
}

fn clear_auth_cookies() -> CookieJar {
    let access = Cookie::build(("access_token", ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .build();
    let refresh = Cookie::build(("refresh_token", ""))
        .path("/api/v1/auth")
        .max_age(time::Duration::ZERO)
        .build();
    CookieJar::new().add(access).add(refresh)
}

fn generate_refresh_token() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

fn hash_token(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

/// Issues an access token and stores a fresh refresh token for `user`.
async fn issue_session(
    state: &SharedState,
    user: &User,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let access_token = encode_token(&Claims::new(user.id, &user.username), &state.config.jwt_secret)
        .map_err(AppError::Internal)?;

    let refresh = generate_refresh_token();
    db::refresh_tokens::create(
        &state.pool,
        user.id,
        &hash_token(&refresh),
        Utc::now() + Duration::days(REFRESH_TOKEN_DAYS),
    )
    .await?;

    Ok((
        auth_cookies(&access_token, &refresh),
        Json(AuthResponse {
            access_token,
            refresh_token: refresh,
        }),
    ))
}

pub async fn register(
    State(state): State<SharedState>,
    Json(req): Json<Credentials>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let username = req.username.trim();
    if username.is_empty() || req.password.is_empty() {
        return Err(AppError::BadRequest("Username and password are required".to_string()));
    }
    password::check_strength(&req.password).map_err(AppError::BadRequest)?;

    let pw_hash = password::hash(&req.password).map_err(AppError::Internal)?;

    // Serializes the first-user check against concurrent registrations
    let mut tx = state.pool.begin().await?;
    sqlx::query("SELECT pg_advisory_xact_lock(1)")
        .execute(&mut *tx)
        .await?;

    let count = db::users::count_all(&mut *tx).await?;
    if count > 0 && state.config.registration == RegistrationMode::Closed {
        return Err(AppError::Forbidden(
            "Registration is disabled. Contact your administrator.".to_string(),
        ));
    }

    let user = db::users::create(&mut *tx, username, &pw_hash)
        .await
        .map_err(|e| match db::unique_violation(&e) {
            Some(_) => AppError::Conflict("Username is already taken".to_string()),
            None => AppError::Database(e),
        })?;

    tx.commit().await?;

    audit::log_event(
        &state.pool,
        Some(user.id),
        None,
        "user.registered",
        "user",
        Some(user.id),
        None,
    )
    .await;

    issue_session(&state, &user).await
}

pub async fn login(
    State(state): State<SharedState>,
    Json(req): Json<Credentials>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let username = req.username.trim();
    if let Err(retry_after) = state.login_limiter.check(username) {
        return Err(AppError::RateLimited(format!(
            "Too many login attempts. Try again in {retry_after}s."
        )));
    }

    let Some(user) = db::users::find_by_username(&state.pool, username).await? else {
        state.login_limiter.record_failure(username);
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    };

    let valid = password::verify(&req.password, &user.password_hash).map_err(AppError::Internal)?;
    if !valid {
        state.login_limiter.record_failure(username);
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    tracing::info!("User {} logged in", user.username);
    issue_session(&state, &user).await
}

pub async fn refresh(
    State(state): State<SharedState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    let refresh_value = jar
        .get("refresh_token")
        .map(|c| c.value().to_string())
        .ok_or_else(|| AppError::Unauthorized("Missing refresh token".to_string()))?;

    let stored = db::refresh_tokens::find_by_hash(&state.pool, &hash_token(&refresh_value))
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid refresh token".to_string()))?;

    if stored.expires_at < Utc::now() {
        return Err(AppError::Unauthorized("Refresh token expired".to_string()));
    }

    let user = db::users::find_by_id(&state.pool, stored.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    let new_refresh = generate_refresh_token();
    let rotated = !stored.used
        && db::refresh_tokens::rotate(
            &state.pool,
            stored.id,
            user.id,
            &hash_token(&new_refresh),
            Utc::now() + Duration::days(REFRESH_TOKEN_DAYS),
        )
        .await?;

    if !rotated {
        let revoked = db::refresh_tokens::delete_all_for_user(&state.pool, user.id).await?;
        tracing::warn!(
            "Refresh token reuse detected for user {}, revoked {revoked} sessions",
            user.id
        );
        return Err(AppError::Unauthorized(
            "Refresh token reuse detected. All sessions revoked.".to_string(),
        ));
    }

    let access_token = encode_token(&Claims::new(user.id, &user.username), &state.config.jwt_secret)
        .map_err(AppError::Internal)?;

    Ok((
        auth_cookies(&access_token, &new_refresh),
        Json(AuthResponse {
            access_token,
            refresh_token: new_refresh,
        }),
    ))
}

pub async fn logout(
    State(state): State<SharedState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<MessageResponse>), AppError> {
    if let Some(cookie) = jar.get("refresh_token") {
        db::refresh_tokens::delete_by_hash(&state.pool, &hash_token(cookie.value())).await?;
    }

    Ok((
        clear_auth_cookies(),
        Json(MessageResponse {
            message: "Logged out successfully".to_string(),
        }),
    ))
}
