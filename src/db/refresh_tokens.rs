use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::RefreshToken;

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    user_id: Uuid,
    token_hash: &str,
    expires_at: DateTime<Utc>,
) -> Result<RefreshToken, sqlx::Error> {
    sqlx::query_as::<_, RefreshToken>(
        "INSERT INTO refresh_tokens (user_id, token_hash, expires_at)
         VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(user_id)
    .bind(token_hash)
    .bind(expires_at)
    .fetch_one(executor)
    .await
}

pub async fn find_by_hash(
    pool: &PgPool,
    token_hash: &str,
) -> Result<Option<RefreshToken>, sqlx::Error> {
    sqlx::query_as::<_, RefreshToken>("SELECT * FROM refresh_tokens WHERE token_hash = $1")
        .bind(token_hash)
        .fetch_optional(pool)
        .await
}

/// Marks `old_id` used and stores its successor in one transaction.
/// Returns `false` if `old_id` had already been consumed by a concurrent refresh.
pub async fn rotate(
    pool: &PgPool,
    old_id: Uuid,
    user_id: Uuid,
    new_hash: &str,
    expires_at: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let consumed = sqlx::query("UPDATE refresh_tokens SET used = true WHERE id = $1 AND used = false")
        .bind(old_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    if consumed == 0 {
        tx.rollback().await?;
        return Ok(false);
    }

    create(&mut *tx, user_id, new_hash, expires_at).await?;
    tx.commit().await?;
    Ok(true)
}

pub async fn delete_all_for_user(pool: &PgPool, user_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete_by_hash(pool: &PgPool, token_hash: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM refresh_tokens WHERE token_hash = $1")
        .bind(token_hash)
        .execute(pool)
        .await?;
    Ok(())
}
