use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Project;

/// Editable project fields, shared by create and update.
pub struct ProjectFields<'a> {
    pub name: &'a str,
    pub github_org: &'a str,
    pub min_students: i32,
    pub max_students: i32,
    pub group_convention: &'a str,
}

pub async fn list(pool: &PgPool, owner_id: Uuid) -> Result<Vec<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "SELECT * FROM projects WHERE owner_id = $1 ORDER BY created_at DESC",
    )
    .bind(owner_id)
    .fetch_all(pool)
    .await
}

pub async fn create(
    pool: &PgPool,
    owner_id: Uuid,
    fields: &ProjectFields<'_>,
    secret_key: &str,
) -> Result<Project, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "INSERT INTO projects
            (owner_id, name, github_org, min_students, max_students, group_convention, secret_key)
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
    )
    .bind(owner_id)
    .bind(fields.name)
    .bind(fields.github_org)
    .bind(fields.min_students)
    .bind(fields.max_students)
    .bind(fields.group_convention)
    .bind(secret_key)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(
    pool: &PgPool,
    id: Uuid,
    owner_id: Uuid,
) -> Result<Option<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1 AND owner_id = $2")
        .bind(id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await
}

/// Unscoped lookup, used by the public registration flow.
pub async fn find_by_id_unscoped(pool: &PgPool, id: Uuid) -> Result<Option<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    owner_id: Uuid,
    fields: &ProjectFields<'_>,
) -> Result<Project, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "UPDATE projects
         SET name = $3, github_org = $4, min_students = $5, max_students = $6,
             group_convention = $7, updated_at = now()
         WHERE id = $1 AND owner_id = $2 RETURNING *",
    )
    .bind(id)
    .bind(owner_id)
    .bind(fields.name)
    .bind(fields.github_org)
    .bind(fields.min_students)
    .bind(fields.max_students)
    .bind(fields.group_convention)
    .fetch_one(pool)
    .await
}

pub async fn set_secret_key(
    pool: &PgPool,
    id: Uuid,
    owner_id: Uuid,
    secret_key: &str,
) -> Result<Project, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "UPDATE projects SET secret_key = $3, updated_at = now()
         WHERE id = $1 AND owner_id = $2 RETURNING *",
    )
    .bind(id)
    .bind(owner_id)
    .bind(secret_key)
    .fetch_one(pool)
    .await
}

/// Returns `false` when nothing matched.
pub async fn delete(pool: &PgPool, id: Uuid, owner_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM projects WHERE id = $1 AND owner_id = $2")
        .bind(id)
        .bind(owner_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
