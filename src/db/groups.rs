use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Group, GroupMember, GroupWithMembers, Student};

/// A validated member ready to be written.
#[derive(Debug, Clone)]
pub struct NewMember<'a> {
    pub full_name: &'a str,
    pub github_username: &'a str,
}

pub async fn count_by_project(pool: &PgPool, project_id: Uuid) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM groups WHERE project_id = $1")
        .bind(project_id)
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}

pub async fn name_exists(pool: &PgPool, project_id: Uuid, name: &str) -> Result<bool, sqlx::Error> {
    let row: (bool,) = sqlx::query_as(
        "SELECT EXISTS (SELECT 1 FROM groups WHERE project_id = $1 AND name = $2)",
    )
    .bind(project_id)
    .bind(name)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

/// Normalized logins of everyone already in a group of this project.
pub async fn registered_logins(pool: &PgPool, project_id: Uuid) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT s.github_login FROM group_members gm
         JOIN students s ON s.id = gm.student_id
         WHERE gm.project_id = $1",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await
}

pub async fn list_with_members(
    pool: &PgPool,
    project_id: Uuid,
) -> Result<Vec<GroupWithMembers>, sqlx::Error> {
    let groups = sqlx::query_as::<_, Group>(
        "SELECT * FROM groups WHERE project_id = $1 ORDER BY created_at, name",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await?;

    let members = sqlx::query_as::<_, GroupMember>(
        "SELECT gm.group_id, gm.student_id, s.full_name, s.github_username, gm.position
         FROM group_members gm
         JOIN students s ON s.id = gm.student_id
         WHERE gm.project_id = $1
         ORDER BY gm.group_id, gm.position",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await?;

    let mut by_group: HashMap<Uuid, Vec<GroupMember>> = HashMap::new();
    for member in members {
        by_group.entry(member.group_id).or_default().push(member);
    }

    Ok(groups
        .into_iter()
        .map(|group| {
            let members = by_group.remove(&group.id).unwrap_or_default();
            GroupWithMembers { group, members }
        })
        .collect())
}

/// Inserts the group, upserts each student identity and links the memberships,
/// all inside one transaction.
pub async fn create_with_members(
    pool: &PgPool,
    project_id: Uuid,
    name: &str,
    repo_url: Option<&str>,
    members: &[NewMember<'_>],
) -> Result<GroupWithMembers, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let group = sqlx::query_as::<_, Group>(
        "INSERT INTO groups (project_id, name, repo_url) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(project_id)
    .bind(name)
    .bind(repo_url)
    .fetch_one(&mut *tx)
    .await?;

    let mut written = Vec::with_capacity(members.len());
    for (position, member) in members.iter().enumerate() {
        let student = sqlx::query_as::<_, Student>(
            "INSERT INTO students (full_name, github_username, github_login)
             VALUES ($1, $2, $3)
             ON CONFLICT (github_login) DO UPDATE
                SET full_name = EXCLUDED.full_name, github_username = EXCLUDED.github_username
             RETURNING *",
        )
        .bind(member.full_name)
        .bind(member.github_username)
        .bind(member.github_username.to_lowercase())
        .fetch_one(&mut *tx)
        .await?;

        let position = position as i32;
        sqlx::query(
            "INSERT INTO group_members (group_id, student_id, project_id, position)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(group.id)
        .bind(student.id)
        .bind(project_id)
        .bind(position)
        .execute(&mut *tx)
        .await?;

        written.push(GroupMember {
            group_id: group.id,
            student_id: student.id,
            full_name: student.full_name,
            github_username: student.github_username,
            position,
        });
    }

    tx.commit().await?;

    Ok(GroupWithMembers {
        group,
        members: written,
    })
}

/// Group lookup scoped to the owner of its project.
pub async fn find_owned(
    pool: &PgPool,
    id: Uuid,
    owner_id: Uuid,
) -> Result<Option<Group>, sqlx::Error> {
    sqlx::query_as::<_, Group>(
        "SELECT g.* FROM groups g
         JOIN projects p ON p.id = g.project_id
         WHERE g.id = $1 AND p.owner_id = $2",
    )
    .bind(id)
    .bind(owner_id)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM groups WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
