use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub repo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A student identity. Shared across projects, keyed by `github_login`.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Student {
    pub id: Uuid,
    pub full_name: String,
    pub github_username: String,
    #[serde(skip_serializing)]
    pub github_login: String,
    pub created_at: DateTime<Utc>,
}

/// A student as a member of one group.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct GroupMember {
    pub group_id: Uuid,
    pub student_id: Uuid,
    pub full_name: String,
    pub github_username: String,
    pub position: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupWithMembers {
    #[serde(flatten)]
    pub group: Group,
    pub members: Vec<GroupMember>,
}
