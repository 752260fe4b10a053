use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::GroupWithMembers;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub github_org: String,
    pub min_students: i32,
    pub max_students: i32,
    pub group_convention: String,
    pub secret_key: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Owner-facing project representation, including the derived share link.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectView {
    #[serde(flatten)]
    pub project: Project,
    pub share_url: String,
}

/// What a student holding the link may see.
#[derive(Debug, Clone, Serialize)]
pub struct PublicProject {
    pub id: Uuid,
    pub name: String,
    pub github_org: String,
    pub min_students: i32,
    pub max_students: i32,
    pub group_convention: String,
    pub groups: Vec<GroupWithMembers>,
}

impl PublicProject {
    pub fn new(project: Project, groups: Vec<GroupWithMembers>) -> Self {
        Self {
            id: project.id,
            name: project.name,
            github_org: project.github_org,
            min_students: project.min_students,
            max_students: project.max_students,
            group_convention: project.group_convention,
            groups,
        }
    }
}
