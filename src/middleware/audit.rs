use sqlx::PgPool;
use uuid::Uuid;

use crate::db::audit::NewAuditEvent;

/// Record an audit event. Called explicitly by handlers after mutations;
/// failures are logged and swallowed.
pub async fn log_event(
    pool: &PgPool,
    user_id: Option<Uuid>,
    project_id: Option<Uuid>,
    action: &str,
    resource_type: &str,
    resource_id: Option<Uuid>,
    details: Option<serde_json::Value>,
) {
    let event = NewAuditEvent {
        user_id,
        project_id,
        action,
        resource_type,
        resource_id,
        details,
    };

    if let Err(e) = crate::db::audit::insert(pool, event).await {
        tracing::error!("Failed to log audit event {action}: {e}");
    }
}
