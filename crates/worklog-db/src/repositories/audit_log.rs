//! Audit log repository.

use std::sync::Arc;

use crate::entities::{audit_log, AuditLog};
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, QuerySelect,
};
use worklog_common::{AppError, AppResult};

/// Audit log repository for database operations.
#[derive(Clone)]
pub struct AuditLogRepository {
    db: Arc<DatabaseConnection>,
}

impl AuditLogRepository {
    /// Create a new audit log repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Append an audit entry. Entries are never updated or deleted.
    pub async fn append(&self, model: audit_log::ActiveModel) -> AppResult<audit_log::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Most recent entries, newest first.
    pub async fn recent(&self, limit: u64) -> AppResult<Vec<audit_log::Model>> {
        AuditLog::find()
            .order_by_desc(audit_log::Column::CreatedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use serde_json::json;

    fn sample_entry(id: &str) -> audit_log::Model {
        audit_log::Model {
            id: id.to_string(),
            user_id: "u1".to_string(),
            action: "approve".to_string(),
            report_id: Some("r1".to_string()),
            details: json!({"comment": "ok"}),
            created_at: chrono::Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_recent_returns_entries() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[sample_entry("a2"), sample_entry("a1")]])
                .into_connection(),
        );

        let repo = AuditLogRepository::new(db);
        let entries = repo.recent(50).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "a2");
    }
}
