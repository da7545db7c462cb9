//! Audit trail recording.
//!
//! Every mutation records who did what to which report. Recording is
//! deliberately infallible from the caller's point of view: a failed
//! audit write is logged and swallowed, never failing the operation it
//! describes.

use chrono::Utc;
use sea_orm::Set;
use worklog_common::{AppResult, IdGenerator};
use worklog_db::{entities::audit_log, repositories::AuditLogRepository};

/// Audit service.
#[derive(Clone)]
pub struct AuditService {
    repo: AuditLogRepository,
    id_gen: IdGenerator,
}

impl AuditService {
    /// Create a new audit service.
    #[must_use]
    pub const fn new(repo: AuditLogRepository) -> Self {
        Self {
            repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Record an action against the trail.
    pub async fn record(
        &self,
        user_id: &str,
        action: &str,
        report_id: Option<&str>,
        details: serde_json::Value,
    ) {
        let entry = audit_log::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            action: Set(action.to_string()),
            report_id: Set(report_id.map(ToString::to_string)),
            details: Set(details),
            created_at: Set(Utc::now().into()),
        };

        if let Err(e) = self.repo.append(entry).await {
            tracing::warn!(error = %e, user_id, action, "Failed to record audit entry");
        }
    }

    /// The most recent audit entries, newest first.
    pub async fn recent(&self, limit: u64) -> AppResult<Vec<audit_log::Model>> {
        self.repo.recent(limit).await
    }
}
