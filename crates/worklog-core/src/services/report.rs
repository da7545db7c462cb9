//! Report service.
//!
//! Owns report construction and normalization, ownership checks, the
//! lifecycle operations and the filtered retrieval paths. Every
//! mutation is validated before the single document write, mirrored to
//! the audit recorder, and (for approve/reject) followed by a
//! best-effort owner notification.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use serde_json::json;
use worklog_common::{id::is_well_formed_id, AppError, AppResult, IdGenerator};
use worklog_db::{
    entities::{
        report::{self, ApprovalAction, Attachment, ReportStatus},
        user,
    },
    repositories::{ReportFilter, ReportRepository, UserRepository},
};

use crate::services::{
    audit::AuditService,
    lifecycle::{self, Transition},
    notifier::NotifierService,
};

/// Tags as accepted from callers: a comma-separated string or a list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TagsInput {
    /// Comma-separated form, e.g. `"infra, oncall"`.
    Csv(String),
    /// Explicit list form.
    List(Vec<String>),
}

/// Normalize tag input: trim entries, drop empties, preserve order.
///
/// Duplicates are deliberately kept; deduplication is the caller's
/// responsibility.
#[must_use]
pub fn normalize_tags(input: &TagsInput) -> Vec<String> {
    let raw: Vec<&str> = match input {
        TagsInput::Csv(s) => s.split(',').collect(),
        TagsInput::List(items) => items.iter().map(String::as_str).collect(),
    };

    raw.iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Parse an ISO-ish timestamp the way the date-range filter accepts it.
///
/// Malformed strings yield `None` and the bound is silently dropped;
/// this permissiveness is a documented behavior, not an oversight.
#[must_use]
pub fn parse_date_permissive(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}

/// Input for creating a report.
#[derive(Debug, Clone)]
pub struct CreateReportInput {
    pub week: i32,
    pub year: i32,
    pub month: Option<i32>,
    pub achievements: Option<String>,
    pub challenges: Option<String>,
    pub next_week_plan: Option<String>,
    /// `draft` (default) or `submitted` for a direct submission.
    pub status: Option<ReportStatus>,
    pub tags: Option<TagsInput>,
}

/// Input for updating report content. Absent fields stay unchanged.
///
/// Status is deliberately not here: transitions go through
/// [`ReportService::submit`] / [`ReportService::approve`] /
/// [`ReportService::reject`] only.
#[derive(Debug, Clone, Default)]
pub struct UpdateReportInput {
    pub week: Option<i32>,
    pub year: Option<i32>,
    pub month: Option<i32>,
    pub achievements: Option<String>,
    pub challenges: Option<String>,
    pub next_week_plan: Option<String>,
    pub tags: Option<TagsInput>,
}

/// Raw, string-typed retrieval criteria as they arrive from a caller.
#[derive(Debug, Clone, Default)]
pub struct ReportQuery {
    pub q: Option<String>,
    pub status: Option<String>,
    pub tags: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    /// Admin path only.
    pub department: Option<String>,
    /// Admin path only.
    pub user_id: Option<String>,
}

/// Denormalized owner summary attached to a report's display form.
#[derive(Debug, Clone, Serialize)]
pub struct OwnerSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub username: Option<String>,
    pub department: String,
}

impl From<&user::Model> for OwnerSummary {
    fn from(user: &user::Model) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            username: user.username.clone(),
            department: user.department.clone(),
        }
    }
}

/// Display form of a report: the record plus its resolved owner.
///
/// When the owner no longer exists, `user` is `None` rather than an
/// error.
#[derive(Debug, Clone, Serialize)]
pub struct ReportView {
    #[serde(flatten)]
    pub report: report::Model,
    pub user: Option<OwnerSummary>,
}

/// Report service for business logic.
#[derive(Clone)]
pub struct ReportService {
    report_repo: ReportRepository,
    user_repo: UserRepository,
    audit: AuditService,
    notifier: NotifierService,
    id_gen: IdGenerator,
}

impl ReportService {
    /// Create a new report service.
    #[must_use]
    pub const fn new(
        report_repo: ReportRepository,
        user_repo: UserRepository,
        audit: AuditService,
        notifier: NotifierService,
    ) -> Self {
        Self {
            report_repo,
            user_repo,
            audit,
            notifier,
            id_gen: IdGenerator::new(),
        }
    }

    // ========== Construction & content ==========

    /// Create a report owned by `owner`, in `draft` or directly
    /// `submitted`.
    pub async fn create(
        &self,
        owner: &user::Model,
        input: CreateReportInput,
    ) -> AppResult<report::Model> {
        let status = match input.status {
            None => ReportStatus::Draft,
            Some(s @ (ReportStatus::Draft | ReportStatus::Submitted)) => s,
            Some(other) => {
                return Err(AppError::Validation(format!(
                    "a report cannot be created in status '{}'",
                    other.as_str()
                )))
            }
        };

        let tags = input.tags.as_ref().map(|t| normalize_tags(t)).unwrap_or_default();
        let now = Utc::now();
        let submitted_at = (status == ReportStatus::Submitted).then_some(now.into());

        let id = self.id_gen.generate();
        let model = report::ActiveModel {
            id: Set(id.clone()),
            user_id: Set(owner.id.clone()),
            week: Set(input.week),
            year: Set(input.year),
            month: Set(input.month),
            achievements: Set(input.achievements),
            challenges: Set(input.challenges),
            next_week_plan: Set(input.next_week_plan),
            status: Set(status),
            attachments: Set(json!([])),
            tags: Set(json!(tags)),
            approvals: Set(json!([])),
            created_at: Set(now.into()),
            submitted_at: Set(submitted_at),
        };

        let created = self.report_repo.create(model).await?;

        self.audit
            .record(
                &owner.id,
                "create",
                Some(&id),
                json!({"week": created.week, "year": created.year}),
            )
            .await;

        Ok(created)
    }

    /// Fetch a report, enforcing owner-or-admin visibility.
    pub async fn get(&self, actor: &user::Model, report_id: &str) -> AppResult<report::Model> {
        let report = self.report_repo.get_by_id(report_id).await?;
        self.check_owner_or_admin(actor, &report)?;
        Ok(report)
    }

    /// Update report content. Owner-or-admin; approved reports are
    /// final and refuse content edits.
    pub async fn update(
        &self,
        actor: &user::Model,
        report_id: &str,
        input: UpdateReportInput,
    ) -> AppResult<report::Model> {
        let report = self.report_repo.get_by_id(report_id).await?;
        self.check_owner_or_admin(actor, &report)?;

        if report.status == ReportStatus::Approved {
            return Err(AppError::InvalidTransition(
                "approved reports are final".to_string(),
            ));
        }

        let mut model: report::ActiveModel = report.into();
        if let Some(week) = input.week {
            model.week = Set(week);
        }
        if let Some(year) = input.year {
            model.year = Set(year);
        }
        if let Some(month) = input.month {
            model.month = Set(Some(month));
        }
        if let Some(achievements) = input.achievements {
            model.achievements = Set(Some(achievements));
        }
        if let Some(challenges) = input.challenges {
            model.challenges = Set(Some(challenges));
        }
        if let Some(plan) = input.next_week_plan {
            model.next_week_plan = Set(Some(plan));
        }
        if let Some(tags) = &input.tags {
            model.tags = Set(json!(normalize_tags(tags)));
        }

        let updated = self.report_repo.update(model).await?;

        self.audit
            .record(&actor.id, "update", Some(report_id), json!({}))
            .await;

        Ok(updated)
    }

    /// Append attachment metadata to a report. Attachments are
    /// append-only; existing entries are never replaced or removed.
    pub async fn add_attachments(
        &self,
        actor: &user::Model,
        report_id: &str,
        new: Vec<Attachment>,
    ) -> AppResult<report::Model> {
        let report = self.report_repo.get_by_id(report_id).await?;
        self.check_owner_or_admin(actor, &report)?;

        if report.status == ReportStatus::Approved {
            return Err(AppError::InvalidTransition(
                "approved reports are final".to_string(),
            ));
        }

        let names: Vec<String> = new.iter().map(|a| a.original_name.clone()).collect();
        let mut attachments = report.attachment_list();
        attachments.extend(new);

        let mut model: report::ActiveModel = report.into();
        model.attachments = Set(
            serde_json::to_value(&attachments).map_err(|e| AppError::Internal(e.to_string()))?
        );

        let updated = self.report_repo.update(model).await?;

        self.audit
            .record(&actor.id, "attach", Some(report_id), json!({"files": names}))
            .await;

        Ok(updated)
    }

    /// Delete a report. Owner-or-admin. Attachment blobs are left
    /// behind as orphans; removing them is out of scope here.
    pub async fn delete(&self, actor: &user::Model, report_id: &str) -> AppResult<()> {
        let report = self.report_repo.get_by_id(report_id).await?;
        self.check_owner_or_admin(actor, &report)?;

        self.report_repo.delete(report_id).await?;

        self.audit
            .record(&actor.id, "delete", Some(report_id), json!({}))
            .await;

        Ok(())
    }

    // ========== Lifecycle transitions ==========

    /// Submit a draft, or resubmit after rejection. Owner only.
    ///
    /// Refreshes `submitted_at`; the approval trail is preserved across
    /// resubmissions.
    pub async fn submit(&self, actor: &user::Model, report_id: &str) -> AppResult<report::Model> {
        let report = self.report_repo.get_by_id(report_id).await?;
        if report.user_id != actor.id {
            return Err(AppError::Forbidden(
                "only the report owner can submit".to_string(),
            ));
        }

        let next = lifecycle::check_transition(report.status, Transition::Submit)?;

        let mut model: report::ActiveModel = report.into();
        model.status = Set(next);
        model.submitted_at = Set(Some(Utc::now().into()));

        let updated = self.report_repo.update(model).await?;

        self.audit
            .record(&actor.id, "submit", Some(report_id), json!({}))
            .await;

        Ok(updated)
    }

    /// Approve a submitted report. Admin only; comment optional.
    pub async fn approve(
        &self,
        actor: &user::Model,
        report_id: &str,
        comment: Option<String>,
    ) -> AppResult<report::Model> {
        self.check_admin(actor)?;

        let report = self.report_repo.get_by_id(report_id).await?;
        let next = lifecycle::check_transition(report.status, Transition::Approve)?;

        let comment = comment.map(|c| c.trim().to_string()).filter(|c| !c.is_empty());
        let event = lifecycle::decision_event(&actor.id, ApprovalAction::Approved, comment.clone());

        let updated = self.apply_decision(report, next, event).await?;

        self.audit
            .record(&actor.id, "approve", Some(report_id), json!({"comment": comment}))
            .await;
        self.notify_decision(&updated, actor, ApprovalAction::Approved, comment.as_deref())
            .await;

        Ok(updated)
    }

    /// Reject a submitted report. Admin only; comment mandatory.
    pub async fn reject(
        &self,
        actor: &user::Model,
        report_id: &str,
        comment: Option<String>,
    ) -> AppResult<report::Model> {
        self.check_admin(actor)?;

        let report = self.report_repo.get_by_id(report_id).await?;
        let next = lifecycle::check_transition(report.status, Transition::Reject)?;

        // Validated before any write; an empty comment appends nothing.
        let comment = lifecycle::require_rejection_comment(comment.as_deref())?;
        let event =
            lifecycle::decision_event(&actor.id, ApprovalAction::Rejected, Some(comment.clone()));

        let updated = self.apply_decision(report, next, event).await?;

        self.audit
            .record(&actor.id, "reject", Some(report_id), json!({"comment": comment}))
            .await;
        self.notify_decision(&updated, actor, ApprovalAction::Rejected, Some(&comment))
            .await;

        Ok(updated)
    }

    /// Write the new status plus the appended approval event.
    async fn apply_decision(
        &self,
        report: report::Model,
        next: ReportStatus,
        event: report::ApprovalEvent,
    ) -> AppResult<report::Model> {
        let mut trail = report.approval_trail();
        trail.push(event);

        let mut model: report::ActiveModel = report.into();
        model.status = Set(next);
        model.approvals =
            Set(serde_json::to_value(&trail).map_err(|e| AppError::Internal(e.to_string()))?);

        self.report_repo.update(model).await
    }

    // ========== Retrieval ==========

    /// Owner-scoped listing: the caller's own reports, filtered.
    pub async fn list_mine(
        &self,
        actor: &user::Model,
        query: &ReportQuery,
    ) -> AppResult<Vec<ReportView>> {
        let mut filter = self.build_filter(query, false)?;
        filter.owner_id = Some(actor.id.clone());

        let reports = self.report_repo.find_filtered(&filter).await?;
        self.views(reports).await
    }

    /// Admin-scoped listing across all owners, filtered.
    pub async fn list_all(
        &self,
        actor: &user::Model,
        query: &ReportQuery,
    ) -> AppResult<Vec<ReportView>> {
        self.check_admin(actor)?;

        let mut filter = self.build_filter(query, true)?;

        if let Some(department) = query.department.as_deref().filter(|d| !d.is_empty()) {
            let ids = self.user_repo.ids_in_department(department).await?;
            if ids.is_empty() {
                // Owner-in-set over the empty set matches nothing.
                return Ok(vec![]);
            }
            filter.owner_in = Some(ids);
        }

        let reports = self.report_repo.find_filtered(&filter).await?;
        self.views(reports).await
    }

    /// Translate raw criteria into a typed store filter.
    fn build_filter(&self, query: &ReportQuery, admin: bool) -> AppResult<ReportFilter> {
        let mut filter = ReportFilter {
            q: query.q.clone().filter(|q| !q.is_empty()),
            ..Default::default()
        };

        if let Some(status) = query.status.as_deref().filter(|s| !s.is_empty()) {
            filter.status = Some(status.parse().map_err(AppError::Validation)?);
        }

        if let Some(tags) = query.tags.as_deref().filter(|t| !t.is_empty()) {
            filter.tags = normalize_tags(&TagsInput::Csv(tags.to_string()));
        }

        // Malformed bounds are dropped, not rejected.
        filter.start = query.start.as_deref().and_then(parse_date_permissive);
        filter.end = query.end.as_deref().and_then(parse_date_permissive);

        if admin {
            if let Some(user_id) = query.user_id.as_deref() {
                if !is_well_formed_id(user_id) {
                    return Err(AppError::Validation(format!(
                        "malformed user id: {user_id}"
                    )));
                }
                filter.owner_id = Some(user_id.to_string());
            }
        }

        Ok(filter)
    }

    /// Resolve display forms for a batch of reports.
    ///
    /// Owners are looked up in one query; reports whose owner is gone
    /// render without a summary.
    pub async fn views(&self, reports: Vec<report::Model>) -> AppResult<Vec<ReportView>> {
        let mut owner_ids: Vec<String> = reports.iter().map(|r| r.user_id.clone()).collect();
        owner_ids.sort_unstable();
        owner_ids.dedup();

        let owners = self.user_repo.find_by_ids(&owner_ids).await?;

        Ok(reports
            .into_iter()
            .map(|report| {
                let user = owners
                    .iter()
                    .find(|u| u.id == report.user_id)
                    .map(OwnerSummary::from);
                ReportView { report, user }
            })
            .collect())
    }

    /// Resolve the display form of a single report.
    pub async fn view(&self, report: report::Model) -> AppResult<ReportView> {
        let user = self
            .user_repo
            .find_by_id(&report.user_id)
            .await?
            .as_ref()
            .map(OwnerSummary::from);
        Ok(ReportView { report, user })
    }

    // ========== Guards & side effects ==========

    fn check_owner_or_admin(&self, actor: &user::Model, report: &report::Model) -> AppResult<()> {
        if report.user_id == actor.id || actor.role.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "not authorized for this report".to_string(),
            ))
        }
    }

    fn check_admin(&self, actor: &user::Model) -> AppResult<()> {
        if actor.role.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("admin access required".to_string()))
        }
    }

    /// Notify the owner of an approve/reject decision.
    ///
    /// Best-effort: delivery failures are logged by the notifier and
    /// never surface to the caller.
    async fn notify_decision(
        &self,
        report: &report::Model,
        actor: &user::Model,
        action: ApprovalAction,
        comment: Option<&str>,
    ) {
        let verb = match action {
            ApprovalAction::Approved => "approved",
            ApprovalAction::Rejected => "rejected",
        };

        match self.user_repo.find_by_id(&report.user_id).await {
            Ok(Some(owner)) => {
                let subject =
                    format!("Your report for week {} has been {verb}", report.week);
                let mut body = format!(
                    "Hi {},\n\nYour report (week {}, {}) was {verb} by {}",
                    owner.name, report.week, report.year, actor.name
                );
                if let Some(comment) = comment {
                    body.push_str(&format!("\n\nComment: {comment}"));
                }
                let _ = self.notifier.send_email(&owner.email, &subject, &body).await;
            }
            Ok(None) => {
                tracing::debug!(report_id = %report.id, "Report owner gone, skipping email");
            }
            Err(e) => {
                tracing::warn!(error = %e, report_id = %report.id, "Owner lookup failed, skipping email");
            }
        }

        let mut text = format!("Report {} {verb} by {}", report.id, actor.name);
        if action == ApprovalAction::Rejected {
            if let Some(comment) = comment {
                text.push_str(&format!(": {comment}"));
            }
        }
        let _ = self.notifier.send_slack(&text).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;
    use worklog_db::entities::audit_log;
    use worklog_db::entities::user::Role;
    use worklog_db::repositories::AuditLogRepository;

    fn service(db: Arc<sea_orm::DatabaseConnection>) -> ReportService {
        ReportService::new(
            ReportRepository::new(Arc::clone(&db)),
            UserRepository::new(Arc::clone(&db)),
            AuditService::new(AuditLogRepository::new(Arc::clone(&db))),
            NotifierService::disabled(),
        )
    }

    fn employee(id: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            name: "Employee".to_string(),
            email: format!("{id}@example.com"),
            username: None,
            department: "Eng".to_string(),
            role: Role::Employee,
            supervisor_email: None,
            password_hash: "hash".to_string(),
            token: None,
            created_at: Utc::now().into(),
        }
    }

    fn admin(id: &str) -> user::Model {
        user::Model {
            role: Role::Admin,
            ..employee(id)
        }
    }

    fn stored_report(id: &str, owner: &str, status: ReportStatus) -> report::Model {
        report::Model {
            id: id.to_string(),
            user_id: owner.to_string(),
            week: 1,
            year: 2024,
            month: None,
            achievements: Some("Shipped".to_string()),
            challenges: None,
            next_week_plan: None,
            status,
            attachments: json!([]),
            tags: json!([]),
            approvals: json!([]),
            created_at: Utc::now().into(),
            submitted_at: None,
        }
    }

    #[test]
    fn test_normalize_tags_csv() {
        let tags = normalize_tags(&TagsInput::Csv("a, b ,, c ,".to_string()));
        assert_eq!(tags, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_normalize_tags_list_keeps_duplicates_and_order() {
        let tags = normalize_tags(&TagsInput::List(vec![
            " b ".to_string(),
            String::new(),
            "a".to_string(),
            "b".to_string(),
        ]));
        assert_eq!(tags, vec!["b", "a", "b"]);
    }

    #[test]
    fn test_parse_date_permissive() {
        assert!(parse_date_permissive("2024-01-15").is_some());
        assert!(parse_date_permissive("2024-01-15T10:30:00").is_some());
        assert!(parse_date_permissive("2024-01-15T10:30:00Z").is_some());
        assert!(parse_date_permissive("last tuesday").is_none());
        assert!(parse_date_permissive("").is_none());
    }

    #[tokio::test]
    async fn test_get_requires_owner_or_admin() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([
                    [stored_report("r1", "owner1", ReportStatus::Draft)],
                    [stored_report("r1", "owner1", ReportStatus::Draft)],
                ])
                .into_connection(),
        );
        let service = service(db);

        let err = service.get(&employee("intruder"), "r1").await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let report = service.get(&admin("boss"), "r1").await.unwrap();
        assert_eq!(report.id, "r1");
    }

    #[tokio::test]
    async fn test_approve_of_draft_is_invalid_transition() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[stored_report("r1", "owner1", ReportStatus::Draft)]])
                .into_connection(),
        );
        let service = service(db);

        let err = service.approve(&admin("boss"), "r1", None).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn test_approve_of_submitted_report_appends_decision() {
        let event = lifecycle::decision_event("boss", ApprovalAction::Approved, None);
        let approved = report::Model {
            status: ReportStatus::Approved,
            approvals: serde_json::to_value(vec![event]).unwrap(),
            ..stored_report("r1", "owner1", ReportStatus::Submitted)
        };
        let audit_entry = audit_log::Model {
            id: "a1".to_string(),
            user_id: "boss".to_string(),
            action: "approve".to_string(),
            report_id: Some("r1".to_string()),
            details: json!({"comment": null}),
            created_at: Utc::now().into(),
        };

        // Read, update, audit append, owner lookup for the email.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[stored_report("r1", "owner1", ReportStatus::Submitted)]])
                .append_query_results([[approved]])
                .append_query_results([[audit_entry]])
                .append_query_results([[employee("owner1")]])
                .into_connection(),
        );
        let service = service(db);

        let updated = service.approve(&admin("boss"), "r1", None).await.unwrap();
        assert_eq!(updated.status, ReportStatus::Approved);

        let trail = updated.approval_trail();
        assert_eq!(trail.len(), 1);
        assert_eq!(trail[0].by, "boss");
        assert_eq!(trail[0].action, ApprovalAction::Approved);
    }

    #[tokio::test]
    async fn test_add_attachments_appends_and_audits_names() {
        let attachment = Attachment {
            key: "2024/01/abc".to_string(),
            original_name: "notes.pdf".to_string(),
            mime: "application/pdf".to_string(),
            size: Some(1024),
            url: "/api/reports/uploads/2024/01/abc".to_string(),
        };
        let stored = report::Model {
            attachments: serde_json::to_value(vec![attachment.clone()]).unwrap(),
            ..stored_report("r1", "owner1", ReportStatus::Draft)
        };
        let audit_entry = audit_log::Model {
            id: "a1".to_string(),
            user_id: "owner1".to_string(),
            action: "attach".to_string(),
            report_id: Some("r1".to_string()),
            details: json!({"files": ["notes.pdf"]}),
            created_at: Utc::now().into(),
        };

        // Read, update, audit append.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[stored_report("r1", "owner1", ReportStatus::Draft)]])
                .append_query_results([[stored]])
                .append_query_results([[audit_entry]])
                .into_connection(),
        );
        let service = service(db);

        let updated = service
            .add_attachments(&employee("owner1"), "r1", vec![attachment])
            .await
            .unwrap();

        let list = updated.attachment_list();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].original_name, "notes.pdf");
    }

    #[tokio::test]
    async fn test_approve_requires_admin_before_any_read() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = service(db);

        let err = service
            .approve(&employee("worker"), "r1", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_reject_without_comment_appends_nothing() {
        // Only the initial read is mocked: a validation failure before
        // the write means no further query is issued.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[stored_report("r1", "owner1", ReportStatus::Submitted)]])
                .into_connection(),
        );
        let service = service(db);

        let err = service
            .reject(&admin("boss"), "r1", Some("   ".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_submit_is_owner_only() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[stored_report("r1", "owner1", ReportStatus::Draft)]])
                .into_connection(),
        );
        let service = service(db);

        let err = service.submit(&admin("boss"), "r1").await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_update_of_approved_report_is_refused() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[stored_report("r1", "owner1", ReportStatus::Approved)]])
                .into_connection(),
        );
        let service = service(db);

        let err = service
            .update(&employee("owner1"), "r1", UpdateReportInput::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn test_create_rejects_approved_initial_status() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = service(db);

        let input = CreateReportInput {
            week: 1,
            year: 2024,
            month: None,
            achievements: None,
            challenges: None,
            next_week_plan: None,
            status: Some(ReportStatus::Approved),
            tags: None,
        };
        let err = service.create(&employee("owner1"), input).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_build_filter_rejects_malformed_user_id() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = service(db);

        let query = ReportQuery {
            user_id: Some("not-an-id".to_string()),
            ..Default::default()
        };
        let err = service.build_filter(&query, true).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_build_filter_drops_malformed_dates() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = service(db);

        let query = ReportQuery {
            start: Some("not a date".to_string()),
            end: Some("2024-02-01".to_string()),
            ..Default::default()
        };
        let filter = service.build_filter(&query, false).unwrap();
        assert!(filter.start.is_none());
        assert!(filter.end.is_some());
    }

    #[tokio::test]
    async fn test_build_filter_rejects_unknown_status() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = service(db);

        let query = ReportQuery {
            status: Some("finalized".to_string()),
            ..Default::default()
        };
        let err = service.build_filter(&query, false).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_build_filter_treats_empty_strings_as_absent() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let service = service(db);

        let query = ReportQuery {
            q: Some(String::new()),
            status: Some(String::new()),
            tags: Some(String::new()),
            ..Default::default()
        };
        let filter = service.build_filter(&query, false).unwrap();
        assert!(filter.q.is_none());
        assert!(filter.status.is_none());
        assert!(filter.tags.is_empty());
    }
}
