//! Report repository.
//!
//! Holds the filter composition used by both the owner-scoped and the
//! admin-scoped retrieval paths, and the grouped aggregation queries
//! behind the dashboard statistics.

use std::sync::Arc;

use crate::entities::{report, user, Report};
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::{Alias, Expr, Func},
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, FromQueryResult,
    JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait,
};
use serde::Serialize;
use worklog_common::{AppError, AppResult};

/// Optional, independent filter criteria composed into one store filter.
///
/// Every present criterion is ANDed; absent criteria contribute no
/// clause at all. Criterion parsing (dates, status strings, department
/// resolution) happens in the service layer; by the time a filter gets
/// here it is fully typed.
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    /// Case-insensitive substring over the three content fields.
    pub q: Option<String>,
    /// Exact status match.
    pub status: Option<report::ReportStatus>,
    /// Tag intersection: a report matches if it carries ANY of these.
    pub tags: Vec<String>,
    /// Inclusive lower bound on `created_at`.
    pub start: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`.
    pub end: Option<DateTime<Utc>>,
    /// Exact owner match (the implicit clause of the owner-scoped path,
    /// or the admin `user_id` criterion).
    pub owner_id: Option<String>,
    /// Owner-in-set (department criterion, already resolved to user IDs).
    pub owner_in: Option<Vec<String>>,
}

impl ReportFilter {
    /// Compose the criteria into a single `Condition`.
    ///
    /// An empty filter yields an empty condition, which sea-orm renders
    /// as no WHERE clause at all (match-all).
    #[must_use]
    pub fn condition(&self) -> Condition {
        let mut cond = Condition::all();

        if let Some(q) = self.q.as_deref().filter(|q| !q.is_empty()) {
            let pattern = format!("%{}%", q.to_lowercase());
            cond = cond.add(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col((
                            report::Entity,
                            report::Column::Achievements,
                        ))))
                        .like(pattern.clone()),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col((
                            report::Entity,
                            report::Column::Challenges,
                        ))))
                        .like(pattern.clone()),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col((
                            report::Entity,
                            report::Column::NextWeekPlan,
                        ))))
                        .like(pattern),
                    ),
            );
        }

        if let Some(status) = self.status {
            cond = cond.add(report::Column::Status.eq(status));
        }

        if !self.tags.is_empty() {
            // ANY-match: one JSONB containment check per requested tag.
            let mut any = Condition::any();
            for tag in &self.tags {
                any = any.add(Expr::cust_with_values(
                    r#""report"."tags" @> ?"#,
                    [serde_json::json!([tag])],
                ));
            }
            cond = cond.add(any);
        }

        if let Some(start) = self.start {
            cond = cond.add(report::Column::CreatedAt.gte(start));
        }
        if let Some(end) = self.end {
            cond = cond.add(report::Column::CreatedAt.lte(end));
        }

        if let Some(owner) = &self.owner_id {
            cond = cond.add(report::Column::UserId.eq(owner.clone()));
        }

        if let Some(owners) = &self.owner_in {
            cond = cond.add(report::Column::UserId.is_in(owners.clone()));
        }

        cond
    }
}

/// Per-(year, week) report counts.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult, Serialize)]
pub struct WeeklyCount {
    pub year: i32,
    pub week: i32,
    pub total: i64,
    pub submitted: i64,
}

/// Per-department report counts. `department` is `None` when the owning
/// user row no longer exists.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult, Serialize)]
pub struct DepartmentCount {
    pub department: Option<String>,
    pub total: i64,
    pub submitted: i64,
}

/// Per-user report counts.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult, Serialize)]
pub struct UserCount {
    pub user_id: String,
    pub total: i64,
    pub submitted: i64,
}

/// SUM of reports that have left draft at least once.
fn submitted_or_later_sum() -> sea_orm::sea_query::SimpleExpr {
    Expr::cust(r#"SUM(CASE WHEN "report"."status" <> 'draft' THEN 1 ELSE 0 END)"#)
}

/// Report repository for database operations.
#[derive(Clone)]
pub struct ReportRepository {
    db: Arc<DatabaseConnection>,
}

impl ReportRepository {
    /// Create a new report repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a report by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<report::Model>> {
        Report::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a report by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<report::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::ReportNotFound(id.to_string()))
    }

    /// Create a new report.
    pub async fn create(&self, model: report::ActiveModel) -> AppResult<report::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a report.
    pub async fn update(&self, model: report::ActiveModel) -> AppResult<report::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a report.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Report::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Find reports matching a composed filter, newest first.
    ///
    /// Ordering is fixed: `created_at` descending. Both retrieval paths
    /// use this; the owner-scoped path sets `filter.owner_id`.
    pub async fn find_filtered(&self, filter: &ReportFilter) -> AppResult<Vec<report::Model>> {
        Report::find()
            .filter(filter.condition())
            .order_by_desc(report::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count all reports.
    pub async fn count_all(&self) -> AppResult<u64> {
        Report::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count reports that have left draft at least once.
    pub async fn count_submitted_or_later(&self) -> AppResult<u64> {
        Report::find()
            .filter(report::Column::Status.ne(report::ReportStatus::Draft))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Group report counts by (year, week), ascending.
    pub async fn weekly_counts(&self) -> AppResult<Vec<WeeklyCount>> {
        Report::find()
            .select_only()
            .column(report::Column::Year)
            .column(report::Column::Week)
            .column_as(report::Column::Id.count(), "total")
            .column_as(submitted_or_later_sum(), "submitted")
            .group_by(report::Column::Year)
            .group_by(report::Column::Week)
            .order_by_asc(report::Column::Year)
            .order_by_asc(report::Column::Week)
            .into_model::<WeeklyCount>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Group report counts by owner department, descending by total.
    ///
    /// Left-joins the owner so reports whose user row is gone still
    /// count, under a NULL department.
    pub async fn department_counts(&self) -> AppResult<Vec<DepartmentCount>> {
        Report::find()
            .select_only()
            .column_as(user::Column::Department, "department")
            .column_as(report::Column::Id.count(), "total")
            .column_as(submitted_or_later_sum(), "submitted")
            .join(JoinType::LeftJoin, report::Relation::User.def())
            .group_by(user::Column::Department)
            .order_by_desc(Expr::col(Alias::new("total")))
            .into_model::<DepartmentCount>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Group report counts by owner, optionally restricted to a set of
    /// user IDs, descending by total.
    pub async fn per_user_counts(&self, user_ids: Option<&[String]>) -> AppResult<Vec<UserCount>> {
        let mut query = Report::find()
            .select_only()
            .column(report::Column::UserId)
            .column_as(report::Column::Id.count(), "total")
            .column_as(submitted_or_later_sum(), "submitted")
            .group_by(report::Column::UserId)
            .order_by_desc(Expr::col(Alias::new("total")));

        if let Some(ids) = user_ids {
            query = query.filter(report::Column::UserId.is_in(ids.to_vec()));
        }

        query
            .into_model::<UserCount>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sea_orm::{DatabaseBackend, DbBackend, MockDatabase, QueryTrait};
    use serde_json::json;

    fn filtered_sql(filter: &ReportFilter) -> String {
        Report::find()
            .filter(filter.condition())
            .order_by_desc(report::Column::CreatedAt)
            .build(DbBackend::Postgres)
            .to_string()
    }

    #[test]
    fn test_empty_filter_matches_all() {
        // An empty condition renders as `WHERE TRUE`, which is still
        // match-all.
        let sql = filtered_sql(&ReportFilter::default());
        assert!(
            !sql.contains("WHERE") || sql.contains("WHERE TRUE"),
            "empty filter must not constrain the result: {sql}"
        );
        assert!(sql.contains(r#"ORDER BY "report"."created_at" DESC"#));
    }

    #[test]
    fn test_text_search_spans_all_content_fields() {
        let filter = ReportFilter {
            q: Some("Shipped".to_string()),
            ..Default::default()
        };
        let sql = filtered_sql(&filter);
        assert!(sql.contains("LOWER"));
        assert!(sql.contains("%shipped%"));
        assert!(sql.contains("achievements"));
        assert!(sql.contains("challenges"));
        assert!(sql.contains("next_week_plan"));
        assert!(sql.contains(" OR "));
    }

    #[test]
    fn test_tag_filter_is_any_match() {
        let filter = ReportFilter {
            tags: vec!["b".to_string(), "c".to_string()],
            ..Default::default()
        };
        let sql = filtered_sql(&filter);
        assert_eq!(sql.matches("@>").count(), 2);
        assert!(sql.contains(" OR "));
    }

    #[test]
    fn test_date_bounds_are_inclusive_and_independent() {
        let start = chrono::Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let filter = ReportFilter {
            start: Some(start),
            ..Default::default()
        };
        let sql = filtered_sql(&filter);
        assert!(sql.contains(">="));
        assert!(!sql.contains("<="));

        let filter = ReportFilter {
            end: Some(start),
            ..Default::default()
        };
        let sql = filtered_sql(&filter);
        assert!(sql.contains("<="));
        assert!(!sql.contains(">="));
    }

    #[test]
    fn test_criteria_combine_with_and() {
        let filter = ReportFilter {
            status: Some(report::ReportStatus::Submitted),
            owner_id: Some("u1".to_string()),
            ..Default::default()
        };
        let sql = filtered_sql(&filter);
        assert!(sql.contains(r#""report"."status" = 'submitted'"#));
        assert!(sql.contains(r#""report"."user_id" = 'u1'"#));
        assert!(sql.contains(" AND "));
    }

    #[test]
    fn test_owner_in_set() {
        let filter = ReportFilter {
            owner_in: Some(vec!["u1".to_string(), "u2".to_string()]),
            ..Default::default()
        };
        let sql = filtered_sql(&filter);
        assert!(sql.contains(r#""report"."user_id" IN ('u1', 'u2')"#));
    }

    fn sample_report(id: &str, user_id: &str) -> report::Model {
        report::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            week: 1,
            year: 2024,
            month: None,
            achievements: Some("Shipped".to_string()),
            challenges: None,
            next_week_plan: None,
            status: report::ReportStatus::Draft,
            attachments: json!([]),
            tags: json!([]),
            approvals: json!([]),
            created_at: chrono::Utc::now().into(),
            submitted_at: None,
        }
    }

    #[tokio::test]
    async fn test_get_by_id_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[sample_report("r1", "u1")]])
                .into_connection(),
        );

        let repo = ReportRepository::new(db);
        let found = repo.get_by_id("r1").await.unwrap();
        assert_eq!(found.id, "r1");
    }

    #[tokio::test]
    async fn test_get_by_id_missing_is_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<report::Model>::new()])
                .into_connection(),
        );

        let repo = ReportRepository::new(db);
        let err = repo.get_by_id("nope").await.unwrap_err();
        assert!(matches!(err, AppError::ReportNotFound(_)));
    }

    #[tokio::test]
    async fn test_find_filtered_orders_newest_first() {
        let older = sample_report("r1", "u1");
        let newer = sample_report("r2", "u1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[newer, older]])
                .into_connection(),
        );

        let repo = ReportRepository::new(db);
        let filter = ReportFilter {
            owner_id: Some("u1".to_string()),
            ..Default::default()
        };
        let found = repo.find_filtered(&filter).await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].id, "r2");
    }
}
