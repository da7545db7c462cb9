//! Repository integration tests.
//!
//! These run against a real Postgres instance (see `TestDbConfig` for
//! the environment variables) and are ignored by default:
//!
//! ```sh
//! cargo test -p worklog-db -- --ignored
//! ```

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use chrono::Utc;
use sea_orm::Set;
use serde_json::json;
use worklog_db::{
    entities::{report, report::ReportStatus, user, user::Role},
    repositories::{ReportFilter, ReportRepository, UserRepository},
    test_utils::TestDatabase,
};

fn user_model(id: &str, department: &str) -> user::ActiveModel {
    user::ActiveModel {
        id: Set(id.to_string()),
        name: Set(format!("User {id}")),
        email: Set(format!("{id}@example.com")),
        username: Set(None),
        department: Set(department.to_string()),
        role: Set(Role::Employee),
        supervisor_email: Set(None),
        password_hash: Set("hash".to_string()),
        token: Set(None),
        created_at: Set(Utc::now().into()),
    }
}

fn report_model(
    id: &str,
    owner: &str,
    week: i32,
    status: ReportStatus,
    tags: serde_json::Value,
) -> report::ActiveModel {
    report::ActiveModel {
        id: Set(id.to_string()),
        user_id: Set(owner.to_string()),
        week: Set(week),
        year: Set(2024),
        month: Set(None),
        achievements: Set(Some("Shipped the thing".to_string())),
        challenges: Set(None),
        next_week_plan: Set(None),
        status: Set(status),
        attachments: Set(json!([])),
        tags: Set(tags),
        approvals: Set(json!([])),
        created_at: Set(Utc::now().into()),
        submitted_at: Set(None),
    }
}

#[tokio::test]
#[ignore = "requires a running Postgres test database"]
async fn test_filtered_listing_roundtrip() {
    let test_db = TestDatabase::new().await.unwrap();
    test_db.cleanup().await.unwrap();
    let db = Arc::clone(&test_db.conn);

    let users = UserRepository::new(Arc::clone(&db));
    let reports = ReportRepository::new(Arc::clone(&db));

    users.create(user_model("u1", "Eng")).await.unwrap();
    reports
        .create(report_model("r1", "u1", 1, ReportStatus::Draft, json!(["infra"])))
        .await
        .unwrap();
    reports
        .create(report_model("r2", "u1", 2, ReportStatus::Submitted, json!(["oncall"])))
        .await
        .unwrap();

    // Tag filter with ANY semantics: requesting {oncall, other} matches r2.
    let filter = ReportFilter {
        owner_id: Some("u1".to_string()),
        tags: vec!["oncall".to_string(), "other".to_string()],
        ..Default::default()
    };
    let found = reports.find_filtered(&filter).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, "r2");

    // Empty filter matches everything, newest first.
    let all = reports.find_filtered(&ReportFilter::default()).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, "r2");

    test_db.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running Postgres test database"]
async fn test_grouped_aggregates() {
    let test_db = TestDatabase::new().await.unwrap();
    test_db.cleanup().await.unwrap();
    let db = Arc::clone(&test_db.conn);

    let users = UserRepository::new(Arc::clone(&db));
    let reports = ReportRepository::new(Arc::clone(&db));

    users.create(user_model("u1", "Eng")).await.unwrap();
    users.create(user_model("u2", "Sales")).await.unwrap();

    reports
        .create(report_model("r1", "u1", 1, ReportStatus::Submitted, json!([])))
        .await
        .unwrap();
    reports
        .create(report_model("r2", "u1", 1, ReportStatus::Draft, json!([])))
        .await
        .unwrap();
    reports
        .create(report_model("r3", "u2", 2, ReportStatus::Approved, json!([])))
        .await
        .unwrap();

    let weekly = reports.weekly_counts().await.unwrap();
    assert_eq!(weekly.len(), 2);
    assert_eq!((weekly[0].year, weekly[0].week), (2024, 1));
    assert_eq!(weekly[0].total, 2);
    assert_eq!(weekly[0].submitted, 1);

    let departments = reports.department_counts().await.unwrap();
    assert_eq!(departments[0].department.as_deref(), Some("Eng"));
    assert_eq!(departments[0].total, 2);

    assert_eq!(reports.count_all().await.unwrap(), 3);
    assert_eq!(reports.count_submitted_or_later().await.unwrap(), 2);

    test_db.cleanup().await.unwrap();
}
