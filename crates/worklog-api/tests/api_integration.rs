//! API integration tests.
//!
//! These tests run the full router against a mock database: bearer-token
//! resolution, the authorize stage, and the lifecycle endpoints'
//! validate-before-write behavior.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware, Router,
};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;
use worklog_api::{auth_middleware, middleware::AppState, router as api_router};
use worklog_common::{LocalStorage, StorageBackend};
use worklog_core::{AuditService, NotifierService, ReportService, StatsService, UserService};
use worklog_db::{
    entities::{
        report,
        report::ReportStatus,
        user,
        user::Role,
    },
    repositories::{AuditLogRepository, ReportRepository, UserRepository},
};

fn test_state(db: Arc<DatabaseConnection>) -> AppState {
    let user_repo = UserRepository::new(Arc::clone(&db));
    let report_repo = ReportRepository::new(Arc::clone(&db));
    let audit_repo = AuditLogRepository::new(Arc::clone(&db));

    let user_service = UserService::new(user_repo.clone());
    let audit_service = AuditService::new(audit_repo);
    let report_service = ReportService::new(
        report_repo.clone(),
        user_repo.clone(),
        audit_service.clone(),
        NotifierService::disabled(),
    );
    let stats_service = StatsService::new(report_repo, user_repo);

    let storage = Arc::new(LocalStorage::new(
        std::env::temp_dir().join("worklog-api-tests"),
        "/files".to_string(),
    ));

    AppState {
        user_service,
        report_service,
        stats_service,
        audit_service,
        storage,
        max_attachment_bytes: 1024 * 1024,
    }
}

/// Router with the auth middleware layered, as the server wires it.
fn test_router(db: DatabaseConnection) -> Router {
    let state = test_state(Arc::new(db));
    api_router()
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state)
}

fn sample_user(id: &str, role: Role, token: &str) -> user::Model {
    user::Model {
        id: id.to_string(),
        name: "Test User".to_string(),
        email: format!("{id}@example.com"),
        username: None,
        department: "Eng".to_string(),
        role,
        supervisor_email: None,
        password_hash: "hash".to_string(),
        token: Some(token.to_string()),
        created_at: chrono::Utc::now().into(),
    }
}

fn sample_report(id: &str, owner: &str, status: ReportStatus) -> report::Model {
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
        created_at: chrono::Utc::now().into(),
        submitted_at: None,
    }
}

#[tokio::test]
async fn test_me_without_token_is_unauthorized() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let app = test_router(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/auth/me")
                .method("GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_list_mine_without_token_is_unauthorized() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let app = test_router(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/reports/mine")
                .method("GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_stats_requires_admin() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[sample_user("u1", Role::Employee, "emptoken")]])
        .into_connection();
    let app = test_router(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/stats")
                .method("GET")
                .header("Authorization", "Bearer emptoken")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_reject_without_comment_is_validation_error() {
    // Token lookup, then the report read; validation fails before any
    // write so no further query is expected.
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[sample_user("admin1", Role::Admin, "admintoken")]])
        .append_query_results([[sample_report("r1", "u1", ReportStatus::Submitted)]])
        .into_connection();
    let app = test_router(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/reports/r1/reject")
                .method("POST")
                .header("Authorization", "Bearer admintoken")
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"comment":"   "}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_approve_of_draft_is_conflict() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[sample_user("admin1", Role::Admin, "admintoken")]])
        .append_query_results([[sample_report("r1", "u1", ReportStatus::Draft)]])
        .into_connection();
    let app = test_router(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/reports/r1/approve")
                .method("POST")
                .header("Authorization", "Bearer admintoken")
                .header("Content-Type", "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_login_unknown_email_is_unauthorized() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<user::Model>::new()])
        .into_connection();
    let app = test_router(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/auth/login")
                .method("POST")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    r#"{"email":"ghost@example.com","password":"wrongpassword"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_with_invalid_json_is_rejected() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let app = test_router(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/auth/register")
                .method("POST")
                .header("Content-Type", "application/json")
                .body(Body::from("invalid json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(
        response.status() == StatusCode::BAD_REQUEST
            || response.status() == StatusCode::UNPROCESSABLE_ENTITY
    );
}

#[tokio::test]
async fn test_uploaded_attachment_is_retrievable() {
    let dir = std::env::temp_dir().join(format!("worklog-api-uploads-{}", std::process::id()));
    let storage = LocalStorage::new(dir.clone(), "/api/reports/uploads".to_string());
    let blob = storage
        .upload("01h_notes.pdf", b"%PDF-1.7", "application/pdf")
        .await
        .unwrap();
    assert_eq!(blob.url, "/api/reports/uploads/01h_notes.pdf");

    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let mut state = test_state(Arc::new(db));
    state.storage = Arc::new(storage);
    let app = api_router()
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state);

    // No token: attachment URLs are fetchable as-is.
    let response = app
        .oneshot(
            Request::builder()
                .uri("/reports/uploads/01h_notes.pdf")
                .method("GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"%PDF-1.7");

    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn test_unknown_endpoint_returns_404() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let app = test_router(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/nonexistent/endpoint")
                .method("GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
