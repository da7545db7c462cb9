//! API middleware.

use std::sync::Arc;

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use worklog_common::StorageBackend;
use worklog_core::{AuditService, ReportService, StatsService, UserService};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub report_service: ReportService,
    pub stats_service: StatsService,
    pub audit_service: AuditService,
    pub storage: Arc<dyn StorageBackend>,
    /// Upload size cap in bytes.
    pub max_attachment_bytes: u64,
}

/// Authentication middleware.
///
/// Resolves a `Bearer` token to its user and stashes the user in the
/// request extensions. Requests without a valid token pass through
/// unauthenticated; protected handlers reject them via the extractor.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(ToString::to_string);

    if let Some(token) = token {
        if let Ok(user) = state.user_service.authenticate_by_token(&token).await {
            req.extensions_mut().insert(user);
        }
    }

    next.run(req).await
}
