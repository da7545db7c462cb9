//! Audit trail endpoints. Admin only.

use axum::{
    extract::{Query, State},
    routing::get,
    Router,
};
use serde::Deserialize;
use worklog_common::AppResult;
use worklog_db::entities::audit_log;

use crate::{extractors::AdminUser, middleware::AppState, response::ApiResponse};

const DEFAULT_LIMIT: u64 = 100;
const MAX_LIMIT: u64 = 1000;

#[derive(Debug, Default, Deserialize)]
pub struct AuditQuery {
    pub limit: Option<u64>,
}

/// Most recent audit entries, newest first.
async fn recent(
    AdminUser(_user): AdminUser,
    State(state): State<AppState>,
    Query(query): Query<AuditQuery>,
) -> AppResult<ApiResponse<Vec<audit_log::Model>>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    Ok(ApiResponse::ok(state.audit_service.recent(limit).await?))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(recent))
}
