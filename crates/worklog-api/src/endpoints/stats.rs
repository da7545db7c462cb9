//! Statistics endpoints. Admin only.

use axum::{
    extract::{Query, State},
    routing::get,
    Router,
};
use serde::Deserialize;
use worklog_common::AppResult;
use worklog_core::{Dashboard, DepartmentStats, OverallStats, UserStats};
use worklog_db::repositories::WeeklyCount;

use crate::{extractors::AdminUser, middleware::AppState, response::ApiResponse};

/// The full dashboard: overall, weekly, departments and team numbers.
async fn dashboard(
    AdminUser(_user): AdminUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Dashboard>> {
    Ok(ApiResponse::ok(state.stats_service.dashboard().await?))
}

/// Week-by-week report counts.
async fn weekly(
    AdminUser(_user): AdminUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<WeeklyCount>>> {
    Ok(ApiResponse::ok(state.stats_service.weekly().await?))
}

/// Per-department report counts.
async fn departments(
    AdminUser(_user): AdminUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<DepartmentStats>>> {
    Ok(ApiResponse::ok(state.stats_service.departments().await?))
}

/// Overall totals and submission rate.
async fn overall(
    AdminUser(_user): AdminUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<OverallStats>> {
    Ok(ApiResponse::ok(state.stats_service.overall().await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct TeamQuery {
    pub department: Option<String>,
}

/// Per-user report counts, optionally scoped to one department.
async fn team(
    AdminUser(_user): AdminUser,
    State(state): State<AppState>,
    Query(query): Query<TeamQuery>,
) -> AppResult<ApiResponse<Vec<UserStats>>> {
    let department = query.department.as_deref().filter(|d| !d.is_empty());
    Ok(ApiResponse::ok(state.stats_service.team(department).await?))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard))
        .route("/weekly", get(weekly))
        .route("/departments", get(departments))
        .route("/overall", get(overall))
        .route("/team", get(team))
}
