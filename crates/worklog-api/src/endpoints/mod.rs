//! API endpoints.

mod audit;
mod auth;
mod reports;
mod stats;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/reports", reports::router())
        .nest("/stats", stats::router())
        .nest("/audit", audit::router())
}
