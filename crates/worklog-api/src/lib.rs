//! HTTP API layer for worklog.
//!
//! This crate provides the REST API:
//!
//! - **Endpoints**: auth, reports, statistics, audit trail
//! - **Extractors**: bearer-token authentication, admin gating
//! - **Middleware**: token resolution, logging, CORS
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::{auth_middleware, AppState};
