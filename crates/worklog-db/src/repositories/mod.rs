//! Database repositories.

mod audit_log;
mod report;
mod user;

pub use audit_log::AuditLogRepository;
pub use report::{DepartmentCount, ReportFilter, ReportRepository, UserCount, WeeklyCount};
pub use user::UserRepository;
