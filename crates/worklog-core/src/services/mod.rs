//! Business logic services.

pub mod audit;
pub mod lifecycle;
pub mod notifier;
pub mod report;
pub mod stats;
pub mod user;

pub use audit::AuditService;
pub use lifecycle::{check_transition, Transition};
pub use notifier::NotifierService;
pub use report::{
    CreateReportInput, OwnerSummary, ReportQuery, ReportService, ReportView, TagsInput,
    UpdateReportInput,
};
pub use stats::{Dashboard, DepartmentStats, OverallStats, StatsService, UserStats};
pub use user::{AuthenticatedUser, RegisterInput, UpdateProfileInput, UserService};
