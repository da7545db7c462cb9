//! Database entities.

pub mod audit_log;
pub mod report;
pub mod user;

pub use audit_log::Entity as AuditLog;
pub use report::Entity as Report;
pub use user::Entity as User;
