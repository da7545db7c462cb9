//! Core business logic for worklog.

pub mod services;

pub use services::*;
