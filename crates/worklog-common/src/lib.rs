//! Common utilities and shared types for worklog.
//!
//! This crate provides foundational components used across all worklog crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//! - **Storage**: Blob storage backends for report attachments

pub mod config;
pub mod error;
pub mod id;
pub mod storage;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
pub use storage::{generate_storage_key, LocalStorage, StorageBackend, StoredBlob};
