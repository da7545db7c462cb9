//! Blob storage abstraction for report attachments.
//!
//! Attachments are stored under opaque generated keys; the report record
//! keeps the metadata. Blobs are never overwritten once written.

use std::path::PathBuf;

use crate::{AppError, AppResult};

/// Stored blob metadata.
#[derive(Debug, Clone)]
pub struct StoredBlob {
    /// Storage key (path or object key).
    pub key: String,
    /// Public URL to access the blob.
    pub url: String,
    /// Blob size in bytes.
    pub size: u64,
    /// MIME content type.
    pub content_type: String,
}

/// Storage backend trait.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Upload a blob.
    async fn upload(&self, key: &str, data: &[u8], content_type: &str) -> AppResult<StoredBlob>;

    /// Read a blob back by key.
    async fn download(&self, key: &str) -> AppResult<Vec<u8>>;

    /// Delete a blob.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Get the public URL for a key.
    fn public_url(&self, key: &str) -> String;

    /// Check if a blob exists.
    async fn exists(&self, key: &str) -> AppResult<bool>;
}

/// Local filesystem storage backend.
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new local storage backend.
    #[must_use]
    pub const fn new(base_path: PathBuf, base_url: String) -> Self {
        Self { base_path, base_url }
    }
}

#[async_trait::async_trait]
impl StorageBackend for LocalStorage {
    async fn upload(&self, key: &str, data: &[u8], content_type: &str) -> AppResult<StoredBlob> {
        let path = self.base_path.join(key);

        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Internal(format!("Failed to create directory: {e}")))?;
        }

        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to write file: {e}")))?;

        Ok(StoredBlob {
            key: key.to_string(),
            url: self.public_url(key),
            size: data.len() as u64,
            content_type: content_type.to_string(),
        })
    }

    async fn download(&self, key: &str) -> AppResult<Vec<u8>> {
        // Keys arrive from the request path; refuse anything that could
        // escape the storage root.
        if key.is_empty() || key.starts_with('/') || key.contains("..") || key.contains('\\') {
            return Err(AppError::BadRequest(format!("malformed storage key: {key}")));
        }

        let path = self.base_path.join(key);
        tokio::fs::read(&path)
            .await
            .map_err(|_| AppError::NotFound(format!("no stored file for key: {key}")))
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let path = self.base_path.join(key);
        if path.exists() {
            tokio::fs::remove_file(&path)
                .await
                .map_err(|e| AppError::Internal(format!("Failed to delete file: {e}")))?;
        }
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        let path = self.base_path.join(key);
        Ok(path.exists())
    }
}

/// Generate a storage key for an uploaded file.
///
/// The original filename is sanitized and prefixed with a unique ID so
/// distinct uploads of the same file never collide.
#[must_use]
pub fn generate_storage_key(id: &str, original_name: &str) -> String {
    let safe: String = original_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{id}_{safe}")
}
