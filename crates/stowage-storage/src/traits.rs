//! Storage abstraction trait
//!
//! This module defines the Storage trait every backend implements and the
//! streaming sink returned for writes.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use stowage_core::{ConfigurationError, ObjectMetadata};
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Failed to make {key} public: {reason}")]
    PublishFailed { key: String, reason: String },

    #[error("Operation not supported: {0}")]
    Unsupported(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigurationError),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Stream of object bytes.
pub type ByteStream = BoxStream<'static, StorageResult<Bytes>>;

/// Storage abstraction trait
///
/// One instance is built per process and shared read-only (`Arc<dyn Storage>`)
/// across every pipeline; implementations hold no per-request state.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;

    /// Bucket this handle writes to, if the backend has buckets.
    fn bucket(&self) -> Option<&str>;

    /// Names of all objects whose name starts with `prefix`.
    ///
    /// A prefix matching nothing yields an empty list.
    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>>;

    /// Download an object fully into memory.
    async fn read(&self, key: &str) -> StorageResult<Bytes>;

    /// Download an object as a stream of chunks.
    async fn read_stream(&self, key: &str) -> StorageResult<ByteStream>;

    /// Open a write stream to `key`.
    ///
    /// Nothing becomes visible at `key` until [`ObjectSink::finish`] succeeds.
    async fn writer(&self, key: &str, metadata: &ObjectMetadata)
        -> StorageResult<Box<dyn ObjectSink>>;

    /// Make an object publicly readable and return its public URL.
    async fn make_public(&self, key: &str) -> StorageResult<String>;

    /// Public URL of an object, whether or not it is public yet.
    fn public_url(&self, key: &str) -> String;

    /// Delete an object. Not supported by any backend yet.
    async fn delete(&self, key: &str) -> StorageResult<()> {
        Err(StorageError::Unsupported(format!("delete of {}", key)))
    }
}

/// Write side of a single object upload.
#[async_trait]
pub trait ObjectSink: Send {
    /// Append a chunk to the object.
    async fn write(&mut self, chunk: Bytes) -> StorageResult<()>;

    /// Commit the object and return the number of bytes written.
    async fn finish(self: Box<Self>) -> StorageResult<u64>;

    /// Discard everything written so far.
    async fn abort(self: Box<Self>) -> StorageResult<()>;
}
