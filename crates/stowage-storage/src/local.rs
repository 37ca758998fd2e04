use crate::publish::{PublicUrl, Publisher};
use crate::remote::ObjectStoreStorage;
use crate::traits::{StorageError, StorageResult};
use crate::StorageBackend;
use object_store::local::LocalFileSystem;
use std::path::PathBuf;
use std::sync::Arc;
use stowage_core::ConfigurationError;
use tokio::fs;

impl ObjectStoreStorage {
    /// Create a local filesystem store
    ///
    /// # Arguments
    /// * `base_path` - Root directory for object storage (e.g., "/var/lib/stowage")
    /// * `base_url` - Base URL the directory is served from (e.g., "http://localhost:3000/media")
    ///
    /// Object attributes are not persisted on the local filesystem.
    pub async fn local(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(ConfigurationError::invalid(
                "LOCAL_STORAGE_PATH",
                format!(
                    "failed to create storage directory {}: {}",
                    base_path.display(),
                    e
                ),
            ))
        })?;

        let store = LocalFileSystem::new_with_prefix(&base_path).map_err(|e| {
            StorageError::ConfigError(ConfigurationError::invalid(
                "LOCAL_STORAGE_PATH",
                e.to_string(),
            ))
        })?;

        tracing::info!(path = %base_path.display(), "Local storage initialized");

        Ok(ObjectStoreStorage::new(
            Arc::new(store),
            StorageBackend::Local,
            None,
            PublicUrl::Base { base_url },
            Publisher::Implicit,
        )
        .without_attributes())
    }
}
