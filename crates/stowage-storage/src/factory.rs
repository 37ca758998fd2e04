use crate::{ObjectStoreStorage, Storage, StorageBackend, StorageError, StorageResult};
use std::sync::Arc;
use stowage_core::{ConfigurationError, StoreConfig};

/// Create a storage backend based on configuration
pub async fn create_storage(config: &StoreConfig) -> StorageResult<Arc<dyn Storage>> {
    config.validate()?;

    let bucket = || {
        config
            .bucket
            .clone()
            .ok_or_else(|| StorageError::ConfigError(ConfigurationError::Missing("STORAGE_BUCKET".to_string())))
    };

    match config.storage_backend {
        #[cfg(feature = "storage-gcs")]
        StorageBackend::Gcs => {
            let storage = ObjectStoreStorage::gcs(
                bucket()?,
                config.gcs_credentials_file.as_deref(),
                config.gcs_project_id.as_deref(),
            )?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-gcs"))]
        StorageBackend::Gcs => Err(StorageError::ConfigError(
            ConfigurationError::BackendUnavailable(
                "GCS storage backend not available (storage-gcs feature not enabled)".to_string(),
            ),
        )),

        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let region = config.s3_region.clone().ok_or_else(|| {
                StorageError::ConfigError(ConfigurationError::Missing(
                    "S3_REGION or AWS_REGION".to_string(),
                ))
            })?;
            let storage = ObjectStoreStorage::s3(bucket()?, region, config.s3_endpoint.clone())?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => Err(StorageError::ConfigError(
            ConfigurationError::BackendUnavailable(
                "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
            ),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_path = config.local_storage_path.clone().ok_or_else(|| {
                StorageError::ConfigError(ConfigurationError::Missing(
                    "LOCAL_STORAGE_PATH".to_string(),
                ))
            })?;
            let base_url = config.local_storage_base_url.clone().ok_or_else(|| {
                StorageError::ConfigError(ConfigurationError::Missing(
                    "LOCAL_STORAGE_BASE_URL".to_string(),
                ))
            })?;

            let storage = ObjectStoreStorage::local(base_path, base_url).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            ConfigurationError::BackendUnavailable(
                "Local storage backend not available (storage-local feature not enabled)"
                    .to_string(),
            ),
        )),

        StorageBackend::Memory => {
            let bucket = config.bucket.clone().unwrap_or_else(|| "memory".to_string());
            Ok(Arc::new(ObjectStoreStorage::in_memory(bucket)))
        }
    }
}
