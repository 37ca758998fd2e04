use crate::publish::{PublicUrl, Publisher};
use crate::remote::ObjectStoreStorage;
use crate::traits::{StorageError, StorageResult};
use crate::StorageBackend;
use object_store::aws::AmazonS3Builder;
use std::sync::Arc;
use stowage_core::ConfigurationError;

impl ObjectStoreStorage {
    /// Create an S3-backed store
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    ///
    /// S3 has no per-object "make public" call here; public reads are expected to
    /// be granted by bucket policy, so publishing only reports the URL.
    pub fn s3(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region.clone())
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder.build().map_err(|e| {
            StorageError::ConfigError(ConfigurationError::invalid("S3", e.to_string()))
        })?;

        tracing::info!(bucket = %bucket, region = %region, "S3 storage initialized");

        Ok(ObjectStoreStorage::new(
            Arc::new(store),
            StorageBackend::S3,
            Some(bucket.clone()),
            PublicUrl::S3 {
                bucket,
                region,
                endpoint: endpoint_url,
            },
            Publisher::Implicit,
        ))
    }
}
