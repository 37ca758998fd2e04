use crate::keys::{list_root, to_path};
use crate::publish::{PublicUrl, Publisher};
use crate::traits::{ByteStream, ObjectSink, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use futures::{StreamExt, TryStreamExt};
use object_store::buffered::BufWriter;
use object_store::Error as ObjectStoreError;
use object_store::{Attribute, AttributeValue, Attributes, ObjectStore, ObjectStoreExt};
use std::sync::Arc;
use std::time::Instant;
use stowage_core::ObjectMetadata;
use tokio::io::AsyncWriteExt;

/// Storage implementation over any `object_store` backend
pub struct ObjectStoreStorage {
    store: Arc<dyn ObjectStore>,
    backend: StorageBackend,
    bucket: Option<String>,
    public_url: PublicUrl,
    publisher: Publisher,
    supports_attributes: bool,
}

impl ObjectStoreStorage {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        backend: StorageBackend,
        bucket: Option<String>,
        public_url: PublicUrl,
        publisher: Publisher,
    ) -> Self {
        ObjectStoreStorage {
            store,
            backend,
            bucket,
            public_url,
            publisher,
            supports_attributes: true,
        }
    }

    /// Drop content type and custom metadata on write, for stores that reject
    /// object attributes (the local filesystem).
    pub fn without_attributes(mut self) -> Self {
        self.supports_attributes = false;
        self
    }

    /// Whether `key` has been made public through this handle.
    pub fn is_public(&self, key: &str) -> bool {
        self.publisher.is_published(key)
    }

    fn bucket_label(&self) -> &str {
        self.bucket.as_deref().unwrap_or("-")
    }

    fn attributes(metadata: &ObjectMetadata) -> Attributes {
        let mut attributes = Attributes::new();
        attributes.insert(
            Attribute::ContentType,
            AttributeValue::from(metadata.content_type.clone()),
        );
        for (key, value) in &metadata.custom {
            attributes.insert(
                Attribute::Metadata(key.clone().into()),
                AttributeValue::from(value.clone()),
            );
        }
        attributes
    }
}

#[async_trait]
impl Storage for ObjectStoreStorage {
    fn backend_type(&self) -> StorageBackend {
        self.backend
    }

    fn bucket(&self) -> Option<&str> {
        self.bucket.as_deref()
    }

    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        let start = Instant::now();
        let root = list_root(prefix)?;

        let objects = self
            .store
            .list(root.as_ref())
            .try_collect::<Vec<_>>()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket_label(),
                    prefix = %prefix,
                    "Object listing failed"
                );
                StorageError::BackendError(e.to_string())
            })?;

        let mut names: Vec<String> = objects
            .into_iter()
            .map(|meta| meta.location.to_string())
            .filter(|name| name.starts_with(prefix))
            .collect();
        names.sort();

        tracing::debug!(
            bucket = %self.bucket_label(),
            prefix = %prefix,
            count = names.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object listing successful"
        );

        Ok(names)
    }

    async fn read(&self, key: &str) -> StorageResult<Bytes> {
        let start = Instant::now();
        let location = to_path(key)?;

        let result = self.store.get(&location).await.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(key.to_string()),
            other => {
                tracing::error!(
                    error = %other,
                    bucket = %self.bucket_label(),
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Object download failed"
                );
                StorageError::DownloadFailed(other.to_string())
            }
        })?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

        tracing::info!(
            bucket = %self.bucket_label(),
            key = %key,
            size_bytes = bytes.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object download successful"
        );

        Ok(bytes)
    }

    async fn read_stream(&self, key: &str) -> StorageResult<ByteStream> {
        let start = Instant::now();
        let location = to_path(key)?;

        let result = self.store.get(&location).await.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(key.to_string()),
            other => StorageError::DownloadFailed(other.to_string()),
        })?;

        let bucket = self.bucket_label().to_string();
        let key = key.to_string();

        let stream = result.into_stream().map(move |res| {
            res.map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Object stream download error"
                );
                StorageError::DownloadFailed(e.to_string())
            })
        });

        Ok(stream.boxed())
    }

    async fn writer(
        &self,
        key: &str,
        metadata: &ObjectMetadata,
    ) -> StorageResult<Box<dyn ObjectSink>> {
        let location = to_path(key)?;

        let mut writer = BufWriter::new(Arc::clone(&self.store), location);
        if self.supports_attributes {
            writer = writer.with_attributes(Self::attributes(metadata));
        }

        Ok(Box::new(BufferedSink {
            writer,
            key: key.to_string(),
            bucket: self.bucket_label().to_string(),
            written: 0,
            start: Instant::now(),
        }))
    }

    async fn make_public(&self, key: &str) -> StorageResult<String> {
        to_path(key)?;

        self.publisher.publish(key).await.map_err(|e| {
            tracing::warn!(
                error = %e,
                bucket = %self.bucket_label(),
                key = %key,
                "Make public failed"
            );
            e
        })?;

        let url = self.public_url(key);
        tracing::info!(
            bucket = %self.bucket_label(),
            key = %key,
            url = %url,
            "Object made public"
        );
        Ok(url)
    }

    fn public_url(&self, key: &str) -> String {
        self.public_url.url_for(key)
    }
}

/// Streaming upload through `object_store`'s buffered writer.
///
/// Small objects go out in a single put on `finish`; larger ones switch to a
/// multipart upload once the buffer fills, so memory stays bounded.
struct BufferedSink {
    writer: BufWriter,
    key: String,
    bucket: String,
    written: u64,
    start: Instant,
}

#[async_trait]
impl ObjectSink for BufferedSink {
    async fn write(&mut self, chunk: Bytes) -> StorageResult<()> {
        self.writer.write_all(&chunk).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write {}: {}", self.key, e))
        })?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    async fn finish(mut self: Box<Self>) -> StorageResult<u64> {
        self.writer.shutdown().await.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %self.key,
                size_bytes = self.written,
                duration_ms = self.start.elapsed().as_secs_f64() * 1000.0,
                "Object upload failed"
            );
            StorageError::UploadFailed(format!("Failed to commit {}: {}", self.key, e))
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %self.key,
            size_bytes = self.written,
            duration_ms = self.start.elapsed().as_secs_f64() * 1000.0,
            "Object upload successful"
        );

        Ok(self.written)
    }

    async fn abort(mut self: Box<Self>) -> StorageResult<()> {
        self.writer
            .abort()
            .await
            .map_err(|e| StorageError::BackendError(e.to_string()))?;

        tracing::debug!(
            bucket = %self.bucket,
            key = %self.key,
            size_bytes = self.written,
            "Object upload aborted"
        );
        Ok(())
    }
}
