//! Storage wrapper that fails chosen operations.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use stowage_core::ObjectMetadata;
use stowage_storage::{
    ByteStream, ObjectSink, ObjectStoreStorage, Storage, StorageBackend, StorageError,
    StorageResult,
};

/// Delegates to an in-memory store, except that writes to `fail_writes` keys
/// fail at commit and `make_public` fails when `fail_publish` is set.
pub struct FaultyStorage {
    pub inner: Arc<ObjectStoreStorage>,
    fail_writes: BTreeSet<String>,
    fail_publish: bool,
}

impl FaultyStorage {
    pub fn new(inner: Arc<ObjectStoreStorage>) -> Self {
        FaultyStorage {
            inner,
            fail_writes: BTreeSet::new(),
            fail_publish: false,
        }
    }

    pub fn fail_write(mut self, key: &str) -> Self {
        self.fail_writes.insert(key.to_string());
        self
    }

    pub fn fail_publish(mut self) -> Self {
        self.fail_publish = true;
        self
    }
}

#[async_trait]
impl Storage for FaultyStorage {
    fn backend_type(&self) -> StorageBackend {
        self.inner.backend_type()
    }

    fn bucket(&self) -> Option<&str> {
        self.inner.bucket()
    }

    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        self.inner.list(prefix).await
    }

    async fn read(&self, key: &str) -> StorageResult<Bytes> {
        self.inner.read(key).await
    }

    async fn read_stream(&self, key: &str) -> StorageResult<ByteStream> {
        self.inner.read_stream(key).await
    }

    async fn writer(
        &self,
        key: &str,
        metadata: &ObjectMetadata,
    ) -> StorageResult<Box<dyn ObjectSink>> {
        let sink = self.inner.writer(key, metadata).await?;
        if self.fail_writes.contains(key) {
            return Ok(Box::new(FailingSink {
                inner: sink,
                key: key.to_string(),
            }));
        }
        Ok(sink)
    }

    async fn make_public(&self, key: &str) -> StorageResult<String> {
        if self.fail_publish {
            return Err(StorageError::PublishFailed {
                key: key.to_string(),
                reason: "403 Forbidden".to_string(),
            });
        }
        self.inner.make_public(key).await
    }

    fn public_url(&self, key: &str) -> String {
        self.inner.public_url(key)
    }
}

/// Accepts chunks, then fails the commit and discards the upload.
struct FailingSink {
    inner: Box<dyn ObjectSink>,
    key: String,
}

#[async_trait]
impl ObjectSink for FailingSink {
    async fn write(&mut self, chunk: Bytes) -> StorageResult<()> {
        self.inner.write(chunk).await
    }

    async fn finish(self: Box<Self>) -> StorageResult<u64> {
        let FailingSink { inner, key } = *self;
        inner.abort().await?;
        Err(StorageError::UploadFailed(format!(
            "connection reset while committing {}",
            key
        )))
    }

    async fn abort(self: Box<Self>) -> StorageResult<()> {
        self.inner.abort().await
    }
}
