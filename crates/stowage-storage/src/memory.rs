//! In-memory object store.
//!
//! Stands in for Google Cloud Storage in tests and dry runs: objects are kept in
//! process memory, public URLs use the GCS form, and published keys are recorded
//! so callers can check what was made public.

use crate::publish::{PublicUrl, Publisher};
use crate::remote::ObjectStoreStorage;
use crate::StorageBackend;
use object_store::memory::InMemory;
use std::sync::Arc;

impl ObjectStoreStorage {
    /// Create an empty in-memory store bound to `bucket`.
    pub fn in_memory(bucket: impl Into<String>) -> Self {
        let bucket = bucket.into();
        ObjectStoreStorage::new(
            Arc::new(InMemory::new()),
            StorageBackend::Memory,
            Some(bucket.clone()),
            PublicUrl::Gcs { bucket },
            Publisher::recorded(),
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::{ObjectMetadata, ObjectStoreStorage, Storage, StorageError};
    use bytes::Bytes;
    use futures::StreamExt;

    async fn put(storage: &ObjectStoreStorage, key: &str, data: &'static [u8]) {
        let mut sink = storage
            .writer(key, &ObjectMetadata::new("text/plain"))
            .await
            .unwrap();
        sink.write(Bytes::from_static(data)).await.unwrap();
        sink.finish().await.unwrap();
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let storage = ObjectStoreStorage::in_memory("b");
        put(&storage, "photos/cat.png", b"meow").await;

        let data = storage.read("photos/cat.png").await.unwrap();
        assert_eq!(data, Bytes::from_static(b"meow"));
    }

    #[tokio::test]
    async fn test_write_in_chunks() {
        let storage = ObjectStoreStorage::in_memory("b");
        let mut sink = storage
            .writer("docs/a.txt", &ObjectMetadata::new("text/plain"))
            .await
            .unwrap();
        sink.write(Bytes::from_static(b"hello ")).await.unwrap();
        sink.write(Bytes::from_static(b"world")).await.unwrap();
        let written = sink.finish().await.unwrap();

        assert_eq!(written, 11);
        assert_eq!(
            storage.read("docs/a.txt").await.unwrap(),
            Bytes::from_static(b"hello world")
        );
    }

    #[tokio::test]
    async fn test_empty_object() {
        let storage = ObjectStoreStorage::in_memory("b");
        let sink = storage
            .writer("photos/empty.png", &ObjectMetadata::new("image/png"))
            .await
            .unwrap();
        assert_eq!(sink.finish().await.unwrap(), 0);
        assert!(storage.read("photos/empty.png").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_aborted_write_is_not_visible() {
        let storage = ObjectStoreStorage::in_memory("b");
        let mut sink = storage
            .writer("photos/partial.png", &ObjectMetadata::new("image/png"))
            .await
            .unwrap();
        sink.write(Bytes::from_static(b"half")).await.unwrap();
        sink.abort().await.unwrap();

        let result = storage.read("photos/partial.png").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_read_missing() {
        let storage = ObjectStoreStorage::in_memory("b");
        let result = storage.read("nope.txt").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));

        let result = storage.read_stream("nope.txt").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_read_stream() {
        let storage = ObjectStoreStorage::in_memory("b");
        put(&storage, "docs/stream.txt", b"stream download test").await;

        let mut stream = storage.read_stream("docs/stream.txt").await.unwrap();
        let mut downloaded = Vec::new();
        while let Some(chunk) = stream.next().await {
            downloaded.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(downloaded, b"stream download test");
    }

    #[tokio::test]
    async fn test_list_prefix_matching() {
        let storage = ObjectStoreStorage::in_memory("b");
        assert!(storage.list("").await.unwrap().is_empty());

        put(&storage, "photos/cat.png", b"1").await;
        put(&storage, "photos/car.png", b"2").await;
        put(&storage, "photos/thumbs/cat.png", b"3").await;
        put(&storage, "docs/readme.txt", b"4").await;

        assert_eq!(
            storage.list("photos/ca").await.unwrap(),
            vec!["photos/car.png", "photos/cat.png"]
        );
        assert_eq!(
            storage.list("photos/").await.unwrap(),
            vec!["photos/car.png", "photos/cat.png", "photos/thumbs/cat.png"]
        );
        assert_eq!(storage.list("").await.unwrap().len(), 4);
        assert!(storage.list("videos/").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_make_public() {
        let storage = ObjectStoreStorage::in_memory("b");
        put(&storage, "photos/cat.png", b"meow").await;

        assert!(!storage.is_public("photos/cat.png"));
        let url = storage.make_public("photos/cat.png").await.unwrap();
        assert_eq!(url, "https://storage.googleapis.com/b/photos/cat.png");
        assert!(storage.is_public("photos/cat.png"));
    }

    #[tokio::test]
    async fn test_delete_unsupported() {
        let storage = ObjectStoreStorage::in_memory("b");
        put(&storage, "photos/cat.png", b"meow").await;

        let result = storage.delete("photos/cat.png").await;
        assert!(matches!(result, Err(StorageError::Unsupported(_))));
        assert!(storage.read("photos/cat.png").await.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_keys_rejected() {
        let storage = ObjectStoreStorage::in_memory("b");
        let result = storage.read("../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage
            .writer("/etc/passwd", &ObjectMetadata::new("text/plain"))
            .await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }
}
