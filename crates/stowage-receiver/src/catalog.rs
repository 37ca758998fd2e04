//! Read side of the store: list, fetch and (unsupported) remove.

use std::sync::Arc;

use bytes::Bytes;
use futures::{StreamExt, TryStreamExt};
use stowage_storage::{ByteStream, Storage};

use crate::error::CatalogError;

#[derive(Clone)]
pub struct CatalogAdapter {
    storage: Arc<dyn Storage>,
}

impl CatalogAdapter {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        CatalogAdapter { storage }
    }

    /// Names of all objects starting with `prefix`. Empty when nothing matches.
    pub async fn list(&self, prefix: &str) -> Result<Vec<String>, CatalogError> {
        Ok(self.storage.list(prefix).await?)
    }

    /// Full content of the object at `path`.
    pub async fn read(&self, path: &str) -> Result<Bytes, CatalogError> {
        Ok(self.storage.read(path).await?)
    }

    /// Content of the object at `path` as a stream of chunks.
    pub async fn read_stream(
        &self,
        path: &str,
    ) -> Result<futures::stream::BoxStream<'static, Result<Bytes, CatalogError>>, CatalogError> {
        let stream: ByteStream = self.storage.read_stream(path).await?;
        Ok(stream.map_err(CatalogError::from).boxed())
    }

    /// Always fails with [`CatalogError::Unsupported`].
    pub async fn remove(&self, path: &str) -> Result<(), CatalogError> {
        Ok(self.storage.delete(path).await?)
    }
}
