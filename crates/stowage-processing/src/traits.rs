//! Core traits for media processing

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::TransformError;
use crate::variant::Transform;

/// Media transformer trait - applies one named transform to a fully buffered
/// source.
///
/// The upload pipeline holds its transformer behind this trait so the image
/// backend can be swapped.
#[async_trait]
pub trait MediaTransformer: Send + Sync {
    /// Apply `transform` to `data`.
    async fn transform(&self, transform: &Transform, data: Bytes) -> Result<Bytes, TransformError>;

    /// Apply every transform in `transforms` to the same source. Results are in
    /// the order of `transforms`.
    ///
    /// The default runs [`transform`](Self::transform) once per entry.
    /// Implementations that decode should override it to decode once.
    async fn transform_all(
        &self,
        transforms: &[Transform],
        data: Bytes,
    ) -> Vec<Result<Bytes, TransformError>> {
        let mut results = Vec::with_capacity(transforms.len());
        for transform in transforms {
            results.push(self.transform(transform, data.clone()).await);
        }
        results
    }
}
