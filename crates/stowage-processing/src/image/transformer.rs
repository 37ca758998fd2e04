//! Image transformer - runs variant transforms on the blocking pool
//!
//! Output keeps the source format. A bounded resize of an image that already
//! fits returns the source bytes untouched.

use crate::error::TransformError;
use crate::image::resize::ImageResize;
use crate::traits::MediaTransformer;
use crate::variant::Transform;
use async_trait::async_trait;
use bytes::Bytes;
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;
use std::time::Instant;

/// Transformer backed by the `image` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageTransformer;

impl ImageTransformer {
    pub fn new() -> Self {
        ImageTransformer
    }

    /// Synchronous transform. CPU-bound; call from a blocking context.
    pub fn apply(transform: &Transform, data: Bytes) -> Result<Bytes, TransformError> {
        if transform.is_identity() {
            return Ok(data);
        }
        if data.is_empty() {
            return Err(TransformError::EmptyInput);
        }

        let (img, format) = Self::decode(&data)?;
        Self::apply_decoded(transform, &img, format, &data)
    }

    /// Apply several transforms to one source, decoding it at most once.
    pub fn apply_all(transforms: &[Transform], data: Bytes) -> Vec<Result<Bytes, TransformError>> {
        if transforms.iter().all(Transform::is_identity) {
            return transforms.iter().map(|_| Ok(data.clone())).collect();
        }

        let decoded = if data.is_empty() {
            Err(TransformError::EmptyInput)
        } else {
            Self::decode(&data)
        };

        transforms
            .iter()
            .map(|transform| {
                if transform.is_identity() {
                    return Ok(data.clone());
                }
                let (img, format) = decoded.as_ref().map_err(|e| e.clone())?;
                Self::apply_decoded(transform, img, *format, &data)
            })
            .collect()
    }

    fn apply_decoded(
        transform: &Transform,
        img: &DynamicImage,
        format: ImageFormat,
        data: &Bytes,
    ) -> Result<Bytes, TransformError> {
        let output = match *transform {
            Transform::Identity => return Ok(data.clone()),
            Transform::ResizeBounded { max_dimension } => {
                match ImageResize::shrink_to_fit(img, max_dimension) {
                    Some(resized) => resized,
                    None => {
                        tracing::debug!(
                            width = img.width(),
                            height = img.height(),
                            max_dimension = max_dimension,
                            "Image within bounds, keeping source bytes"
                        );
                        return Ok(data.clone());
                    }
                }
            }
            Transform::ResizeCropSquare { size } => ImageResize::crop_square(img, size),
        };

        Self::encode(&output, format)
    }

    fn decode(data: &[u8]) -> Result<(DynamicImage, ImageFormat), TransformError> {
        let reader = image::ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| TransformError::Decode(e.to_string()))?;
        let format = reader.format().ok_or(TransformError::UnsupportedFormat)?;
        let img = reader
            .decode()
            .map_err(|e| TransformError::Decode(e.to_string()))?;
        Ok((img, format))
    }

    fn encode(img: &DynamicImage, format: ImageFormat) -> Result<Bytes, TransformError> {
        let (width, height) = img.dimensions();
        let mut buffer = Vec::with_capacity(width as usize * height as usize * 3);
        let mut cursor = Cursor::new(&mut buffer);

        // JPEG has no alpha channel
        let result = if format == ImageFormat::Jpeg && img.color().has_alpha() {
            DynamicImage::ImageRgb8(img.to_rgb8()).write_to(&mut cursor, format)
        } else {
            img.write_to(&mut cursor, format)
        };
        result.map_err(|e| TransformError::Encode(e.to_string()))?;

        Ok(Bytes::from(buffer))
    }
}

#[async_trait]
impl MediaTransformer for ImageTransformer {
    async fn transform(&self, transform: &Transform, data: Bytes) -> Result<Bytes, TransformError> {
        if transform.is_identity() {
            return Ok(data);
        }

        let start = Instant::now();
        let transform = *transform;
        let input_bytes = data.len();

        // Decode and resize are CPU-bound
        let output = tokio::task::spawn_blocking(move || Self::apply(&transform, data))
            .await
            .map_err(|e| TransformError::Task(e.to_string()))??;

        tracing::debug!(
            transform = ?transform,
            input_bytes = input_bytes,
            output_bytes = output.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Image transform complete"
        );

        Ok(output)
    }

    async fn transform_all(
        &self,
        transforms: &[Transform],
        data: Bytes,
    ) -> Vec<Result<Bytes, TransformError>> {
        let start = Instant::now();
        let owned = transforms.to_vec();
        let input_bytes = data.len();

        // One decode shared by every transform
        match tokio::task::spawn_blocking(move || Self::apply_all(&owned, data)).await {
            Ok(results) => {
                tracing::debug!(
                    transforms = transforms.len(),
                    input_bytes = input_bytes,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Image transforms complete"
                );
                results
            }
            Err(e) => transforms
                .iter()
                .map(|_| Err(TransformError::Task(e.to_string())))
                .collect(),
        }
    }
}
