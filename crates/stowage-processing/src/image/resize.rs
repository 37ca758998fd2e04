use image::{imageops, DynamicImage, GenericImageView};

/// Image resize operations
pub struct ImageResize;

impl ImageResize {
    /// Target dimensions that fit the image within a `max`×`max` box, keeping
    /// the aspect ratio.
    ///
    /// Returns `None` when the image already fits; images are never enlarged.
    pub fn fit_within(orig_width: u32, orig_height: u32, max: u32) -> Option<(u32, u32)> {
        if orig_width <= max && orig_height <= max {
            return None;
        }

        if orig_width >= orig_height {
            let aspect_ratio = orig_height as f64 / orig_width as f64;
            let h = (max as f64 * aspect_ratio).round() as u32;
            Some((max, h.max(1)))
        } else {
            let aspect_ratio = orig_width as f64 / orig_height as f64;
            let w = (max as f64 * aspect_ratio).round() as u32;
            Some((w.max(1), max))
        }
    }

    /// Select appropriate filter type based on resize ratio
    pub fn select_filter(
        orig_width: u32,
        orig_height: u32,
        new_width: u32,
        new_height: u32,
    ) -> imageops::FilterType {
        let width_ratio = orig_width as f32 / new_width as f32;
        let height_ratio = orig_height as f32 / new_height as f32;
        let max_ratio = width_ratio.max(height_ratio);

        if max_ratio > 2.0 {
            imageops::FilterType::Triangle
        } else if max_ratio > 1.5 {
            imageops::FilterType::CatmullRom
        } else {
            imageops::FilterType::Lanczos3
        }
    }

    /// Shrink so the longer edge is at most `max`. `None` when nothing to do.
    pub fn shrink_to_fit(img: &DynamicImage, max: u32) -> Option<DynamicImage> {
        let (orig_width, orig_height) = img.dimensions();
        let (width, height) = Self::fit_within(orig_width, orig_height, max)?;
        let filter = Self::select_filter(orig_width, orig_height, width, height);
        Some(img.resize_exact(width, height, filter))
    }

    /// Scale to cover a `size`×`size` square, then center-crop to it.
    pub fn crop_square(img: &DynamicImage, size: u32) -> DynamicImage {
        let (orig_width, orig_height) = img.dimensions();
        let filter = Self::select_filter(orig_width, orig_height, size, size);
        img.resize_to_fill(size, size, filter)
    }
}
