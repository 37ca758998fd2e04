//! Image processing module
//!
//! - Resize geometry and filter selection (resize)
//! - Transform execution on the blocking pool (transformer)

pub mod resize;
pub mod transformer;

pub use resize::ImageResize;
pub use transformer::ImageTransformer;
