//! Stowage Media Processing Library
//!
//! This crate decides which variants an upload produces ([`VariantPlan`]) and
//! derives the image variants ([`ImageTransformer`]).

pub mod error;
pub mod image;
pub mod traits;
pub mod variant;

// Re-export commonly used types
pub use error::TransformError;
pub use self::image::{ImageResize, ImageTransformer};
pub use traits::MediaTransformer;
pub use variant::{Transform, VariantKind, VariantPlan, VariantSpec};
