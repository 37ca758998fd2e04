/// Errors raised while deriving an image variant.
///
/// Transform errors are local to one variant: they never abort sibling variants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransformError {
    #[error("Source image is empty")]
    EmptyInput,

    #[error("Source image exceeds the {limit} byte buffer limit")]
    TooLarge { limit: usize },

    #[error("Unsupported image format")]
    UnsupportedFormat,

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("Transform task failed: {0}")]
    Task(String),
}
