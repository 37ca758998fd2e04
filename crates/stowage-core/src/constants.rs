//! Shared constants for object layout and variant generation.

/// Folder the original variant is written under when none is configured.
pub const DEFAULT_FOLDER: &str = "photos";

/// Longest edge of the resized variant when none is configured.
pub const DEFAULT_RESIZE_DIMENSION: u32 = 900;

/// Edge length of the square thumbnail variant.
pub const THUMBNAIL_SIZE: u32 = 100;

/// Prefix of resized variants. Independent of the configured folder.
pub const RESIZED_PREFIX: &str = "photos/resized";

/// Prefix of thumbnail variants. Independent of the configured folder.
pub const THUMBS_PREFIX: &str = "photos/thumbs";

/// Host serving publicly readable Google Cloud Storage objects.
pub const GCS_PUBLIC_HOST: &str = "https://storage.googleapis.com";

/// Metadata key carrying the object's content type.
pub const CONTENT_TYPE_KEY: &str = "contentType";

pub const DEFAULT_MAX_IN_FLIGHT: usize = 1;

/// Largest source buffered in memory to derive image variants (64 MiB).
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 64 * 1024 * 1024;
