//! Stowage Core Library
//!
//! This crate provides the configuration, error types and shared constants used by
//! every Stowage component: the storage backends, the image variant planner and the
//! upload receiver.

pub mod config;
pub mod constants;
pub mod content_type;
pub mod error;
pub mod metadata;
pub mod storage_types;

// Re-export commonly used types
pub use config::{EffectiveOptions, FailurePolicy, PublishMode, StoreConfig, UploadOptions};
pub use content_type::content_type_for;
pub use error::ConfigurationError;
pub use metadata::ObjectMetadata;
pub use storage_types::StorageBackend;
