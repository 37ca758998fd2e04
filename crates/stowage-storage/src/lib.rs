//! Stowage Storage Library
//!
//! This crate is the boundary to the remote object store. It defines the
//! [`Storage`] trait the upload pipeline writes through and one implementation,
//! [`ObjectStoreStorage`], built on the `object_store` crate for Google Cloud
//! Storage, S3, the local filesystem and an in-memory store.
//!
//! # Key format
//!
//! Keys are bucket-relative object names such as `photos/cat.png`. They are used
//! verbatim; callers are responsible for sanitizing file names. Keys must not be
//! empty, contain `..` segments, or start with `/`.

pub mod factory;
#[cfg(feature = "storage-gcs")]
pub mod gcs;
pub(crate) mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod memory;
pub mod publish;
pub mod remote;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use publish::{PublicUrl, Publisher};
pub use remote::ObjectStoreStorage;
pub use stowage_core::{ObjectMetadata, StorageBackend};
pub use traits::{ByteStream, ObjectSink, Storage, StorageError, StorageResult};
