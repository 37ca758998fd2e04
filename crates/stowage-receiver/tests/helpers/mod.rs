//! Test helpers: fault-injecting storage and image fixtures.
//!
//! Run from workspace root: `cargo test -p stowage-receiver`.

#![allow(dead_code)]

pub mod faulty;
pub mod fixtures;

use std::sync::Arc;

use stowage_core::UploadOptions;
use stowage_receiver::ReceiverStage;
use stowage_storage::ObjectStoreStorage;

pub use faulty::FaultyStorage;

/// Options of the canonical scenario: bucket `b`, folder `photos`, resize to
/// 900, public.
pub fn scenario_options() -> UploadOptions {
    UploadOptions {
        bucket: Some("b".to_string()),
        folder: Some("photos".to_string()),
        resize: Some(true),
        resize_dimension: Some(900),
        public: Some(true),
        ..Default::default()
    }
}

/// Stage over a fresh in-memory store bound to bucket `b`.
pub fn memory_stage(defaults: UploadOptions) -> (Arc<ObjectStoreStorage>, ReceiverStage) {
    let storage = Arc::new(ObjectStoreStorage::in_memory("b"));
    let stage = ReceiverStage::new(storage.clone(), defaults);
    (storage, stage)
}
