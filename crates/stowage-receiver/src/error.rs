use std::io;
use std::sync::Arc;

use stowage_core::ConfigurationError;
use stowage_processing::TransformError;
use stowage_storage::StorageError;
use thiserror::Error;

use crate::types::UploadOutcome;

/// Failure while streaming one variant into the store.
#[derive(Debug, Error)]
pub enum WriteError {
    /// The incoming file's stream failed. Every variant of the file sees the
    /// same error.
    #[error("Source stream failed: {0}")]
    Source(Arc<io::Error>),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Why a single variant failed. Local to that variant.
#[derive(Debug, Error)]
pub enum VariantError {
    #[error("Transform failed: {0}")]
    Transform(#[from] TransformError),

    #[error("Write failed: {0}")]
    Write(#[from] WriteError),
}

/// Aggregate failure of one file's upload.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// One or more variants failed. Carries every outcome, successful ones
    /// included, so callers can see which objects were written.
    #[error("Upload of {file_id} failed: {}", describe_failures(.outcomes))]
    VariantUpload {
        file_id: String,
        outcomes: Vec<UploadOutcome>,
    },
}

impl PipelineError {
    pub fn file_id(&self) -> &str {
        match self {
            PipelineError::VariantUpload { file_id, .. } => file_id,
        }
    }

    pub fn outcomes(&self) -> &[UploadOutcome] {
        match self {
            PipelineError::VariantUpload { outcomes, .. } => outcomes,
        }
    }

    /// Outcomes of the variants that failed.
    pub fn failed(&self) -> impl Iterator<Item = &UploadOutcome> {
        self.outcomes().iter().filter(|o| !o.succeeded)
    }
}

fn describe_failures(outcomes: &[UploadOutcome]) -> String {
    outcomes
        .iter()
        .filter(|o| !o.succeeded)
        .map(|o| match &o.error {
            Some(err) => format!("{} variant ({}): {}", o.kind, o.destination, err),
            None => format!("{} variant ({})", o.kind, o.destination),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors surfaced to the producer.
#[derive(Debug, Error)]
pub enum ReceiverError {
    #[error("Invalid upload options: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// An earlier file failed under the abort-batch policy.
    #[error("Receiver is closed after an earlier upload failure")]
    Closed,
}

/// Errors from catalog reads.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Operation not supported: {0}")]
    Unsupported(String),

    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for CatalogError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => CatalogError::NotFound(key),
            StorageError::Unsupported(op) => CatalogError::Unsupported(op),
            other => CatalogError::Storage(other),
        }
    }
}
