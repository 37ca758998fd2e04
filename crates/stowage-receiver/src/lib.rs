//! Stowage Receiver Library
//!
//! The producer-facing side of Stowage. A [`ReceiverStage`] hands out
//! [`FileSink`]s; every file written into a sink runs through the
//! [`UploadPipeline`], which fans the single-read source out to one branch per
//! variant, transforms and writes each branch, and settles once every variant
//! has a definitive [`UploadOutcome`].
//!
//! [`CatalogAdapter`] covers the read side: listing and fetching stored objects.

pub mod catalog;
pub mod error;
pub mod pipeline;
pub mod receiver;
pub mod tee;
pub mod types;
pub mod writer;

// Re-export commonly used types
pub use catalog::CatalogAdapter;
pub use error::{CatalogError, PipelineError, ReceiverError, VariantError, WriteError};
pub use pipeline::UploadPipeline;
pub use receiver::{FileSink, ReceiveSummary, ReceiverStage};
pub use types::{IncomingFile, PipelineResult, ReceivedFile, SourceStream, UploadOutcome};
pub use writer::ObjectWriter;
