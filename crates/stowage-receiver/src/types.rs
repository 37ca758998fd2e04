use std::collections::BTreeMap;
use std::io;

use bytes::Bytes;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use stowage_processing::VariantKind;
use stowage_storage::StorageError;

use crate::error::VariantError;

/// Single-read byte source of an incoming file.
pub type SourceStream = BoxStream<'static, io::Result<Bytes>>;

/// One file delivered by the producer.
pub struct IncomingFile {
    /// Used verbatim in destination paths; the producer sanitizes it.
    pub id: String,
    pub stream: SourceStream,
    /// Overrides the content type guessed from the id's extension.
    pub content_type: Option<String>,
}

impl IncomingFile {
    pub fn new<S>(id: impl Into<String>, stream: S) -> Self
    where
        S: Stream<Item = io::Result<Bytes>> + Send + 'static,
    {
        IncomingFile {
            id: id.into(),
            stream: stream.boxed(),
            content_type: None,
        }
    }

    /// File whose whole content is already in memory.
    pub fn from_bytes(id: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Self::new(id, stream::once(async move { Ok(data) }))
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

impl std::fmt::Debug for IncomingFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IncomingFile")
            .field("id", &self.id)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Result of writing one variant.
#[derive(Debug)]
pub struct UploadOutcome {
    pub kind: VariantKind,
    pub destination: String,
    pub succeeded: bool,
    pub error: Option<VariantError>,
    /// Set once the object is committed.
    pub written_path: Option<String>,
    /// Set once the object is made public.
    pub public_url: Option<String>,
    /// Make-public failure. Never affects `succeeded`.
    pub public_error: Option<StorageError>,
    pub bytes_written: u64,
}

impl UploadOutcome {
    pub fn failed(kind: VariantKind, destination: &str, error: VariantError) -> Self {
        UploadOutcome {
            kind,
            destination: destination.to_string(),
            succeeded: false,
            error: Some(error),
            written_path: None,
            public_url: None,
            public_error: None,
            bytes_written: 0,
        }
    }

    pub fn written(kind: VariantKind, destination: &str, bytes_written: u64) -> Self {
        UploadOutcome {
            kind,
            destination: destination.to_string(),
            succeeded: true,
            error: None,
            written_path: Some(destination.to_string()),
            public_url: None,
            public_error: None,
            bytes_written,
        }
    }
}

/// Settled result of one file's upload.
#[derive(Debug)]
pub struct PipelineResult {
    pub file_id: String,
    /// One per planned variant, in plan order.
    pub outcomes: Vec<UploadOutcome>,
    pub succeeded: bool,
    /// Public URL of the original, set only when it was made public.
    pub primary_location: Option<String>,
    /// Canonical public URL form of the original, public or not.
    pub location: String,
    /// Flattened metadata of the original object, `contentType` included.
    pub metadata: BTreeMap<String, String>,
}

impl PipelineResult {
    pub fn outcome(&self, kind: VariantKind) -> Option<&UploadOutcome> {
        self.outcomes.iter().find(|o| o.kind == kind)
    }
}

/// What the producer gets back for a file that was fully stored.
#[derive(Debug)]
pub struct ReceivedFile {
    pub id: String,
    pub location: String,
    pub primary_location: Option<String>,
    pub metadata: BTreeMap<String, String>,
    pub outcomes: Vec<UploadOutcome>,
}

impl From<PipelineResult> for ReceivedFile {
    fn from(result: PipelineResult) -> Self {
        ReceivedFile {
            id: result.file_id,
            location: result.location,
            primary_location: result.primary_location,
            metadata: result.metadata,
            outcomes: result.outcomes,
        }
    }
}
