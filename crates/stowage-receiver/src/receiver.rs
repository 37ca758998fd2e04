//! Producer-facing receiver.
//!
//! A [`ReceiverStage`] is built once per process around the shared storage
//! handle. Each call to [`ReceiverStage::receive`] resolves call-time options
//! over the stage defaults and returns a [`FileSink`] the producer writes files
//! into. `write` resolving is the producer's signal to send the next file.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::{future, Stream, StreamExt};
use stowage_core::{EffectiveOptions, FailurePolicy, UploadOptions};
use stowage_processing::{ImageTransformer, MediaTransformer};
use stowage_storage::Storage;

use crate::error::{PipelineError, ReceiverError};
use crate::pipeline::UploadPipeline;
use crate::types::{IncomingFile, ReceivedFile};

pub struct ReceiverStage {
    storage: Arc<dyn Storage>,
    pipeline: Arc<UploadPipeline>,
    defaults: UploadOptions,
}

impl ReceiverStage {
    pub fn new(storage: Arc<dyn Storage>, defaults: UploadOptions) -> Self {
        Self::with_transformer(storage, Arc::new(ImageTransformer), defaults)
    }

    pub fn with_transformer(
        storage: Arc<dyn Storage>,
        transformer: Arc<dyn MediaTransformer>,
        defaults: UploadOptions,
    ) -> Self {
        ReceiverStage {
            pipeline: Arc::new(UploadPipeline::new(Arc::clone(&storage), transformer)),
            storage,
            defaults,
        }
    }

    pub fn defaults(&self) -> &UploadOptions {
        &self.defaults
    }

    /// Open a sink. `overrides` win over the stage defaults; the merged options
    /// are validated before any file is accepted.
    pub fn receive(&self, overrides: &UploadOptions) -> Result<FileSink, ReceiverError> {
        let options = overrides
            .merge_over(&self.defaults)
            .resolve(self.storage.bucket())?;

        tracing::debug!(
            bucket = %options.bucket,
            folder = %options.folder,
            resize = options.resize,
            public = options.public,
            publish_mode = %options.publish_mode,
            failure_policy = %options.failure_policy,
            "Receiver opened"
        );

        Ok(FileSink {
            pipeline: Arc::clone(&self.pipeline),
            options,
            closed: AtomicBool::new(false),
        })
    }
}

/// Everything a drained producer stream produced.
#[derive(Debug, Default)]
pub struct ReceiveSummary {
    pub received: Vec<ReceivedFile>,
    /// Failed files. Only populated under [`FailurePolicy::IsolateFile`].
    pub failed: Vec<PipelineError>,
}

impl ReceiveSummary {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Sink the producer writes files into.
pub struct FileSink {
    pipeline: Arc<UploadPipeline>,
    options: EffectiveOptions,
    closed: AtomicBool,
}

impl FileSink {
    pub fn options(&self) -> &EffectiveOptions {
        &self.options
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Store one file. Resolves once every variant of the file settled.
    ///
    /// Under [`FailurePolicy::AbortBatch`] a failure closes the sink and every
    /// later write fails with [`ReceiverError::Closed`].
    pub async fn write(&self, file: IncomingFile) -> Result<ReceivedFile, ReceiverError> {
        if self.is_closed() {
            return Err(ReceiverError::Closed);
        }

        match self.pipeline.upload(file, &self.options).await {
            Ok(result) => Ok(ReceivedFile::from(result)),
            Err(e) => {
                if self.options.failure_policy == FailurePolicy::AbortBatch {
                    self.closed.store(true, Ordering::Release);
                    tracing::error!(error = %e, "Upload failed, closing receiver");
                } else {
                    tracing::warn!(error = %e, "Upload failed, continuing with next file");
                }
                Err(e.into())
            }
        }
    }

    /// Consume a whole producer stream, running up to `max_in_flight` files at
    /// once.
    ///
    /// Under [`FailurePolicy::AbortBatch`] the first failure closes the sink:
    /// no further file is pulled from `files`, files already in flight are
    /// driven to completion so every open upload is either committed or
    /// aborted, and then the first failure is returned. Under
    /// [`FailurePolicy::IsolateFile`] failures are collected in the summary.
    pub async fn drain<S>(&self, files: S) -> Result<ReceiveSummary, ReceiverError>
    where
        S: Stream<Item = IncomingFile> + Send,
    {
        let mut results = Box::pin(
            files
                .take_while(|_| future::ready(!self.is_closed()))
                .map(|file| self.write(file))
                .buffer_unordered(self.options.max_in_flight),
        );

        let mut summary = ReceiveSummary::default();
        let mut fatal = None;
        while let Some(result) = results.next().await {
            match result {
                Ok(file) => summary.received.push(file),
                Err(ReceiverError::Pipeline(e))
                    if self.options.failure_policy == FailurePolicy::IsolateFile =>
                {
                    summary.failed.push(e)
                }
                Err(e) => {
                    if fatal.is_none() {
                        fatal = Some(e);
                    }
                }
            }
        }

        if let Some(e) = fatal {
            tracing::error!(
                received = summary.received.len(),
                error = %e,
                "Receiver aborted"
            );
            return Err(e);
        }

        tracing::info!(
            received = summary.received.len(),
            failed = summary.failed.len(),
            "Receiver drained"
        );
        Ok(summary)
    }
}
