//! Streams one variant into the store and records its outcome.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use stowage_processing::VariantSpec;
use stowage_storage::Storage;

use crate::error::WriteError;
use crate::types::UploadOutcome;

/// Writes variant streams to the store. Never fails: errors end up in the
/// returned [`UploadOutcome`].
#[derive(Clone)]
pub struct ObjectWriter {
    storage: Arc<dyn Storage>,
}

impl ObjectWriter {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        ObjectWriter { storage }
    }

    /// Pipe `stream` into `spec.destination`, then publish it if `publish` is set.
    ///
    /// On a source or store error the pending upload is aborted, so nothing
    /// becomes visible at the destination.
    pub async fn write<S>(&self, spec: &VariantSpec, mut stream: S, publish: bool) -> UploadOutcome
    where
        S: Stream<Item = Result<Bytes, WriteError>> + Unpin + Send,
    {
        let start = Instant::now();
        let path = spec.destination.as_str();

        let mut sink = match self.storage.writer(path, &spec.metadata).await {
            Ok(sink) => sink,
            Err(e) => {
                tracing::error!(error = %e, key = %path, variant = %spec.kind, "Failed to open object writer");
                return UploadOutcome::failed(spec.kind, path, WriteError::from(e).into());
            }
        };

        while let Some(item) = stream.next().await {
            let result = match item {
                Ok(chunk) => sink.write(chunk).await.map_err(WriteError::from),
                Err(e) => Err(e),
            };

            if let Err(e) = result {
                tracing::warn!(
                    error = %e,
                    key = %path,
                    variant = %spec.kind,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Variant write failed, aborting upload"
                );
                if let Err(abort_err) = sink.abort().await {
                    tracing::warn!(error = %abort_err, key = %path, "Failed to abort upload");
                }
                return UploadOutcome::failed(spec.kind, path, e.into());
            }
        }

        let mut outcome = match sink.finish().await {
            Ok(bytes_written) => UploadOutcome::written(spec.kind, path, bytes_written),
            Err(e) => return UploadOutcome::failed(spec.kind, path, WriteError::from(e).into()),
        };

        if publish {
            self.publish(&mut outcome).await;
        }

        outcome
    }

    /// Make a written variant public. Best effort: a failure is recorded in
    /// `public_error` and logged, and `succeeded` is left untouched.
    pub async fn publish(&self, outcome: &mut UploadOutcome) {
        let Some(path) = outcome.written_path.clone() else {
            return;
        };

        match self.storage.make_public(&path).await {
            Ok(url) => outcome.public_url = Some(url),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    key = %path,
                    variant = %outcome.kind,
                    "Variant stored but could not be made public"
                );
                outcome.public_error = Some(e);
            }
        }
    }
}
