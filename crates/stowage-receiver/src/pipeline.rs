//! Upload pipeline: plan → tee → {transform → write} per variant → settle.
//!
//! One incoming file is read exactly once. Its stream is teed into one branch
//! per streamed variant plus one shared branch for all image variants. The
//! image branch is buffered once, up to `max_image_bytes`, decoded once and
//! handed to every image transform. Every branch runs concurrently in the
//! pipeline's own future; the pipeline returns only after every variant has an
//! outcome.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use stowage_core::{EffectiveOptions, PublishMode};
use stowage_processing::{
    MediaTransformer, Transform, TransformError, VariantKind, VariantPlan, VariantSpec,
};
use stowage_storage::Storage;

use crate::error::{PipelineError, VariantError, WriteError};
use crate::tee::{tee, CollectError, TeeBranch};
use crate::types::{IncomingFile, PipelineResult, UploadOutcome};
use crate::writer::ObjectWriter;

/// Chunks buffered per variant branch before the source read waits.
const BRANCH_CAPACITY: usize = 8;

pub struct UploadPipeline {
    storage: Arc<dyn Storage>,
    transformer: Arc<dyn MediaTransformer>,
    writer: ObjectWriter,
}

impl UploadPipeline {
    pub fn new(storage: Arc<dyn Storage>, transformer: Arc<dyn MediaTransformer>) -> Self {
        UploadPipeline {
            writer: ObjectWriter::new(Arc::clone(&storage)),
            storage,
            transformer,
        }
    }

    /// Store every variant of `file`.
    ///
    /// Resolves with a [`PipelineResult`] when every variant succeeded, and with
    /// [`PipelineError::VariantUpload`] carrying all outcomes otherwise. Variants
    /// never short-circuit each other: a failed thumbnail still lets the
    /// original finish. Under [`PublishMode::AfterAll`] nothing of a failed
    /// file is made public.
    pub async fn upload(
        &self,
        file: IncomingFile,
        options: &EffectiveOptions,
    ) -> Result<PipelineResult, PipelineError> {
        let start = Instant::now();
        let IncomingFile {
            id,
            stream,
            content_type,
        } = file;

        let specs = VariantPlan::plan(&id, content_type.as_deref(), options);
        let eager = options.public && options.publish_mode == PublishMode::Eager;

        let (streamed, derived): (Vec<&VariantSpec>, Vec<&VariantSpec>) =
            specs.iter().partition(|spec| spec.transform.is_identity());
        let branch_count = streamed.len() + usize::from(!derived.is_empty());

        let (pump, mut branches) = tee(stream, branch_count, BRANCH_CAPACITY);
        let image_branch = if derived.is_empty() {
            None
        } else {
            branches.pop()
        };

        let streamed_writes = streamed
            .iter()
            .zip(branches)
            .map(|(spec, branch)| self.write_streamed(spec, branch, eager));
        let derived_writes =
            self.write_derived(&derived, image_branch, options.max_image_bytes, eager);

        let (source, streamed_outcomes, derived_outcomes) =
            futures::join!(pump, join_all(streamed_writes), derived_writes);

        // Report outcomes in plan order.
        let mut outcomes = streamed_outcomes;
        outcomes.extend(derived_outcomes);
        outcomes.sort_by_key(|o| specs.iter().position(|spec| spec.kind == o.kind));

        let succeeded = outcomes.iter().all(|o| o.succeeded);

        if options.public && options.publish_mode == PublishMode::AfterAll {
            if succeeded {
                join_all(outcomes.iter_mut().map(|o| self.writer.publish(o))).await;
            } else {
                tracing::warn!(
                    file_id = %id,
                    "Variant failed, leaving every variant of the file private"
                );
            }
        }

        // The original is always planned first.
        let original = &specs[0];
        let location = self.storage.public_url(&original.destination);
        let primary_location = outcomes
            .iter()
            .find(|o| o.kind == VariantKind::Original && o.succeeded)
            .and_then(|o| o.public_url.clone());

        if !succeeded {
            tracing::error!(
                file_id = %id,
                failed = outcomes.iter().filter(|o| !o.succeeded).count(),
                variants = outcomes.len(),
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "File upload failed"
            );
            return Err(PipelineError::VariantUpload {
                file_id: id,
                outcomes,
            });
        }

        tracing::info!(
            file_id = %id,
            bucket = %options.bucket,
            variants = outcomes.len(),
            size_bytes = source.bytes,
            public = options.public,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "File upload successful"
        );

        Ok(PipelineResult {
            file_id: id,
            outcomes,
            succeeded,
            primary_location,
            location,
            metadata: original.metadata.to_map(),
        })
    }

    async fn write_streamed(&self, spec: &VariantSpec, branch: TeeBranch, publish: bool) -> UploadOutcome {
        let chunks = branch.map(|item| item.map_err(WriteError::Source));
        self.writer.write(spec, chunks, publish).await
    }

    /// Buffer the shared image branch once, run every transform over it and
    /// write the results.
    async fn write_derived(
        &self,
        specs: &[&VariantSpec],
        branch: Option<TeeBranch>,
        max_image_bytes: usize,
        publish: bool,
    ) -> Vec<UploadOutcome> {
        let Some(branch) = branch else {
            return Vec::new();
        };

        let data = match branch.collect_bytes(max_image_bytes).await {
            Ok(data) => data,
            Err(CollectError::Source(e)) => {
                return fail_all(specs, || WriteError::Source(Arc::clone(&e)).into());
            }
            Err(CollectError::TooLarge { limit }) => {
                tracing::warn!(
                    key = %specs[0].destination,
                    limit_bytes = limit,
                    "Source too large to derive image variants"
                );
                return fail_all(specs, || TransformError::TooLarge { limit }.into());
            }
        };

        let transforms: Vec<Transform> = specs.iter().map(|spec| spec.transform).collect();
        let results = self.transformer.transform_all(&transforms, data).await;

        let writes = specs
            .iter()
            .zip(results)
            .map(|(spec, result)| self.write_transformed(spec, result, publish));
        join_all(writes).await
    }

    async fn write_transformed(
        &self,
        spec: &VariantSpec,
        result: Result<Bytes, TransformError>,
        publish: bool,
    ) -> UploadOutcome {
        match result {
            Ok(output) => {
                self.writer
                    .write(spec, stream::iter([Ok(output)]), publish)
                    .await
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    key = %spec.destination,
                    variant = %spec.kind,
                    "Variant transform failed"
                );
                UploadOutcome::failed(spec.kind, &spec.destination, e.into())
            }
        }
    }
}

fn fail_all<F>(specs: &[&VariantSpec], error: F) -> Vec<UploadOutcome>
where
    F: Fn() -> VariantError,
{
    specs
        .iter()
        .map(|spec| UploadOutcome::failed(spec.kind, &spec.destination, error()))
        .collect()
}
