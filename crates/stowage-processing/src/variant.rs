//! Variant planning: which artifacts one upload produces and where they go.

use std::fmt::{Display, Formatter, Result as FmtResult};

use stowage_core::constants::{RESIZED_PREFIX, THUMBNAIL_SIZE, THUMBS_PREFIX};
use stowage_core::{content_type_for, EffectiveOptions, ObjectMetadata};

/// Kind of artifact derived from an incoming file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VariantKind {
    Original,
    Resized,
    Thumbnail,
}

impl Display for VariantKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            VariantKind::Original => write!(f, "original"),
            VariantKind::Resized => write!(f, "resized"),
            VariantKind::Thumbnail => write!(f, "thumbnail"),
        }
    }
}

/// Transform applied to the source bytes before they are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Bytes pass through unchanged.
    Identity,
    /// Shrink so the longer edge is at most `max_dimension`, keeping the aspect
    /// ratio. Images already within bounds are left untouched.
    ResizeBounded { max_dimension: u32 },
    /// Scale to cover a `size`×`size` square, then center-crop to it.
    ResizeCropSquare { size: u32 },
}

impl Transform {
    pub fn is_identity(&self) -> bool {
        matches!(self, Transform::Identity)
    }
}

/// One artifact to produce from an incoming file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantSpec {
    pub kind: VariantKind,
    pub destination: String,
    pub transform: Transform,
    pub metadata: ObjectMetadata,
}

/// Variant planner.
pub struct VariantPlan;

impl VariantPlan {
    /// Ordered variants for `file_id`: the original first, then the resized
    /// image and thumbnail when resizing is enabled.
    ///
    /// `content_type` overrides the type guessed from the file id's extension.
    /// Resized and thumbnail destinations sit under fixed prefixes regardless of
    /// the configured folder.
    pub fn plan(
        file_id: &str,
        content_type: Option<&str>,
        options: &EffectiveOptions,
    ) -> Vec<VariantSpec> {
        let content_type = content_type.unwrap_or_else(|| content_type_for(file_id));
        let metadata = ObjectMetadata::new(content_type).with_custom(options.metadata.clone());

        let mut specs = vec![VariantSpec {
            kind: VariantKind::Original,
            destination: format!("{}/{}", options.folder, file_id),
            transform: Transform::Identity,
            metadata: metadata.clone(),
        }];

        if options.resize {
            specs.push(VariantSpec {
                kind: VariantKind::Resized,
                destination: format!("{}/{}", RESIZED_PREFIX, file_id),
                transform: Transform::ResizeBounded {
                    max_dimension: options.resize_dimension,
                },
                metadata: metadata.clone(),
            });
            specs.push(VariantSpec {
                kind: VariantKind::Thumbnail,
                destination: format!("{}/{}", THUMBS_PREFIX, file_id),
                transform: Transform::ResizeCropSquare {
                    size: THUMBNAIL_SIZE,
                },
                metadata,
            });
        }

        specs
    }
}
