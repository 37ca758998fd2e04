//! Configuration module
//!
//! Two layers of configuration exist:
//!
//! - [`StoreConfig`]: process-wide settings for the object store (backend, bucket,
//!   credentials) plus the stage-wide upload defaults. Loaded once from the
//!   environment and validated before anything is uploaded.
//! - [`UploadOptions`]: call-time options supplied when a receiver is opened. They
//!   are merged over the stage-wide defaults (call-time values win) and resolved
//!   into [`EffectiveOptions`].

use std::collections::BTreeMap;
use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_FOLDER, DEFAULT_MAX_IMAGE_BYTES, DEFAULT_MAX_IN_FLIGHT, DEFAULT_RESIZE_DIMENSION,
};
use crate::error::ConfigurationError;
use crate::storage_types::StorageBackend;

/// When variants of a file are made publicly readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishMode {
    /// Each variant is published as soon as its own write completes, even if a
    /// sibling later fails.
    Eager,
    /// Variants are published only after every sibling variant was written.
    /// A failed sibling leaves all objects of the file private.
    #[default]
    AfterAll,
}

impl FromStr for PublishMode {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "eager" => Ok(PublishMode::Eager),
            "after_all" | "after-all" => Ok(PublishMode::AfterAll),
            _ => Err(ConfigurationError::invalid(
                "publishMode",
                format!("expected 'eager' or 'after_all', got '{}'", s),
            )),
        }
    }
}

impl Display for PublishMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            PublishMode::Eager => write!(f, "eager"),
            PublishMode::AfterAll => write!(f, "after_all"),
        }
    }
}

/// What the receiver does when one file fails to upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Any failed file stops the whole batch; the sink refuses further files.
    #[default]
    AbortBatch,
    /// The failure is reported for that file only and the sink stays open.
    IsolateFile,
}

impl FromStr for FailurePolicy {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "abort_batch" | "abort-batch" | "abort" => Ok(FailurePolicy::AbortBatch),
            "isolate_file" | "isolate-file" | "isolate" => Ok(FailurePolicy::IsolateFile),
            _ => Err(ConfigurationError::invalid(
                "failurePolicy",
                format!("expected 'abort_batch' or 'isolate_file', got '{}'", s),
            )),
        }
    }
}

impl Display for FailurePolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            FailurePolicy::AbortBatch => write!(f, "abort_batch"),
            FailurePolicy::IsolateFile => write!(f, "isolate_file"),
        }
    }
}

/// Upload options, every field optional so call-time values can be layered over
/// stage-wide defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UploadOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resize: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resize_dimension: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish_mode: Option<PublishMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_policy: Option<FailurePolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_in_flight: Option<usize>,
    /// Largest source buffered for image variants.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_image_bytes: Option<usize>,
}

impl UploadOptions {
    /// Layer `self` over `defaults`. Fields set on `self` win; metadata maps are
    /// merged key by key with `self` winning on conflicts.
    pub fn merge_over(&self, defaults: &UploadOptions) -> UploadOptions {
        let mut metadata = defaults.metadata.clone();
        metadata.extend(
            self.metadata
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );

        UploadOptions {
            bucket: self.bucket.clone().or_else(|| defaults.bucket.clone()),
            folder: self.folder.clone().or_else(|| defaults.folder.clone()),
            resize: self.resize.or(defaults.resize),
            resize_dimension: self.resize_dimension.or(defaults.resize_dimension),
            public: self.public.or(defaults.public),
            metadata,
            publish_mode: self.publish_mode.or(defaults.publish_mode),
            failure_policy: self.failure_policy.or(defaults.failure_policy),
            max_in_flight: self.max_in_flight.or(defaults.max_in_flight),
            max_image_bytes: self.max_image_bytes.or(defaults.max_image_bytes),
        }
    }

    /// Fill in defaults and validate.
    ///
    /// `store_bucket` is the bucket the storage handle is bound to. A bucket set in
    /// the options must match it, since one handle only ever writes one bucket.
    pub fn resolve(&self, store_bucket: Option<&str>) -> Result<EffectiveOptions, ConfigurationError> {
        let bucket = match (self.bucket.as_deref(), store_bucket) {
            (Some(""), _) => {
                return Err(ConfigurationError::invalid("bucket", "must not be empty"))
            }
            (Some(requested), Some(configured)) if requested != configured => {
                return Err(ConfigurationError::BucketMismatch {
                    configured: configured.to_string(),
                    requested: requested.to_string(),
                })
            }
            (Some(requested), _) => requested.to_string(),
            (None, Some(configured)) => configured.to_string(),
            (None, None) => String::new(),
        };

        let folder = self
            .folder
            .as_deref()
            .unwrap_or(DEFAULT_FOLDER)
            .trim_end_matches('/')
            .to_string();
        if folder.is_empty() {
            return Err(ConfigurationError::invalid("folder", "must not be empty"));
        }
        if folder.starts_with('/') || folder.split('/').any(|part| part == "..") {
            return Err(ConfigurationError::invalid(
                "folder",
                "must be a relative path without '..' segments",
            ));
        }

        let resize_dimension = self.resize_dimension.unwrap_or(DEFAULT_RESIZE_DIMENSION);
        if resize_dimension == 0 {
            return Err(ConfigurationError::invalid(
                "resizeDimension",
                "must be greater than zero",
            ));
        }

        let max_in_flight = self.max_in_flight.unwrap_or(DEFAULT_MAX_IN_FLIGHT);
        if max_in_flight == 0 {
            return Err(ConfigurationError::invalid(
                "maxInFlight",
                "must be greater than zero",
            ));
        }

        let max_image_bytes = self.max_image_bytes.unwrap_or(DEFAULT_MAX_IMAGE_BYTES);
        if max_image_bytes == 0 {
            return Err(ConfigurationError::invalid(
                "maxImageBytes",
                "must be greater than zero",
            ));
        }

        Ok(EffectiveOptions {
            bucket,
            folder,
            resize: self.resize.unwrap_or(false),
            resize_dimension,
            public: self.public.unwrap_or(false),
            metadata: self.metadata.clone(),
            publish_mode: self.publish_mode.unwrap_or_default(),
            failure_policy: self.failure_policy.unwrap_or_default(),
            max_in_flight,
            max_image_bytes,
        })
    }
}

/// Fully resolved options for one receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveOptions {
    pub bucket: String,
    pub folder: String,
    pub resize: bool,
    pub resize_dimension: u32,
    pub public: bool,
    pub metadata: BTreeMap<String, String>,
    pub publish_mode: PublishMode,
    pub failure_policy: FailurePolicy,
    pub max_in_flight: usize,
    pub max_image_bytes: usize,
}

impl Default for EffectiveOptions {
    fn default() -> Self {
        EffectiveOptions {
            bucket: String::new(),
            folder: DEFAULT_FOLDER.to_string(),
            resize: false,
            resize_dimension: DEFAULT_RESIZE_DIMENSION,
            public: false,
            metadata: BTreeMap::new(),
            publish_mode: PublishMode::default(),
            failure_policy: FailurePolicy::default(),
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }
}

/// Process-wide object store configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreConfig {
    pub storage_backend: StorageBackend,
    pub bucket: Option<String>,
    pub gcs_project_id: Option<String>,
    pub gcs_credentials_file: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    /// Stage-wide upload defaults, overridable per receiver.
    pub upload_defaults: UploadOptions,
}

impl StoreConfig {
    /// In-memory store bound to `bucket`. Used by tests and dry runs.
    pub fn in_memory(bucket: impl Into<String>) -> Self {
        StoreConfig {
            storage_backend: StorageBackend::Memory,
            bucket: Some(bucket.into()),
            ..Default::default()
        }
    }

    /// Load from the process environment, reading `.env` first if present.
    ///
    /// Boolean settings (`UPLOAD_RESIZE`, `UPLOAD_PUBLIC`) accept `true`/`false`,
    /// `1`/`0`, `yes`/`no` and `on`/`off`, case-insensitively.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());

        let storage_backend = match var("STORAGE_BACKEND") {
            Some(s) => s.parse()?,
            None => StorageBackend::default(),
        };

        let upload_defaults = UploadOptions {
            bucket: None,
            folder: var("UPLOAD_FOLDER"),
            resize: parse_flag(&var, "UPLOAD_RESIZE")?,
            resize_dimension: parse_var(&var, "UPLOAD_RESIZE_DIMENSION")?,
            public: parse_flag(&var, "UPLOAD_PUBLIC")?,
            metadata: BTreeMap::new(),
            publish_mode: parse_var(&var, "UPLOAD_PUBLISH_MODE")?,
            failure_policy: parse_var(&var, "UPLOAD_FAILURE_POLICY")?,
            max_in_flight: parse_var(&var, "UPLOAD_MAX_IN_FLIGHT")?,
            max_image_bytes: parse_var(&var, "UPLOAD_MAX_IMAGE_BYTES")?,
        };

        let config = StoreConfig {
            storage_backend,
            bucket: var("STORAGE_BUCKET"),
            gcs_project_id: var("GCS_PROJECT_ID"),
            gcs_credentials_file: var("GCS_CREDENTIALS_FILE")
                .or_else(|| var("GOOGLE_APPLICATION_CREDENTIALS")),
            s3_region: var("S3_REGION").or_else(|| var("AWS_REGION")),
            s3_endpoint: var("S3_ENDPOINT"),
            local_storage_path: var("LOCAL_STORAGE_PATH"),
            local_storage_base_url: var("LOCAL_STORAGE_BASE_URL"),
            upload_defaults,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.storage_backend.requires_bucket() && self.bucket.is_none() {
            return Err(ConfigurationError::Missing(format!(
                "STORAGE_BUCKET (required by the {} backend)",
                self.storage_backend
            )));
        }

        match self.storage_backend {
            StorageBackend::Gcs => {
                if self.gcs_credentials_file.is_none() {
                    return Err(ConfigurationError::Missing(
                        "GCS_CREDENTIALS_FILE or GOOGLE_APPLICATION_CREDENTIALS".to_string(),
                    ));
                }
            }
            StorageBackend::S3 => {
                if self.s3_region.is_none() {
                    return Err(ConfigurationError::Missing(
                        "S3_REGION or AWS_REGION".to_string(),
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(ConfigurationError::Missing("LOCAL_STORAGE_PATH".to_string()));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(ConfigurationError::Missing(
                        "LOCAL_STORAGE_BASE_URL".to_string(),
                    ));
                }
            }
            StorageBackend::Memory => {}
        }

        // Surface bad defaults now rather than on the first upload.
        self.upload_defaults.resolve(self.bucket.as_deref())?;
        Ok(())
    }
}

fn parse_var<T, F>(var: &F, key: &str) -> Result<Option<T>, ConfigurationError>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    var(key)
        .map(|raw| {
            raw.trim()
                .to_lowercase()
                .parse::<T>()
                .map_err(|e| ConfigurationError::invalid(key, e.to_string()))
        })
        .transpose()
}

fn parse_flag<F>(var: &F, key: &str) -> Result<Option<bool>, ConfigurationError>
where
    F: Fn(&str) -> Option<String>,
{
    var(key)
        .map(|raw| match raw.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            other => Err(ConfigurationError::invalid(
                key,
                format!("expected a boolean (true/false, 1/0, yes/no, on/off), got '{}'", other),
            )),
        })
        .transpose()
}
