use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::error::ConfigurationError;

/// Storage backend types
///
/// Google Cloud Storage is the primary target. S3 and the local filesystem are
/// supported through the same object store layer, and the in-memory backend
/// serves tests and dry runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Gcs,
    S3,
    Local,
    Memory,
}

impl StorageBackend {
    /// Whether objects on this backend live in a named bucket.
    pub fn requires_bucket(&self) -> bool {
        matches!(self, StorageBackend::Gcs | StorageBackend::S3)
    }
}

impl FromStr for StorageBackend {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gcs" | "google" => Ok(StorageBackend::Gcs),
            "s3" => Ok(StorageBackend::S3),
            "local" => Ok(StorageBackend::Local),
            "memory" => Ok(StorageBackend::Memory),
            _ => Err(ConfigurationError::invalid(
                "STORAGE_BACKEND",
                format!("unknown storage backend '{}'", s),
            )),
        }
    }
}

impl Display for StorageBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StorageBackend::Gcs => write!(f, "gcs"),
            StorageBackend::S3 => write!(f, "s3"),
            StorageBackend::Local => write!(f, "local"),
            StorageBackend::Memory => write!(f, "memory"),
        }
    }
}
