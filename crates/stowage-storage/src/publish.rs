//! Public access: URL construction and the "make public" call.

use std::collections::BTreeSet;
use std::sync::Mutex;

use stowage_core::constants::GCS_PUBLIC_HOST;

use crate::traits::{StorageError, StorageResult};

/// How the public URL of an object is formed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicUrl {
    /// `https://storage.googleapis.com/{bucket}/{key}`
    Gcs { bucket: String },
    /// `https://{bucket}.s3.{region}.amazonaws.com/{key}`, or
    /// `{endpoint}/{bucket}/{key}` for S3-compatible providers.
    S3 {
        bucket: String,
        region: String,
        endpoint: Option<String>,
    },
    /// `{base_url}/{key}`, for objects served by a static file server.
    Base { base_url: String },
}

impl PublicUrl {
    pub fn url_for(&self, key: &str) -> String {
        match self {
            PublicUrl::Gcs { bucket } => format!("{}/{}/{}", GCS_PUBLIC_HOST, bucket, key),
            PublicUrl::S3 {
                bucket,
                region,
                endpoint,
            } => match endpoint {
                // Path-style for compatibility: {endpoint}/{bucket}/{key}
                Some(endpoint) => {
                    format!("{}/{}/{}", endpoint.trim_end_matches('/'), bucket, key)
                }
                None => format!("https://{}.s3.{}.amazonaws.com/{}", bucket, region, key),
            },
            PublicUrl::Base { base_url } => {
                format!("{}/{}", base_url.trim_end_matches('/'), key)
            }
        }
    }
}

/// Grants public read access to a stored object.
pub enum Publisher {
    /// Adds an `allUsers: READER` ACL entry through the GCS JSON API.
    #[cfg(feature = "storage-gcs")]
    GcsAcl(crate::gcs::GcsAclPublisher),
    /// Public access is governed outside this process (bucket policy, static
    /// file server). Publishing is a no-op.
    Implicit,
    /// Remembers which keys were published. Backs the in-memory store.
    Recorded(Mutex<BTreeSet<String>>),
}

impl Publisher {
    pub fn recorded() -> Self {
        Publisher::Recorded(Mutex::new(BTreeSet::new()))
    }

    pub async fn publish(&self, key: &str) -> StorageResult<()> {
        match self {
            #[cfg(feature = "storage-gcs")]
            Publisher::GcsAcl(acl) => acl.publish(key).await,
            Publisher::Implicit => {
                tracing::debug!(key = %key, "Public access is implicit for this backend");
                Ok(())
            }
            Publisher::Recorded(published) => {
                let mut published = published.lock().map_err(|_| StorageError::PublishFailed {
                    key: key.to_string(),
                    reason: "publish registry poisoned".to_string(),
                })?;
                published.insert(key.to_string());
                Ok(())
            }
        }
    }

    /// Whether `key` was published. Only tracked by [`Publisher::Recorded`];
    /// other publishers report every key as public.
    pub fn is_published(&self, key: &str) -> bool {
        match self {
            Publisher::Recorded(published) => published
                .lock()
                .map(|published| published.contains(key))
                .unwrap_or(false),
            _ => true,
        }
    }
}
