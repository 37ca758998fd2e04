//! Google Cloud Storage backend.
//!
//! Object reads and writes go through `object_store`'s GCS client. Making an
//! object public is not part of the `object_store` API, so it is done with a
//! direct call to the GCS JSON API, authenticated with the same credentials.

use crate::publish::{PublicUrl, Publisher};
use crate::remote::ObjectStoreStorage;
use crate::traits::{StorageError, StorageResult};
use crate::StorageBackend;
use object_store::gcp::{GcpCredentialProvider, GoogleCloudStorageBuilder};
use object_store::CredentialProvider;
use std::sync::Arc;
use stowage_core::ConfigurationError;

const GCS_API_BASE: &str = "https://storage.googleapis.com/storage/v1";

/// Grants `allUsers` read access to single objects.
pub struct GcsAclPublisher {
    client: reqwest::Client,
    bucket: String,
    credentials: GcpCredentialProvider,
    api_base: String,
}

impl GcsAclPublisher {
    pub fn new(bucket: String, credentials: GcpCredentialProvider) -> Self {
        GcsAclPublisher {
            client: reqwest::Client::new(),
            bucket,
            credentials,
            api_base: GCS_API_BASE.to_string(),
        }
    }

    /// Point the publisher at another API root, e.g. a GCS emulator.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn acl_url(&self, key: &str) -> String {
        format!(
            "{}/b/{}/o/{}/acl",
            self.api_base.trim_end_matches('/'),
            urlencoding::encode(&self.bucket),
            urlencoding::encode(key)
        )
    }

    /// ACL entry granting public read.
    fn public_read_entry() -> serde_json::Value {
        serde_json::json!({ "entity": "allUsers", "role": "READER" })
    }

    pub async fn publish(&self, key: &str) -> StorageResult<()> {
        let publish_failed = |reason: String| StorageError::PublishFailed {
            key: key.to_string(),
            reason,
        };

        let credential = self
            .credentials
            .get_credential()
            .await
            .map_err(|e| publish_failed(format!("failed to obtain credentials: {}", e)))?;

        let response = self
            .client
            .post(self.acl_url(key))
            .bearer_auth(&credential.bearer)
            .json(&Self::public_read_entry())
            .send()
            .await
            .map_err(|e| publish_failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(publish_failed(format!("GCS returned {}: {}", status, body)));
        }

        Ok(())
    }
}

impl ObjectStoreStorage {
    /// Create a Google Cloud Storage backed store
    ///
    /// # Arguments
    /// * `bucket` - GCS bucket name
    /// * `credentials_file` - Service account key file; when absent the
    ///   `GOOGLE_*` environment variables are used
    /// * `project_id` - Project owning the bucket, recorded for diagnostics
    pub fn gcs(
        bucket: String,
        credentials_file: Option<&str>,
        project_id: Option<&str>,
    ) -> StorageResult<Self> {
        let mut builder = GoogleCloudStorageBuilder::from_env().with_bucket_name(bucket.clone());
        if let Some(path) = credentials_file {
            builder = builder.with_service_account_path(path);
        }

        let store = builder.build().map_err(|e| {
            StorageError::ConfigError(ConfigurationError::invalid("GCS", e.to_string()))
        })?;
        let credentials = Arc::clone(store.credentials());

        tracing::info!(
            bucket = %bucket,
            project_id = project_id.unwrap_or("-"),
            "GCS storage initialized"
        );

        Ok(ObjectStoreStorage::new(
            Arc::new(store),
            StorageBackend::Gcs,
            Some(bucket.clone()),
            PublicUrl::Gcs {
                bucket: bucket.clone(),
            },
            Publisher::GcsAcl(GcsAclPublisher::new(bucket, credentials)),
        ))
    }
}
