//! Helpers shared by the `stowage` binary: tracing setup, local-file producer
//! and report formatting.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use stowage_core::UploadOptions;
use stowage_receiver::{IncomingFile, PipelineError, ReceivedFile, UploadOutcome};
use tokio_util::io::ReaderStream;

/// Initialize tracing for the CLI. Logs go to stderr so stdout stays usable
/// for reports and object content. `LOG_FORMAT=json` switches to JSON lines.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("stowage=info"));

    let json = std::env::var("LOG_FORMAT")
        .map(|f| f.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

/// File id for a local path: its file name, used verbatim as the object name.
pub fn file_id_for(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .with_context(|| format!("No usable file name in {}", path.display()))
}

/// Open a local file as an incoming upload, streamed from disk.
pub async fn open_incoming(path: &Path) -> Result<IncomingFile> {
    let id = file_id_for(path)?;
    let file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(IncomingFile::new(id, ReaderStream::new(file)))
}

/// Read call-time upload options from a JSON file.
pub fn load_options(path: &Path) -> Result<UploadOptions> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read options file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Invalid upload options in {}", path.display()))
}

/// Parse a `KEY=VALUE` metadata argument.
pub fn parse_metadata(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", arg)),
    }
}

/// Per-variant line of an upload report.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct VariantReport {
    pub kind: String,
    pub path: String,
    pub succeeded: bool,
    pub bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_error: Option<String>,
}

impl From<&UploadOutcome> for VariantReport {
    fn from(outcome: &UploadOutcome) -> Self {
        VariantReport {
            kind: outcome.kind.to_string(),
            path: outcome.destination.clone(),
            succeeded: outcome.succeeded,
            bytes: outcome.bytes_written,
            public_url: outcome.public_url.clone(),
            error: outcome.error.as_ref().map(|e| e.to_string()),
            public_error: outcome.public_error.as_ref().map(|e| e.to_string()),
        }
    }
}

/// Upload report for one file.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct FileReport {
    pub id: String,
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_location: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
    pub variants: Vec<VariantReport>,
}

impl From<&ReceivedFile> for FileReport {
    fn from(file: &ReceivedFile) -> Self {
        FileReport {
            id: file.id.clone(),
            succeeded: true,
            location: Some(file.location.clone()),
            primary_location: file.primary_location.clone(),
            metadata: file.metadata.clone(),
            variants: file.outcomes.iter().map(VariantReport::from).collect(),
        }
    }
}

impl From<&PipelineError> for FileReport {
    fn from(err: &PipelineError) -> Self {
        FileReport {
            id: err.file_id().to_string(),
            succeeded: false,
            location: None,
            primary_location: None,
            metadata: BTreeMap::new(),
            variants: err.outcomes().iter().map(VariantReport::from).collect(),
        }
    }
}
