//! Stowage CLI - upload local files through the receiver and browse the store.
//!
//! Store settings come from the environment (or `.env`): STORAGE_BACKEND,
//! STORAGE_BUCKET, GCS_CREDENTIALS_FILE and friends. STORAGE_BACKEND=memory
//! gives a dry run that touches nothing remote.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use futures::{stream, StreamExt};
use serde::Serialize;
use stowage_cli::{init_tracing, load_options, open_incoming, parse_metadata, FileReport};
use stowage_core::{StoreConfig, UploadOptions};
use stowage_receiver::{CatalogAdapter, ReceiverError, ReceiverStage};
use stowage_storage::{create_storage, Storage};
use tokio::io::AsyncWriteExt;

#[derive(Parser)]
#[command(name = "stowage", about = "Store files and their image variants in an object store")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload local files
    Upload {
        /// Files to upload, in order
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// JSON file with upload options (folder, resize, public, metadata, ...)
        #[arg(long, value_name = "FILE")]
        options: Option<PathBuf>,
        /// Folder for the original variant
        #[arg(long)]
        folder: Option<String>,
        /// Also store resized and thumbnail variants
        #[arg(long)]
        resize: bool,
        /// Max long edge of the resized variant
        #[arg(long, value_name = "PX")]
        resize_dimension: Option<u32>,
        /// Make stored objects publicly readable
        #[arg(long)]
        public: bool,
        /// Extra object metadata
        #[arg(long = "metadata", value_name = "KEY=VALUE", value_parser = parse_metadata)]
        metadata: Vec<(String, String)>,
        /// Files uploaded concurrently
        #[arg(long, value_name = "N")]
        max_in_flight: Option<usize>,
    },
    /// List object names under a prefix
    Ls {
        /// Name prefix
        #[arg(default_value = "")]
        prefix: String,
    },
    /// Write an object's content to stdout
    Cat {
        /// Object name
        path: String,
    },
    /// Delete an object (not supported by any backend)
    Rm {
        /// Object name
        path: String,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize report")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    let config = StoreConfig::from_env().context("Invalid storage configuration")?;
    let storage = create_storage(&config)
        .await
        .context("Failed to initialize storage")?;
    tracing::debug!(
        backend = %storage.backend_type(),
        bucket = storage.bucket().unwrap_or("-"),
        "Storage ready"
    );

    match cli.command {
        Commands::Upload {
            files,
            options,
            folder,
            resize,
            resize_dimension,
            public,
            metadata,
            max_in_flight,
        } => {
            let from_file = match options {
                Some(path) => load_options(&path)?,
                None => UploadOptions::default(),
            };
            let flags = UploadOptions {
                folder,
                resize: resize.then_some(true),
                resize_dimension,
                public: public.then_some(true),
                metadata: metadata.into_iter().collect(),
                max_in_flight,
                ..Default::default()
            };
            let overrides = flags.merge_over(&from_file);

            let stage = ReceiverStage::new(storage, config.upload_defaults.clone());
            let sink = stage.receive(&overrides)?;

            let mut incoming = Vec::with_capacity(files.len());
            for path in &files {
                incoming.push(open_incoming(path).await?);
            }

            match sink.drain(stream::iter(incoming)).await {
                Ok(summary) => {
                    let mut reports: Vec<FileReport> =
                        summary.received.iter().map(FileReport::from).collect();
                    reports.extend(summary.failed.iter().map(FileReport::from));
                    print_json(&reports)?;
                    if !summary.is_complete() {
                        anyhow::bail!("{} of {} files failed", summary.failed.len(), files.len());
                    }
                }
                Err(ReceiverError::Pipeline(e)) => {
                    print_json(&FileReport::from(&e))?;
                    return Err(e).context("Upload aborted");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Commands::Ls { prefix } => {
            let catalog = CatalogAdapter::new(storage);
            for name in catalog.list(&prefix).await? {
                println!("{}", name);
            }
        }
        Commands::Cat { path } => {
            let catalog = CatalogAdapter::new(storage);
            let mut chunks = catalog.read_stream(&path).await?;
            let mut stdout = tokio::io::stdout();
            while let Some(chunk) = chunks.next().await {
                stdout.write_all(&chunk?).await?;
            }
            stdout.flush().await?;
        }
        Commands::Rm { path } => {
            let catalog = CatalogAdapter::new(storage);
            catalog.remove(&path).await?;
        }
    }

    Ok(())
}
