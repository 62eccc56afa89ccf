//! Tubely CLI: run the video ingestion pipeline from the command line.
//!
//! Storage and tool settings come from the environment (or a `.env` file).

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tubely_cli::{init_tracing, log_error, media_type_for_path, ErrorReport, ResolveReport};
use tubely_core::Config;
use tubely_processing::{IngestError, IngestPipeline, UploadRequest};
use tubely_storage::{create_resolver, create_storage};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "tubely", about = "Tubely video ingestion pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify, remux and upload a video; prints the value to persist as video_url
    Ingest(UploadArgs),
    /// Upload a thumbnail image; prints the value to persist as thumbnail_url
    Thumbnail(UploadArgs),
    /// Resolve a stored video_url value into a URL a client can fetch
    Resolve {
        /// Stored value: a URL or a `bucket,key` reference
        value: String,
    },
}

#[derive(Args)]
struct UploadArgs {
    /// Owner (user) UUID
    #[arg(long)]
    owner: Uuid,
    /// Target video UUID
    #[arg(long)]
    video: Uuid,
    /// Declared media type; guessed from the file extension when omitted
    #[arg(long)]
    media_type: Option<String>,
    /// Path to the file to upload
    file: PathBuf,
}

impl UploadArgs {
    async fn into_request(self) -> anyhow::Result<UploadRequest> {
        let media_type = match self.media_type {
            Some(media_type) => media_type,
            None => media_type_for_path(&self.file)
                .map(String::from)
                .context("Could not guess the media type; pass --media-type")?,
        };
        let file = tokio::fs::File::open(&self.file)
            .await
            .with_context(|| format!("Failed to open {}", self.file.display()))?;
        Ok(UploadRequest::new(self.owner, self.video, media_type, file))
    }
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

/// Print the outcome, or an error report followed by a non-zero exit.
fn report<T: Serialize>(
    config: &Config,
    result: Result<T, IngestError>,
    action: &str,
) -> anyhow::Result<()> {
    match result {
        Ok(outcome) => print_json(&outcome),
        Err(err) => {
            log_error(&err);
            let report = ErrorReport::new(&err, config.is_production());
            print_json(&report)?;
            Err(anyhow::anyhow!("{}: {}", action, report.error))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env().context("Invalid configuration")?;
    tracing::debug!(
        environment = %config.environment(),
        backend = %config.storage_backend(),
        url_mode = %config.url_mode(),
        "Configuration loaded"
    );

    let storage = create_storage(&config)
        .await
        .context("Failed to initialize storage backend")?;
    let resolver = create_resolver(&config, storage.clone());

    match cli.command {
        Commands::Ingest(args) => {
            let pipeline = IngestPipeline::from_config(&config, storage, resolver);
            let request = args.into_request().await?;
            report(&config, pipeline.ingest(request).await, "Ingestion failed")?;
        }
        Commands::Thumbnail(args) => {
            let pipeline = IngestPipeline::from_config(&config, storage, resolver);
            let request = args.into_request().await?;
            report(
                &config,
                pipeline.ingest_thumbnail(request).await,
                "Thumbnail upload failed",
            )?;
        }
        Commands::Resolve { value } => {
            let resolved = resolver
                .resolve(&value)
                .await
                .context("Failed to resolve video URL")?;
            print_json(&ResolveReport::from(resolved))?;
        }
    }

    Ok(())
}
