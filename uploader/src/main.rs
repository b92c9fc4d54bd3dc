use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use common_types::Month;
use tracing_subscriber::EnvFilter;
use uploader::{
    config::{UploaderConfig, DEFAULT_MAX_FILES, DEFAULT_MAX_FILE_BYTES, DEFAULT_TIMEOUT_SECS},
    BatchMetadata, BatchStatus, EntryState, HttpTransport, SelectedFile, TracingListener, UploadOrchestrator,
    UploadPolicy,
};

#[derive(Parser, Debug)]
#[command(name = "photobook-upload", about = "Upload photos and videos to the photobook")]
struct Cli {
    /// Month the uploads are filed under
    #[arg(long)]
    month: Month,

    /// Photographer credit
    #[arg(long, default_value = "")]
    photographer: String,

    /// Notes attached to every file
    #[arg(long, default_value = "")]
    notes: String,

    /// Extra attempts for files that failed with a retryable error
    #[arg(long, default_value_t = 0)]
    retries: u32,

    /// Ticket issuer endpoint
    #[arg(long, env = "PHOTOBOOK_CREATE_ENDPOINT")]
    create_endpoint: String,

    /// Confirmation endpoint
    #[arg(long, env = "PHOTOBOOK_CONFIRM_ENDPOINT")]
    confirm_endpoint: Option<String>,

    /// Bearer token for the ticket issuer
    #[arg(long, env = "PHOTOBOOK_UPLOAD_TOKEN", hide_env_values = true)]
    upload_token: Option<String>,

    /// Largest file accepted, in bytes
    #[arg(long, env = "PHOTOBOOK_MAX_FILE_BYTES", default_value_t = DEFAULT_MAX_FILE_BYTES)]
    max_file_bytes: u64,

    /// Per-request timeout in seconds
    #[arg(long, env = "PHOTOBOOK_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Print the final report as JSON
    #[arg(long)]
    json: bool,

    /// Files to upload
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = UploaderConfig {
        create_endpoint: cli.create_endpoint,
        confirm_endpoint: cli.confirm_endpoint.filter(|endpoint| !endpoint.is_empty()),
        upload_token: cli.upload_token.filter(|token| !token.is_empty()),
        max_file_bytes: cli.max_file_bytes,
        timeout: Duration::from_secs(cli.timeout_secs),
    };
    tracing::debug!(?config, "Loaded uploader configuration");

    let mut files = Vec::with_capacity(cli.files.len());
    for path in &cli.files {
        let file = SelectedFile::from_path(path)
            .await
            .with_context(|| format!("Failed to open {}", path.display()))?;
        files.push(file);
    }

    let transport = HttpTransport::new(&config).context("Failed to build HTTP client")?;
    let policy = UploadPolicy {
        max_file_bytes: config.max_file_bytes,
        max_files: DEFAULT_MAX_FILES,
    };
    let mut orchestrator =
        UploadOrchestrator::new(transport, policy).with_listener(Arc::new(TracingListener));

    let metadata = BatchMetadata {
        month: cli.month,
        photographer: cli.photographer.trim().to_string(),
        notes: cli.notes.trim().to_string(),
        upload_token: config.upload_token.clone(),
    };

    orchestrator.select(files);
    let mut report = orchestrator.submit(&metadata).await?;

    for attempt in 1..=cli.retries {
        let eligible = orchestrator.retry_eligible();
        if report.status == BatchStatus::AllSucceeded || eligible.is_empty() {
            break;
        }

        tracing::info!(attempt, files = eligible.len(), "Retrying failed uploads");
        for index in eligible {
            report = orchestrator.retry(index, &metadata).await?;
        }
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for entry in &report.entries {
            let mut line = format!("{}: {}", entry.name, entry.status_text);
            if entry.state == EntryState::Success {
                if let Some(url) = &entry.public_url {
                    line.push_str(&format!(" ({url})"));
                }
            }
            if let Some(warning) = &entry.warning {
                line.push_str(&format!(", warning: {warning}"));
            }
            println!("{line}");
        }
    }

    if report.status != BatchStatus::AllSucceeded {
        anyhow::bail!(report.summary());
    }
    Ok(())
}
