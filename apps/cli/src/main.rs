//! Command-line chunk uploader.
//!
//! Tails a local WebM file as it grows and POSTs each new chunk to an
//! HTTP endpoint through the upload engine.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, error, info, warn};

use webmup_file_reader::FileReader;
use webmup_transport::HttpTransport;
use webmup_uploader::{UploadError, UploadSettings, Uploader};

#[derive(Parser)]
#[command(name = "webmup")]
#[command(author, version, about = "Chunked WebM stream uploader")]
struct Cli {
    /// Upload endpoint URL
    #[arg(long)]
    url: String,

    /// Local file to tail and upload
    #[arg(long)]
    file: PathBuf,

    /// Display name declared for the chunk field (defaults to the file name)
    #[arg(long)]
    name: Option<String>,

    /// Maximum bytes per chunk
    #[arg(long, default_value_t = 256 * 1024)]
    chunk_size: usize,

    /// Extra multipart form field (repeatable)
    #[arg(long = "form", value_name = "KEY=VALUE")]
    form: Vec<String>,

    /// Extra HTTP header (repeatable)
    #[arg(long = "header", value_name = "NAME:VALUE")]
    header: Vec<String>,

    /// Poll interval while waiting for data or an active transfer
    #[arg(long, default_value_t = 100)]
    poll_ms: u64,

    /// Keep tailing the file after end-of-file instead of exiting
    #[arg(long)]
    follow: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn split_pair(raw: &str, sep: char) -> anyhow::Result<(String, String)> {
    raw.split_once(sep)
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .with_context(|| format!("expected <key>{sep}<value>, got {raw:?}"))
}

fn build_settings(cli: &Cli) -> anyhow::Result<UploadSettings> {
    let file_name = match &cli.name {
        Some(name) => name.clone(),
        None => cli
            .file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .context("--file has no file name component")?,
    };
    let mut settings = UploadSettings::new(cli.url.clone(), file_name);
    for raw in &cli.header {
        let (name, value) = split_pair(raw, ':')?;
        settings.headers.insert(name, value);
    }
    for raw in &cli.form {
        let (key, value) = split_pair(raw, '=')?;
        settings.form_fields.insert(key, value);
    }
    Ok(settings)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "webmup=debug,webmup_uploader=debug,webmup_transport=debug".to_string()
        } else {
            "info".to_string()
        }
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let settings = build_settings(&cli)?;
    let transport = HttpTransport::new(&settings)?;
    let mut uploader = Uploader::init(settings, Box::new(transport))?;
    uploader.run();

    let mut reader = FileReader::open(&cli.file)?;
    info!(file = %cli.file.display(), url = %cli.url, "uploading");

    let poll = Duration::from_millis(cli.poll_ms);
    let mut pending: Option<Vec<u8>> = None;
    let mut interrupted = false;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, stopping");
                interrupted = true;
                break;
            }
            _ = tokio::time::sleep(poll) => {}
        }

        if !uploader.is_complete() {
            continue;
        }

        let chunk = match pending.take() {
            Some(chunk) => chunk,
            None => match reader.read_chunk(cli.chunk_size)? {
                Some(chunk) => chunk,
                None if cli.follow => continue,
                None => break,
            },
        };

        let length = chunk.len();
        match uploader.submit(&chunk) {
            Ok(()) => {
                let stats = uploader.stats();
                debug!(
                    bytes = length,
                    offset = reader.offset(),
                    bytes_per_second = stats.bytes_per_second,
                    "chunk submitted"
                );
            }
            Err(UploadError::UploadInProgress) => {
                // The previous transfer is still releasing the slot.
                pending = Some(chunk);
            }
            Err(e) => {
                error!(error = %e, "submit failed");
                break;
            }
        }
    }

    // Let an in-flight final transfer finish unless the user interrupted.
    while !interrupted && !uploader.is_complete() {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                warn!("interrupted while draining");
                break;
            }
            _ = tokio::time::sleep(poll) => {}
        }
    }

    let stats = uploader.stats();
    uploader.stop().await;
    info!(
        uploaded = reader.offset(),
        bytes_per_second = stats.bytes_per_second,
        "done"
    );
    Ok(())
}
