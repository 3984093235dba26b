//! Upload command - Send local files in fragments
//!
//! Builds a session from the configuration plus command-line overrides,
//! uploads every given file and prints the final state of each one.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use fragload_core::config::{Config, ConfigBuilder};
use fragload_core::domain::FileStatus;
use fragload_core::ports::IByteSource;
use fragload_engine::file_source::FileSource;
use fragload_engine::hooks::UploadHooks;
use fragload_engine::uploader::Uploader;
use fragload_http::client::HttpTransport;
use tracing::{debug, info};

use super::parse_key_val;
use crate::output::{OutputFormat, Printer};

/// Upload local files
#[derive(Debug, Args)]
pub struct UploadCommand {
    /// Files to upload, in order
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Upload endpoint (overrides uploader.upload_url)
    #[arg(long)]
    pub url: Option<String>,

    /// Maximum number of files uploading at once
    #[arg(long)]
    pub concurrency: Option<i64>,

    /// Name of the multipart field carrying the bytes
    #[arg(long)]
    pub field_name: Option<String>,

    /// Extra form field sent with every fragment (KEY=value, repeatable)
    #[arg(long = "data", value_parser = parse_key_val)]
    pub data: Vec<(String, String)>,

    /// Extra request header (NAME=value, repeatable)
    #[arg(long = "header", value_parser = parse_key_val)]
    pub headers: Vec<(String, String)>,
}

impl UploadCommand {
    /// Applies command-line overrides on top of the loaded configuration
    pub fn effective_config(&self, base: &Config) -> Result<Config> {
        let mut builder = ConfigBuilder::from_config(base.clone());
        if let Some(url) = &self.url {
            builder = builder.upload_url(url);
        }
        if let Some(n) = self.concurrency {
            builder = builder.concurrency(n);
        }
        if let Some(name) = &self.field_name {
            builder = builder.field_name(name);
        }
        for (key, value) in &self.data {
            builder = builder.data(key, value);
        }
        for (name, value) in &self.headers {
            builder = builder.header(name, value);
        }

        let config = builder.build_validated().map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            anyhow::anyhow!("Invalid configuration: {}", messages.join("; "))
        })?;

        if config.uploader.upload_url.is_none() {
            anyhow::bail!("No upload url configured; pass --url or set uploader.upload_url");
        }
        Ok(config)
    }

    pub async fn execute(&self, base: &Config, format: OutputFormat) -> Result<()> {
        let out = Printer::new(format);
        let config = self.effective_config(base)?;

        let mut sources: Vec<Arc<dyn IByteSource>> = Vec::with_capacity(self.files.len());
        for path in &self.files {
            let source = FileSource::open(path).await?;
            sources.push(Arc::new(source));
        }

        let transport = HttpTransport::from_config(&config.uploader)
            .context("Failed to create HTTP transport")?;
        let mut uploader =
            Uploader::new(config.uploader, Arc::new(transport)).with_hooks(hooks(out));
        uploader.add_local(sources);

        info!(session = %uploader.id(), files = self.files.len(), "Starting upload");
        uploader.start_upload()?;
        uploader.run_until_idle().await;

        let files = uploader.files();
        out.upload_summary(uploader.id().as_str(), files)?;

        let failed = files
            .iter()
            .filter(|f| f.status() != FileStatus::Completed)
            .count();
        if failed > 0 {
            anyhow::bail!("{} of {} files were not uploaded", failed, files.len());
        }
        Ok(())
    }
}

/// Hooks reporting per-file outcomes; JSON output only prints the summary
fn hooks(out: Printer) -> UploadHooks {
    UploadHooks::new()
        .on_progress(|file| {
            debug!(name = file.name(), percent = file.percent(), "Upload progress");
        })
        .on_completed(move |file, _| out.ok(&format!("Uploaded {}", file.name())))
        .on_error(move |file, error| out.fail(&format!("{}: {}", file.name(), error)))
        .on_completed_all(|files| {
            info!(files = files.len(), "Upload batch finished");
        })
}
