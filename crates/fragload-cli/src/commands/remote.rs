//! Save and delete commands - Act on files already on the server

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use fragload_core::config::{Config, UploaderConfig};
use fragload_core::domain::{RemoteRecord, ServerId};
use fragload_core::ports::{ExtraFields, TransportResponse};
use fragload_engine::hooks::UploadHooks;
use fragload_engine::uploader::Uploader;
use fragload_http::client::HttpTransport;
use tracing::info;

use super::parse_key_val;
use crate::output::{OutputFormat, Printer};

/// Save metadata of a file already on the server
#[derive(Debug, Args)]
pub struct SaveCommand {
    /// Server-assigned id of the file
    #[arg(long)]
    pub id: String,

    /// New title sent as the `title` field
    #[arg(long)]
    pub title: Option<String>,

    /// Edit endpoint (overrides uploader.edit_url)
    #[arg(long)]
    pub url: Option<String>,

    /// Extra form field (KEY=value, repeatable)
    #[arg(long = "data", value_parser = parse_key_val)]
    pub data: Vec<(String, String)>,
}

/// Delete a file from the server
#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// Server-assigned id of the file
    #[arg(long)]
    pub id: String,

    /// Delete endpoint (overrides uploader.delete_url)
    #[arg(long)]
    pub url: Option<String>,

    /// Extra form field (KEY=value, repeatable)
    #[arg(long = "data", value_parser = parse_key_val)]
    pub data: Vec<(String, String)>,
}

impl SaveCommand {
    pub async fn execute(&self, base: &Config, format: OutputFormat) -> Result<()> {
        let mut config = base.uploader.clone();
        if let Some(url) = &self.url {
            config.edit_url = Some(url.clone());
        }

        let mut fields: ExtraFields = self.data.iter().cloned().collect();
        if let Some(title) = &self.title {
            fields.insert("title".to_string(), title.clone());
        }
        let hooks = UploadHooks::new().before_save(move |_| fields.clone());

        let record = remote_record(&self.id, self.title.clone())?;
        let uploader = session(config, hooks, record)?;

        info!(id = %self.id, "Saving remote file");
        let response = uploader.save(0).await?;
        report(format, "Saved", &self.id, &response);
        Ok(())
    }
}

impl DeleteCommand {
    pub async fn execute(&self, base: &Config, format: OutputFormat) -> Result<()> {
        let mut config = base.uploader.clone();
        if let Some(url) = &self.url {
            config.delete_url = Some(url.clone());
        }

        let fields: ExtraFields = self.data.iter().cloned().collect();
        let hooks = UploadHooks::new().before_delete(move |_| fields.clone());

        let record = remote_record(&self.id, None)?;
        let uploader = session(config, hooks, record)?;

        info!(id = %self.id, "Deleting remote file");
        let response = uploader.delete(0).await?;
        report(format, "Deleted", &self.id, &response);
        Ok(())
    }
}

fn remote_record(id: &str, title: Option<String>) -> Result<RemoteRecord> {
    Ok(RemoteRecord {
        id: ServerId::new(id).context("Invalid file id")?,
        title: title.unwrap_or_default(),
        url: String::new(),
        size: 0,
    })
}

/// Session tracking a single remote file at index 0
fn session(config: UploaderConfig, hooks: UploadHooks, record: RemoteRecord) -> Result<Uploader> {
    let transport =
        HttpTransport::from_config(&config).context("Failed to create HTTP transport")?;
    let mut uploader = Uploader::new(config, Arc::new(transport)).with_hooks(hooks);
    uploader.add_remote([record]);
    Ok(uploader)
}

fn report(format: OutputFormat, action: &str, id: &str, response: &TransportResponse) {
    let out = Printer::new(format);
    if format.is_json() {
        out.json(&serde_json::json!({
            "success": true,
            "id": id,
            "status": response.status,
            "body": response.body,
        }));
    } else {
        out.ok(&format!("{} file {}", action, id));
        if !response.body.is_empty() {
            out.detail(&response.body);
        }
    }
}
