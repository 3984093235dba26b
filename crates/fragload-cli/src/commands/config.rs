//! Config command - View and manage fragload configuration
//!
//! Provides the `fragload config` CLI command which:
//! 1. Shows the current configuration (YAML or JSON)
//! 2. Sets individual configuration values via dot-notation keys
//! 3. Validates the configuration file and reports errors
//! 4. Prints the configuration file location

use std::path::Path;

use anyhow::{Context, Result};
use clap::Subcommand;
use fragload_core::config::Config;
use tracing::info;

use crate::output::{OutputFormat, Printer};

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "uploader.concurrency", "uploader.data.album")
        key: String,
        /// New value
        value: String,
    },
    /// Validate configuration file
    Validate,
    /// Print the configuration file path
    Path,
}

impl ConfigCommand {
    pub async fn execute(&self, config_path: &Path, format: OutputFormat) -> Result<()> {
        match self {
            ConfigCommand::Show => execute_show(config_path, format),
            ConfigCommand::Set { key, value } => execute_set(config_path, key, value, format),
            ConfigCommand::Validate => execute_validate(config_path, format),
            ConfigCommand::Path => {
                let out = Printer::new(format);
                if format.is_json() {
                    out.json(&serde_json::json!({
                        "config_path": config_path.display().to_string(),
                        "exists": config_path.exists(),
                    }));
                } else {
                    println!("{}", config_path.display());
                }
                Ok(())
            }
        }
    }
}

fn execute_show(config_path: &Path, format: OutputFormat) -> Result<()> {
    let out = Printer::new(format);
    let config = Config::load_or_default(config_path);

    info!(config_path = %config_path.display(), "Showing configuration");

    if format.is_json() {
        let json =
            serde_json::to_value(&config).context("Failed to serialize configuration to JSON")?;
        out.json(&json);
    } else {
        out.ok(&format!("Configuration ({})", config_path.display()));
        out.detail("");

        let yaml =
            serde_yaml::to_string(&config).context("Failed to serialize configuration to YAML")?;
        for line in yaml.lines() {
            out.detail(line);
        }
    }

    Ok(())
}

fn execute_set(config_path: &Path, key: &str, value: &str, format: OutputFormat) -> Result<()> {
    let out = Printer::new(format);
    let mut config = Config::load_or_default(config_path);

    info!(key = %key, value = %value, "Setting configuration value");

    if let Err(e) = apply_config_value(&mut config, key, value) {
        if format.is_json() {
            out.json(&serde_json::json!({
                "success": false,
                "key": key,
                "value": value,
                "error": e.to_string(),
            }));
        } else {
            out.fail(&format!("Failed to set '{}': {}", key, e));
            out.detail("");
            out.detail("Supported keys:");
            out.detail("  uploader.concurrency        - Files uploading at once");
            out.detail("  uploader.upload_url         - Fragment endpoint");
            out.detail("  uploader.edit_url           - Save endpoint");
            out.detail("  uploader.delete_url         - Delete endpoint (none to unset)");
            out.detail("  uploader.field_name         - Multipart field for the bytes");
            out.detail("  uploader.with_credentials   - true|false");
            out.detail("  uploader.data.<name>        - Extra form field");
            out.detail("  uploader.headers.<name>     - Extra request header");
            out.detail("  logging.level               - trace|debug|info|warn|error");
        }
        return Ok(());
    }

    let errors = config.validate();
    if !errors.is_empty() {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        if format.is_json() {
            out.json(&serde_json::json!({
                "success": false,
                "key": key,
                "value": value,
                "errors": messages,
            }));
        } else {
            out.fail(&format!(
                "Invalid value for '{}': {}",
                key,
                messages.join("; ")
            ));
        }
        return Ok(());
    }

    save_config(&config, config_path)?;

    if format.is_json() {
        out.json(&serde_json::json!({
            "success": true,
            "key": key,
            "value": value,
            "config_path": config_path.display().to_string(),
        }));
    } else {
        out.ok(&format!("Set {} = {}", key, value));
        out.detail(&format!("Saved to {}", config_path.display()));
    }
    Ok(())
}

fn execute_validate(config_path: &Path, format: OutputFormat) -> Result<()> {
    let out = Printer::new(format);

    let config = match Config::load(config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            let message = if config_path.exists() {
                format!("Failed to parse configuration: {:#}", e)
            } else {
                "Configuration file not found. Using defaults.".to_string()
            };
            if format.is_json() {
                out.json(&serde_json::json!({
                    "valid": false,
                    "config_path": config_path.display().to_string(),
                    "errors": [message],
                }));
            } else {
                out.fail(&message);
                out.detail(&format!("File: {}", config_path.display()));
            }
            return Ok(());
        }
    };

    info!(config_path = %config_path.display(), "Validating configuration");

    let errors = config.validate();

    if format.is_json() {
        let error_strings: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        out.json(&serde_json::json!({
            "valid": errors.is_empty(),
            "config_path": config_path.display().to_string(),
            "errors": error_strings,
        }));
    } else if errors.is_empty() {
        out.ok("Configuration is valid");
        out.detail(&format!("File: {}", config_path.display()));
    } else {
        out.fail(&format!(
            "Configuration has {} error{}:",
            errors.len(),
            if errors.len() == 1 { "" } else { "s" }
        ));
        out.detail(&format!("File: {}", config_path.display()));
        out.detail("");
        for error in &errors {
            out.detail(&format!("  {} - {}", error.field, error.message));
        }
    }

    Ok(())
}

fn save_config(config: &Config, config_path: &Path) -> Result<()> {
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create configuration directory")?;
    }
    let yaml = serde_yaml::to_string(config).context("Failed to serialize configuration")?;
    std::fs::write(config_path, yaml).context("Failed to write configuration file")?;
    Ok(())
}

fn optional_url(value: &str) -> Option<String> {
    if value.is_empty() || value == "none" {
        None
    } else {
        Some(value.to_string())
    }
}

/// Apply a dot-notation key/value pair to a Config struct
fn apply_config_value(config: &mut Config, key: &str, value: &str) -> Result<()> {
    if let Some(name) = key.strip_prefix("uploader.data.") {
        config
            .uploader
            .data
            .insert(name.to_string(), value.to_string());
        return Ok(());
    }
    if let Some(name) = key.strip_prefix("uploader.headers.") {
        config
            .uploader
            .headers
            .insert(name.to_string(), value.to_string());
        return Ok(());
    }

    match key {
        "uploader.concurrency" => {
            config.uploader.concurrency = value
                .parse::<i64>()
                .context("Expected an integer for uploader.concurrency")?;
        }
        "uploader.upload_url" => config.uploader.upload_url = optional_url(value),
        "uploader.edit_url" => config.uploader.edit_url = optional_url(value),
        "uploader.delete_url" => config.uploader.delete_url = optional_url(value),
        "uploader.field_name" => config.uploader.field_name = value.to_string(),
        "uploader.with_credentials" => {
            config.uploader.with_credentials = value
                .parse::<bool>()
                .context("Expected true or false for uploader.with_credentials")?;
        }
        "logging.level" => config.logging.level = value.to_string(),
        _ => anyhow::bail!("Unknown configuration key: '{}'", key),
    }

    Ok(())
}
