//! Configuration module for fragload.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for fragload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub uploader: UploaderConfig,
    pub logging: LoggingConfig,
}

/// Upload session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploaderConfig {
    /// Maximum number of files uploading at once. Non-positive values act as 1.
    pub concurrency: i64,
    /// Endpoint receiving fragment requests. Required for uploads.
    pub upload_url: Option<String>,
    /// Endpoint receiving save requests for files already on the server.
    pub edit_url: Option<String>,
    /// Endpoint receiving delete requests for files already on the server.
    pub delete_url: Option<String>,
    /// Multipart field name carrying the fragment bytes.
    pub field_name: String,
    /// Static extra fields sent with every fragment.
    pub data: BTreeMap<String, String>,
    /// Headers sent with every request.
    pub headers: BTreeMap<String, String>,
    /// Keep and resend cookies across requests.
    pub with_credentials: bool,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/fragload/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("fragload")
            .join("config.yaml")
    }
}

impl UploaderConfig {
    /// Concurrency limit actually enforced by the scheduler (at least 1).
    pub fn effective_concurrency(&self) -> usize {
        if self.concurrency <= 0 {
            1
        } else {
            self.concurrency as usize
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            upload_url: None,
            edit_url: None,
            delete_url: None,
            field_name: "file".to_string(),
            data: BTreeMap::new(),
            headers: BTreeMap::new(),
            with_credentials: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"uploader.upload_url"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// URLs are optional here; commands that need one report its absence
    /// themselves. An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- uploader ---
        let urls = [
            ("uploader.upload_url", &self.uploader.upload_url),
            ("uploader.edit_url", &self.uploader.edit_url),
            ("uploader.delete_url", &self.uploader.delete_url),
        ];
        for (field, value) in urls {
            if let Some(value) = value {
                if let Err(err) = Url::parse(value) {
                    errors.push(ValidationError {
                        field: field.into(),
                        message: format!("invalid url '{value}': {err}"),
                    });
                }
            }
        }

        if self.uploader.field_name.trim().is_empty() {
            errors.push(ValidationError {
                field: "uploader.field_name".into(),
                message: "must not be empty".into(),
            });
        }

        for name in self.uploader.headers.keys() {
            if name.trim().is_empty() || name.contains(char::is_whitespace) {
                errors.push(ValidationError {
                    field: "uploader.headers".into(),
                    message: format!("invalid header name '{name}'"),
                });
            }
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use fragload_core::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .upload_url("https://example.com/upload")
///     .concurrency(3)
///     .data("album", "42")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Start from an existing configuration, e.g. one loaded from disk.
    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    // --- uploader ---

    pub fn concurrency(mut self, n: i64) -> Self {
        self.config.uploader.concurrency = n;
        self
    }

    pub fn upload_url(mut self, url: impl Into<String>) -> Self {
        self.config.uploader.upload_url = Some(url.into());
        self
    }

    pub fn edit_url(mut self, url: impl Into<String>) -> Self {
        self.config.uploader.edit_url = Some(url.into());
        self
    }

    pub fn delete_url(mut self, url: impl Into<String>) -> Self {
        self.config.uploader.delete_url = Some(url.into());
        self
    }

    pub fn field_name(mut self, name: impl Into<String>) -> Self {
        self.config.uploader.field_name = name.into();
        self
    }

    pub fn data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.uploader.data.insert(key.into(), value.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.uploader.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_credentials(mut self, enabled: bool) -> Self {
        self.config.uploader.with_credentials = enabled;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
