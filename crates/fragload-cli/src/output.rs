//! Terminal output for the `fragload` commands
//!
//! Human output goes to stdout with a status mark per line, failures to
//! stderr. JSON mode prints one document per command; the human-only
//! helpers are silent there, and [`Printer::json`] is silent in human mode.

use anyhow::{Context, Result};
use fragload_core::domain::{FileDescriptor, FileStatus};

/// Output format selector
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Human,
    Json,
}

impl OutputFormat {
    pub fn is_json(self) -> bool {
        matches!(self, OutputFormat::Json)
    }
}

/// Writes command results in the selected format
#[derive(Debug, Clone, Copy)]
pub struct Printer {
    format: OutputFormat,
}

impl Printer {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    fn human(&self) -> bool {
        !self.format.is_json()
    }

    pub fn ok(&self, message: &str) {
        if self.human() {
            println!("\u{2713} {message}");
        }
    }

    pub fn fail(&self, message: &str) {
        if self.human() {
            eprintln!("\u{2717} {message}");
        }
    }

    /// Indented detail line under a result
    pub fn detail(&self, message: &str) {
        if self.human() {
            println!("  {message}");
        }
    }

    pub fn json(&self, value: &serde_json::Value) {
        if self.format.is_json() {
            println!(
                "{}",
                serde_json::to_string_pretty(value).unwrap_or_default()
            );
        }
    }

    /// Final state of an upload session
    ///
    /// Human mode lists one line per file followed by a tally.
    pub fn upload_summary(&self, session: &str, files: &[FileDescriptor]) -> Result<()> {
        let completed = files
            .iter()
            .filter(|f| f.status() == FileStatus::Completed)
            .count();

        if self.format.is_json() {
            self.json(&serde_json::json!({
                "session": session,
                "completed": completed,
                "files": serde_json::to_value(files).context("Failed to serialize files")?,
            }));
            return Ok(());
        }

        for file in files {
            self.detail(&file_line(file));
        }
        let tally = format!("{completed}/{} files uploaded", files.len());
        if completed == files.len() {
            self.ok(&tally);
        } else {
            self.fail(&tally);
        }
        Ok(())
    }
}

/// One line per file: position, name, status, progress and remote url
pub fn file_line(file: &FileDescriptor) -> String {
    let mut line = format!(
        "[{}] {} - {} ({}%)",
        file.position_index(),
        file.name(),
        file.status(),
        file.percent()
    );
    if let Some(url) = file.remote_url() {
        line.push_str(&format!(" {url}"));
    }
    if let Some(error) = file.last_error() {
        line.push_str(&format!(" [{error}]"));
    }
    line
}
