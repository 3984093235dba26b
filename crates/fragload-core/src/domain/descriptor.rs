//! FileDescriptor domain entity
//!
//! A descriptor tracks one file known to an upload session, either a local
//! file waiting to be sent or a file that already exists on the server.
//!
//! ## State Machine
//!
//! ```text
//!   ┌────────────┐  admit   ┌──────────┐  last fragment ok  ┌───────────┐
//!   │ ReadyLocal │ ───────► │ InUpload │ ─────────────────► │ Completed │
//!   └────────────┘          └──────────┘                    └───────────┘
//!          ▲                   │     │                            │
//!          │  transport/       │     │ unreadable source          │ save / delete
//!          └── malformed ──────┘     ▼                            ▼
//!                              ┌──────────┐              ┌─────────────────┐
//!                              │  Failed  │              │ ReadyRemoteOnly │
//!                              └──────────┘              └─────────────────┘
//! ```
//!
//! `ReadyRemoteOnly` descriptors are created directly from server records
//! and never enter a transfer.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::newtypes::{DescriptorKey, ServerId};
use crate::ports::byte_source::IByteSource;

// ============================================================================
// FileStatus
// ============================================================================

/// Lifecycle status of a descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// Local file eligible for admission
    ReadyLocal,
    /// File that exists only on the server; target for save/delete
    ReadyRemoteOnly,
    /// Fragments are being sent
    InUpload,
    /// Every fragment was accepted and the server assigned an id
    Completed,
    /// The local source could not be read; not eligible for admission
    Failed,
}

impl FileStatus {
    /// Returns true if the scheduler may admit this descriptor
    pub fn is_eligible(&self) -> bool {
        matches!(self, FileStatus::ReadyLocal)
    }

    /// Returns true if the canonical copy lives on the server
    pub fn is_on_server(&self) -> bool {
        matches!(self, FileStatus::ReadyRemoteOnly | FileStatus::Completed)
    }

    /// Returns the state name in snake_case
    pub fn name(&self) -> &'static str {
        match self {
            FileStatus::ReadyLocal => "ready_local",
            FileStatus::ReadyRemoteOnly => "ready_remote_only",
            FileStatus::InUpload => "in_upload",
            FileStatus::Completed => "completed",
            FileStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// RemoteRecord
// ============================================================================

/// A file the server already knows about, as listed by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRecord {
    pub id: ServerId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub size: u64,
}

// ============================================================================
// FileDescriptor
// ============================================================================

/// One tracked file, local or remote
#[derive(Debug, Clone, Serialize)]
pub struct FileDescriptor {
    #[serde(skip_serializing)]
    key: DescriptorKey,
    /// Byte-range-addressable source; `None` for remote-only files
    #[serde(skip_serializing)]
    source: Option<Arc<dyn IByteSource>>,
    name: String,
    title: String,
    declared_size: u64,
    loaded_bytes: u64,
    server_id: Option<ServerId>,
    remote_url: Option<String>,
    status: FileStatus,
    position_index: usize,
    last_error: Option<String>,
}

impl FileDescriptor {
    /// Creates a descriptor for a local source, ready to be admitted
    pub fn local(key: DescriptorKey, position_index: usize, source: Arc<dyn IByteSource>) -> Self {
        Self {
            key,
            name: source.name().to_string(),
            declared_size: source.size(),
            source: Some(source),
            title: String::new(),
            loaded_bytes: 0,
            server_id: None,
            remote_url: None,
            status: FileStatus::ReadyLocal,
            position_index,
            last_error: None,
        }
    }

    /// Creates a descriptor for a file that already exists on the server
    pub fn remote(key: DescriptorKey, position_index: usize, record: RemoteRecord) -> Self {
        Self {
            key,
            source: None,
            name: record.title.clone(),
            title: record.title,
            declared_size: record.size,
            loaded_bytes: 0,
            server_id: Some(record.id),
            remote_url: Some(record.url),
            status: FileStatus::ReadyRemoteOnly,
            position_index,
            last_error: None,
        }
    }

    pub fn key(&self) -> DescriptorKey {
        self.key
    }

    pub fn source(&self) -> Option<&Arc<dyn IByteSource>> {
        self.source.as_ref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn declared_size(&self) -> u64 {
        self.declared_size
    }

    pub fn loaded_bytes(&self) -> u64 {
        self.loaded_bytes
    }

    pub fn server_id(&self) -> Option<&ServerId> {
        self.server_id.as_ref()
    }

    pub fn remote_url(&self) -> Option<&str> {
        self.remote_url.as_deref()
    }

    pub fn status(&self) -> FileStatus {
        self.status
    }

    pub fn position_index(&self) -> usize {
        self.position_index
    }

    /// Message of the most recent failure, cleared on re-admission
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Upload progress as a whole percentage
    pub fn percent(&self) -> u8 {
        if self.declared_size == 0 {
            return if self.status == FileStatus::Completed { 100 } else { 0 };
        }
        ((self.loaded_bytes.saturating_mul(100)) / self.declared_size).min(100) as u8
    }

    pub(crate) fn set_position_index(&mut self, position_index: usize) {
        self.position_index = position_index;
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// ReadyLocal → InUpload; progress restarts from zero
    pub fn begin_upload(&mut self) -> Result<(), DomainError> {
        if self.status != FileStatus::ReadyLocal || self.source.is_none() {
            return Err(self.invalid_transition(FileStatus::InUpload));
        }
        self.status = FileStatus::InUpload;
        self.loaded_bytes = 0;
        self.last_error = None;
        Ok(())
    }

    /// Adds `delta` acknowledged bytes
    ///
    /// When the running total passes the declared size, the declared size
    /// is raised to match. Returns true in that case.
    pub fn record_progress(&mut self, delta: u64) -> bool {
        self.loaded_bytes = self.loaded_bytes.saturating_add(delta);
        if self.loaded_bytes > self.declared_size {
            self.declared_size = self.loaded_bytes;
            return true;
        }
        false
    }

    /// InUpload → Completed, setting the server id and url together
    pub fn complete(&mut self, server_id: ServerId, remote_url: String) -> Result<(), DomainError> {
        if self.status != FileStatus::InUpload {
            return Err(self.invalid_transition(FileStatus::Completed));
        }
        self.server_id = Some(server_id);
        self.remote_url = Some(remote_url);
        self.status = FileStatus::Completed;
        Ok(())
    }

    /// InUpload → ReadyLocal after a transport or protocol failure
    pub fn demote(&mut self, reason: impl Into<String>) -> Result<(), DomainError> {
        if self.status != FileStatus::InUpload {
            return Err(self.invalid_transition(FileStatus::ReadyLocal));
        }
        self.status = FileStatus::ReadyLocal;
        self.last_error = Some(reason.into());
        Ok(())
    }

    /// InUpload → Failed when the source itself is unusable
    pub fn mark_failed(&mut self, reason: impl Into<String>) -> Result<(), DomainError> {
        if self.status != FileStatus::InUpload {
            return Err(self.invalid_transition(FileStatus::Failed));
        }
        self.status = FileStatus::Failed;
        self.last_error = Some(reason.into());
        Ok(())
    }

    fn invalid_transition(&self, to: FileStatus) -> DomainError {
        DomainError::InvalidState {
            from: self.status.to_string(),
            to: to.to_string(),
        }
    }
}
