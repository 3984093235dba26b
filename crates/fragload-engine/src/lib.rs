//! fragload Engine - Fragmented upload engine
//!
//! Provides:
//! - Admission control bounding how many files upload at once
//! - Per-file fragment transfers sent in strict sequence
//! - Save and delete requests for files already on the server
//! - The [`Uploader`](uploader::Uploader) session tying them together
//!
//! ## Modules
//!
//! - [`uploader`] - Upload session owning the registry and scheduler state
//! - [`scheduler`] - Admission control and batch accounting
//! - [`transfer`] - Per-file fragment loop running as a tokio task
//! - [`remote_sync`] - Save/delete forms for server-side files
//! - [`hooks`] - Caller callbacks for lifecycle events
//! - [`file_source`] - Local file adapter for the byte source port

pub mod file_source;
pub mod hooks;
pub mod remote_sync;
pub mod scheduler;
pub mod transfer;
pub mod uploader;

use fragload_core::domain::errors::DomainError;
use fragload_core::ports::TransportError;
use thiserror::Error;

/// Errors that can occur while uploading or syncing files
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UploadError {
    /// The transport failed or the server answered with an error status
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The last fragment's response was not JSON with `url` and `id`
    #[error("Malformed completion response: {0}")]
    MalformedResponse(String),

    /// The local file could not be read
    #[error("Source error: {0}")]
    Source(String),

    /// Save/delete targeted a file the server does not know about
    #[error("File at index {index} is not on the server")]
    NotOnServer {
        /// Registry position of the descriptor
        index: usize,
    },

    /// The endpoint needed for the operation is not configured
    #[error("No {0} configured")]
    MissingUrl(&'static str),

    /// A domain-level error propagated from fragload-core
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),
}

/// Coarse classification of an [`UploadError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Transport,
    MalformedResponse,
    Source,
    NotOnServer,
    MissingUrl,
    Domain,
}

impl UploadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            UploadError::Transport(_) => ErrorKind::Transport,
            UploadError::MalformedResponse(_) => ErrorKind::MalformedResponse,
            UploadError::Source(_) => ErrorKind::Source,
            UploadError::NotOnServer { .. } => ErrorKind::NotOnServer,
            UploadError::MissingUrl(_) => ErrorKind::MissingUrl,
            UploadError::Domain(_) => ErrorKind::Domain,
        }
    }
}
