//! Upload transport port (driven/secondary port)
//!
//! This module defines the interface used to reach the upload server.
//! Two request shapes exist:
//! - fragment requests, one per fragment of a local file, carrying the
//!   fragment bytes and sequencing flags as multipart fields
//! - form requests, used to save or delete metadata of files that already
//!   live on the server
//!
//! ## Design Notes
//!
//! - Request types are plain data so they can be inspected in tests
//!   without any HTTP stack.
//! - Progress is reported as byte deltas through a shared callback while
//!   the fragment body is being sent.
//! - A non-success HTTP status is a transport error; only the body of a
//!   successful last fragment is interpreted by the engine.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::domain::fragment::FragmentSpec;
use crate::domain::newtypes::ServerId;

/// Caller-defined text fields appended to every request
pub type ExtraFields = BTreeMap<String, String>;

/// Receives the number of bytes sent since the previous call
pub type ProgressFn = Arc<dyn Fn(u64) + Send + Sync>;

/// Multipart field flagging fragment 0
pub const FIELD_INIT: &str = "fileInit";
/// Multipart field carrying the last-fragment flag
pub const FIELD_LAST_FRAGMENT: &str = "fileLastFragment";
/// Multipart field carrying the 0-based fragment index
pub const FIELD_FRAGMENT_NUM: &str = "fileFragmentNum";
/// Multipart field (and delete query parameter) carrying the server id
pub const FIELD_FILE_ID: &str = "fileId";

// ============================================================================
// TransportError
// ============================================================================

/// Errors raised while talking to the server
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Connection, TLS or body-streaming failure
    #[error("Network error: {0}")]
    Network(String),

    /// Server answered with a non-success status
    #[error("Server returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, possibly empty
        body: String,
    },

    /// Target URL could not be parsed
    #[error("Invalid url: {0}")]
    InvalidUrl(String),
}

// ============================================================================
// Requests and responses
// ============================================================================

/// Raw server answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// One fragment of one file
#[derive(Debug, Clone)]
pub struct FragmentRequest {
    /// Upload endpoint
    pub url: String,
    /// Multipart field name for the fragment bytes
    pub field_name: String,
    /// Original file name, attached to the byte part
    pub file_name: String,
    pub fragment: FragmentSpec,
    /// Bytes `[fragment.start, fragment.end)`
    pub data: Vec<u8>,
    pub extra: ExtraFields,
}

impl FragmentRequest {
    /// Text fields in the order they are written to the form
    ///
    /// `fileInit` only appears on fragment 0. Extra fields follow the
    /// sequencing fields; the byte part is appended last by the transport.
    pub fn text_fields(&self) -> Vec<(String, String)> {
        let mut fields = Vec::with_capacity(self.extra.len() + 3);
        if self.fragment.is_init() {
            fields.push((FIELD_INIT.to_string(), "true".to_string()));
        }
        fields.push((
            FIELD_LAST_FRAGMENT.to_string(),
            self.fragment.is_last.to_string(),
        ));
        fields.push((
            FIELD_FRAGMENT_NUM.to_string(),
            self.fragment.index.to_string(),
        ));
        fields.extend(self.extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        fields
    }
}

/// Non-fragmented request about a file already on the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormRequest {
    pub url: String,
    pub fields: Vec<(String, String)>,
}

impl FormRequest {
    /// Save request: `fileId` followed by the extra fields
    pub fn save(url: &str, id: &ServerId, extra: &ExtraFields) -> Self {
        Self {
            url: url.to_string(),
            fields: file_fields(id, extra),
        }
    }

    /// Delete request: the id also travels as a `fileId` query parameter
    pub fn delete(url: &str, id: &ServerId, extra: &ExtraFields) -> Result<Self, TransportError> {
        let mut target =
            Url::parse(url).map_err(|e| TransportError::InvalidUrl(format!("{url}: {e}")))?;
        target
            .query_pairs_mut()
            .append_pair(FIELD_FILE_ID, id.as_str());
        Ok(Self {
            url: target.into(),
            fields: file_fields(id, extra),
        })
    }
}

fn file_fields(id: &ServerId, extra: &ExtraFields) -> Vec<(String, String)> {
    let mut fields = vec![(FIELD_FILE_ID.to_string(), id.as_str().to_string())];
    fields.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
    fields
}

// ============================================================================
// IUploadTransport
// ============================================================================

/// Port for reaching the upload server
#[async_trait]
pub trait IUploadTransport: Send + Sync {
    /// Sends one fragment, reporting byte deltas through `progress`
    ///
    /// Returns once the server has answered. A non-success status is
    /// reported as [`TransportError::Status`].
    async fn send_fragment(
        &self,
        request: FragmentRequest,
        progress: ProgressFn,
    ) -> Result<TransportResponse, TransportError>;

    /// Sends a save or delete form
    async fn send_form(&self, request: FormRequest) -> Result<TransportResponse, TransportError>;
}
