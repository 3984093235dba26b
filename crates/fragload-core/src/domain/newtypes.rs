//! Domain newtypes
//!
//! This module provides strongly-typed wrappers for the identifiers that
//! flow through an upload session. Each newtype ensures data validity at
//! construction time.

use std::fmt::{self, Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Deserializer, Serialize};

use super::errors::DomainError;

// ============================================================================
// DescriptorKey
// ============================================================================

/// Stable identity of a descriptor inside one registry
///
/// Unlike the position index, a key never changes when other descriptors
/// are removed. Transfer events address descriptors by key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DescriptorKey(u64);

impl DescriptorKey {
    /// Wraps a raw key value
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw key value
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl Display for DescriptorKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ============================================================================
// ServerId
// ============================================================================

/// Opaque identifier assigned by the server to an uploaded file
///
/// Servers answer with either a JSON string or a JSON number; both are
/// carried as their textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ServerId(String);

impl ServerId {
    /// Creates a new ServerId, rejecting empty values
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(DomainError::InvalidServerId(value));
        }
        Ok(Self(value))
    }

    /// Returns the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ServerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for ServerId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(serde_json::Number),
        }

        let raw = match RawId::deserialize(deserializer)? {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        };
        ServerId::new(raw).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// UploaderId
// ============================================================================

static NEXT_UPLOADER: AtomicU64 = AtomicU64::new(0);

/// Name of one uploader session (`uploader-file-<n>`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UploaderId(String);

impl UploaderId {
    /// Draws the next identifier from the process-wide counter
    pub fn next() -> Self {
        let n = NEXT_UPLOADER.fetch_add(1, Ordering::Relaxed);
        Self(format!("uploader-file-{n}"))
    }

    /// Uses a caller-supplied identifier
    pub fn from_name(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UploaderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
