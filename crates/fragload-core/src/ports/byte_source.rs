//! Byte source port (driven/secondary port)
//!
//! A byte source is the local content behind a descriptor. Transfers read
//! one fragment range at a time, so a source must support random-access
//! reads by byte offset.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because read failures are adapter-specific.
//! - Uses `#[async_trait]` so file-backed adapters can use async I/O.

use std::fmt;

use async_trait::async_trait;

/// Byte-range-addressable file contents
#[async_trait]
pub trait IByteSource: fmt::Debug + Send + Sync {
    /// Original file name, sent with every fragment
    fn name(&self) -> &str;

    /// Size in bytes at the time the source was opened
    fn size(&self) -> u64;

    /// Reads the bytes in `[start, end)`
    ///
    /// A source that shrank since it was opened returns what is left; the
    /// transfer rejects any read shorter than the requested range.
    async fn read_range(&self, start: u64, end: u64) -> anyhow::Result<Vec<u8>>;
}

/// In-memory source, used for generated content and tests
#[derive(Clone)]
pub struct MemorySource {
    name: String,
    data: Vec<u8>,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

impl fmt::Debug for MemorySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemorySource")
            .field("name", &self.name)
            .field("len", &self.data.len())
            .finish()
    }
}

#[async_trait]
impl IByteSource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    async fn read_range(&self, start: u64, end: u64) -> anyhow::Result<Vec<u8>> {
        let len = self.data.len();
        let start = (start as usize).min(len);
        let end = (end as usize).clamp(start, len);
        Ok(self.data[start..end].to_vec())
    }
}
