//! Local file adapter for the byte source port
//!
//! Implements [`IByteSource`] over `tokio::fs`. The file is re-opened for
//! every range so no handle is held between fragments.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use async_trait::async_trait;
use fragload_core::ports::IByteSource;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::{debug, instrument};

/// A regular file on the local filesystem
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    name: String,
    size: u64,
}

impl FileSource {
    /// Opens `path`, recording its name and current size
    pub async fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let metadata = tokio::fs::metadata(&path)
            .await
            .with_context(|| format!("Failed to stat {}", path.display()))?;
        if !metadata.is_file() {
            bail!("{} is not a regular file", path.display());
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            name,
            size: metadata.len(),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl IByteSource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.size
    }

    #[instrument(skip(self))]
    async fn read_range(&self, start: u64, end: u64) -> anyhow::Result<Vec<u8>> {
        let mut file = tokio::fs::File::open(&self.path)
            .await
            .with_context(|| format!("Failed to open {}", self.path.display()))?;
        file.seek(SeekFrom::Start(start))
            .await
            .context("Failed to seek")?;

        let len = end.saturating_sub(start);
        let mut buf = Vec::with_capacity(len as usize);
        file.take(len)
            .read_to_end(&mut buf)
            .await
            .context("Failed to read range")?;

        debug!(path = %self.path.display(), bytes = buf.len(), "range read complete");
        Ok(buf)
    }
}
