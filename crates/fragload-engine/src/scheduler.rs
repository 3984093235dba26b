//! Upload scheduler - admission control over the file registry
//!
//! The [`UploadScheduler`] decides which `ReadyLocal` descriptors start
//! uploading. It never performs I/O: admission flips descriptors to
//! `InUpload` and returns their keys, and the session spawns the transfers.
//!
//! ## Flow
//!
//! ```text
//! start_upload ──→ admit() ──→ [keys] ──→ transfers spawned
//!                                              │
//! transfer ends ──→ release() ──→ tick() ──────┘
//! ```
//!
//! Descriptors demoted by a failure are held back from [`tick`] until the
//! next explicit [`admit`], so failed files are never retried on their own.
//!
//! [`tick`]: UploadScheduler::tick
//! [`admit`]: UploadScheduler::admit

use std::collections::HashSet;

use fragload_core::domain::newtypes::DescriptorKey;
use fragload_core::registry::FileRegistry;
use tracing::{debug, info, warn};

/// Admission control for one upload session
#[derive(Debug)]
pub struct UploadScheduler {
    /// Maximum number of concurrent transfers (at least 1)
    limit: usize,
    /// Transfers currently running
    active_count: usize,
    /// Files completed since the last batch end
    uploaded_files: usize,
    /// Demoted descriptors skipped by automatic ticks
    held: HashSet<DescriptorKey>,
}

impl UploadScheduler {
    /// Creates a scheduler; a zero limit acts as 1
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        debug!(limit, "Creating upload scheduler");
        Self {
            limit,
            active_count: 0,
            uploaded_files: 0,
            held: HashSet::new(),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn active_count(&self) -> usize {
        self.active_count
    }

    pub fn uploaded_files(&self) -> usize {
        self.uploaded_files
    }

    pub fn is_idle(&self) -> bool {
        self.active_count == 0
    }

    pub fn is_held(&self, key: DescriptorKey) -> bool {
        self.held.contains(&key)
    }

    // ========================================================================
    // Admission
    // ========================================================================

    /// Explicit admission requested by the caller
    ///
    /// Clears every hold, then admits ready descriptors in registry order
    /// until the limit is reached. Returns the keys admitted by this call.
    pub fn admit(&mut self, registry: &mut FileRegistry) -> Vec<DescriptorKey> {
        if !self.held.is_empty() {
            debug!(count = self.held.len(), "Releasing held files");
            self.held.clear();
        }
        self.select(registry)
    }

    /// Automatic admission after a transfer ends; held files are skipped
    pub fn tick(&mut self, registry: &mut FileRegistry) -> Vec<DescriptorKey> {
        self.select(registry)
    }

    fn select(&mut self, registry: &mut FileRegistry) -> Vec<DescriptorKey> {
        let mut admitted = Vec::new();

        for file in registry.iter_mut() {
            if self.active_count >= self.limit {
                break;
            }
            if !file.status().is_eligible() || self.held.contains(&file.key()) {
                continue;
            }
            if let Err(e) = file.begin_upload() {
                warn!(key = %file.key(), error = %e, "Skipping file that cannot start");
                continue;
            }
            self.active_count += 1;
            info!(
                key = %file.key(),
                position = file.position_index(),
                name = file.name(),
                active = self.active_count,
                "Admitted file"
            );
            admitted.push(file.key());
        }

        admitted
    }

    // ========================================================================
    // Slot accounting
    // ========================================================================

    /// Frees the slot of a transfer that completed successfully
    pub fn record_completion(&mut self) {
        self.active_count = self.active_count.saturating_sub(1);
        self.uploaded_files += 1;
    }

    /// Frees the slot of a failed transfer and holds its descriptor
    pub fn record_failure(&mut self, key: DescriptorKey) {
        self.active_count = self.active_count.saturating_sub(1);
        self.held.insert(key);
    }

    /// Frees the slot of a transfer whose descriptor was removed
    pub fn record_orphan(&mut self) {
        self.active_count = self.active_count.saturating_sub(1);
    }

    /// Drops the hold on a descriptor that left the registry
    pub fn forget(&mut self, key: DescriptorKey) {
        self.held.remove(&key);
    }

    /// Resets the per-batch counters after a batch end
    pub fn finish_batch(&mut self) {
        info!(uploaded = self.uploaded_files, "Upload batch finished");
        self.uploaded_files = 0;
    }
}

impl Default for UploadScheduler {
    fn default() -> Self {
        Self::new(1)
    }
}

// ============================================================================
// Unit tests
// ============================================================================
