//! Upload session
//!
//! The [`Uploader`] is the single owner of a session's state: the file
//! registry, the scheduler counters and the caller hooks. Transfers run as
//! tokio tasks holding only a snapshot of their file and report back over
//! a channel; the session applies those reports one at a time through
//! [`Uploader::step`], so no lock guards descriptors or counters.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use fragload_core::config::ConfigBuilder;
//! use fragload_core::ports::{IByteSource, MemorySource};
//! use fragload_engine::hooks::UploadHooks;
//! use fragload_engine::uploader::Uploader;
//! # use fragload_core::ports::IUploadTransport;
//!
//! # async fn example(transport: Arc<dyn IUploadTransport>) -> anyhow::Result<()> {
//! let config = ConfigBuilder::new()
//!     .upload_url("https://files.example.com/upload")
//!     .concurrency(2)
//!     .build();
//!
//! let hooks = UploadHooks::new().on_completed_all(|files| println!("{} files", files.len()));
//! let mut uploader = Uploader::new(config.uploader, transport).with_hooks(hooks);
//!
//! let source: Arc<dyn IByteSource> = Arc::new(MemorySource::new("a.txt", b"hello".to_vec()));
//! uploader.add_local([source]);
//! uploader.start_upload()?;
//! uploader.run_until_idle().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Design Notes
//!
//! - Completion order: ids are set, the slot is released, the next files
//!   are admitted, `on_completed` fires, and the batch hook fires last if
//!   nothing is left running.
//! - Events for descriptors removed mid-transfer are dropped, but their
//!   slot is still released.

use std::sync::Arc;

use fragload_core::config::UploaderConfig;
use fragload_core::domain::newtypes::{DescriptorKey, ServerId, UploaderId};
use fragload_core::domain::{FileDescriptor, FileStatus, RemoteRecord};
use fragload_core::ports::{IByteSource, IUploadTransport, TransportResponse};
use fragload_core::registry::FileRegistry;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::hooks::UploadHooks;
use crate::remote_sync::RemoteSync;
use crate::scheduler::UploadScheduler;
use crate::transfer::{FragmentTransfer, TransferEvent, TransferJob};
use crate::UploadError;

// ============================================================================
// Uploader
// ============================================================================

/// One upload session
pub struct Uploader {
    id: UploaderId,
    config: UploaderConfig,
    registry: FileRegistry,
    scheduler: UploadScheduler,
    hooks: UploadHooks,
    transport: Arc<dyn IUploadTransport>,
    remote: RemoteSync,
    events_tx: UnboundedSender<TransferEvent>,
    events_rx: UnboundedReceiver<TransferEvent>,
}

impl Uploader {
    /// Creates a session with default hooks and a fresh session id
    pub fn new(config: UploaderConfig, transport: Arc<dyn IUploadTransport>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let id = UploaderId::next();
        let scheduler = UploadScheduler::new(config.effective_concurrency());
        let remote = RemoteSync::new(
            Arc::clone(&transport),
            config.edit_url.clone(),
            config.delete_url.clone(),
        );

        info!(
            id = %id,
            concurrency = scheduler.limit(),
            "Created upload session"
        );

        Self {
            id,
            config,
            registry: FileRegistry::new(),
            scheduler,
            hooks: UploadHooks::default(),
            transport,
            remote,
            events_tx,
            events_rx,
        }
    }

    pub fn with_hooks(mut self, hooks: UploadHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Replaces the generated session id
    pub fn with_id(mut self, id: UploaderId) -> Self {
        self.id = id;
        self
    }

    pub fn id(&self) -> &UploaderId {
        &self.id
    }

    pub fn config(&self) -> &UploaderConfig {
        &self.config
    }

    /// Ordered view of every tracked file
    pub fn files(&self) -> &[FileDescriptor] {
        self.registry.list()
    }

    pub fn registry(&self) -> &FileRegistry {
        &self.registry
    }

    pub fn active_count(&self) -> usize {
        self.scheduler.active_count()
    }

    pub fn uploaded_files(&self) -> usize {
        self.scheduler.uploaded_files()
    }

    pub fn is_idle(&self) -> bool {
        self.scheduler.is_idle()
    }

    // ========================================================================
    // Registry operations
    // ========================================================================

    /// Tracks local files, ready for the next [`start_upload`](Self::start_upload)
    pub fn add_local<I>(&mut self, sources: I) -> Vec<DescriptorKey>
    where
        I: IntoIterator<Item = Arc<dyn IByteSource>>,
    {
        let keys = self.registry.add_local(sources);
        debug!(count = keys.len(), total = self.registry.len(), "Added local files");
        keys
    }

    /// Tracks files that already live on the server
    pub fn add_remote<I>(&mut self, records: I) -> Vec<DescriptorKey>
    where
        I: IntoIterator<Item = RemoteRecord>,
    {
        let keys = self.registry.add_remote(records);
        debug!(count = keys.len(), total = self.registry.len(), "Added remote files");
        keys
    }

    /// Stops tracking the file at `index`
    ///
    /// A transfer already running for it keeps going; its reports are
    /// ignored once they arrive.
    pub fn remove(&mut self, index: usize) -> Result<FileDescriptor, UploadError> {
        let removed = self.registry.remove(index)?;
        self.scheduler.forget(removed.key());
        if removed.status() == FileStatus::InUpload {
            warn!(key = %removed.key(), "Removed a file while it was uploading");
        }
        Ok(removed)
    }

    // ========================================================================
    // Upload
    // ========================================================================

    /// Admits ready files up to the concurrency limit and starts them
    ///
    /// Files demoted by an earlier failure become eligible again. Must be
    /// called from within a tokio runtime. Returns how many files started.
    pub fn start_upload(&mut self) -> Result<usize, UploadError> {
        if self.config.upload_url.is_none() {
            return Err(UploadError::MissingUrl("upload url"));
        }
        let admitted = self.scheduler.admit(&mut self.registry);
        let count = admitted.len();
        self.spawn_transfers(admitted);
        Ok(count)
    }

    /// Waits for the next transfer report and applies it
    ///
    /// Returns false without waiting when nothing is uploading.
    pub async fn step(&mut self) -> bool {
        if self.scheduler.is_idle() {
            return false;
        }
        match self.events_rx.recv().await {
            Some(event) => {
                self.apply(event);
                true
            }
            None => false,
        }
    }

    /// Applies transfer reports until no transfer is left running
    pub async fn run_until_idle(&mut self) {
        while self.step().await {}
    }

    fn spawn_transfers(&mut self, keys: Vec<DescriptorKey>) {
        let Some(url) = self.config.upload_url.clone() else {
            return;
        };

        for key in keys {
            let Some(file) = self.registry.get_by_key(key) else {
                continue;
            };
            let Some(source) = file.source().cloned() else {
                warn!(key = %key, "Admitted file has no source; releasing slot");
                self.scheduler.record_orphan();
                continue;
            };

            let job = TransferJob {
                key,
                source,
                name: file.name().to_string(),
                declared_size: file.declared_size(),
                extra: (self.hooks.before_upload)(&self.config.data, file),
                url: url.clone(),
                field_name: self.config.field_name.clone(),
            };
            FragmentTransfer::new(job, Arc::clone(&self.transport), self.events_tx.clone()).spawn();
        }
    }

    fn apply(&mut self, event: TransferEvent) {
        match event {
            TransferEvent::Progress { key, delta } => self.apply_progress(key, delta),
            TransferEvent::FragmentSent { key, index } => {
                if let Some(file) = self.registry.get_by_key(key) {
                    debug!(key = %key, fragment = index, "Fragment accepted");
                    (self.hooks.on_upload_success)(file, index);
                }
            }
            TransferEvent::Completed {
                key,
                server_id,
                url,
                response,
            } => self.apply_completed(key, server_id, url, response),
            TransferEvent::Failed { key, error } => self.apply_failed(key, error),
        }
    }

    fn apply_progress(&mut self, key: DescriptorKey, delta: u64) {
        let Some(file) = self.registry.get_mut_by_key(key) else {
            return;
        };
        if file.status() != FileStatus::InUpload {
            return;
        }
        if file.record_progress(delta) {
            warn!(
                key = %key,
                declared_size = file.declared_size(),
                "More bytes sent than declared; raising declared size"
            );
        }
        (self.hooks.on_progress)(&*file);
    }

    fn apply_completed(
        &mut self,
        key: DescriptorKey,
        server_id: ServerId,
        url: String,
        response: TransportResponse,
    ) {
        let completed = match self.registry.get_mut_by_key(key) {
            Some(file) => match file.complete(server_id, url) {
                Ok(()) => true,
                Err(e) => {
                    warn!(key = %key, error = %e, "Could not mark file completed");
                    false
                }
            },
            None => {
                warn!(key = %key, "Upload finished for a removed file");
                false
            }
        };

        if completed {
            self.scheduler.record_completion();
        } else {
            self.scheduler.record_orphan();
        }
        self.admit_next();

        if completed {
            if let Some(file) = self.registry.get_by_key(key) {
                (self.hooks.on_completed)(file, &response);
            }
        }
        self.finish_batch_if_idle();
    }

    fn apply_failed(&mut self, key: DescriptorKey, error: UploadError) {
        match self.registry.get_mut_by_key(key) {
            Some(file) => {
                let reason = error.to_string();
                let transition = match error {
                    UploadError::Source(_) => file.mark_failed(reason),
                    _ => file.demote(reason),
                };
                if let Err(e) = transition {
                    warn!(key = %key, error = %e, "Could not record failure");
                }
                warn!(key = %key, status = %file.status(), error = %error, "Upload failed");
                self.scheduler.record_failure(key);
            }
            None => {
                warn!(key = %key, error = %error, "Upload failed for a removed file");
                self.scheduler.record_orphan();
            }
        }
        self.admit_next();

        if let Some(file) = self.registry.get_by_key(key) {
            (self.hooks.on_error)(file, &error);
        }
        self.finish_batch_if_idle();
    }

    fn admit_next(&mut self) {
        let admitted = self.scheduler.tick(&mut self.registry);
        self.spawn_transfers(admitted);
    }

    fn finish_batch_if_idle(&mut self) {
        if self.scheduler.is_idle() {
            (self.hooks.on_completed_all)(self.registry.list());
            self.scheduler.finish_batch();
        }
    }

    // ========================================================================
    // Remote sync
    // ========================================================================

    /// Saves the metadata of the server-side file at `index`
    pub async fn save(&self, index: usize) -> Result<TransportResponse, UploadError> {
        let file = self.registry.get(index)?;
        let extra = (self.hooks.before_save)(file);
        let response = self.remote.save(index, file, &extra).await?;
        (self.hooks.on_saved)(file, &response);
        Ok(response)
    }

    /// Deletes the server-side file at `index`; the registry is left as is
    pub async fn delete(&self, index: usize) -> Result<TransportResponse, UploadError> {
        let file = self.registry.get(index)?;
        let extra = (self.hooks.before_delete)(file);
        let response = self.remote.delete(index, file, &extra).await?;
        (self.hooks.on_deleted)(file, &response);
        Ok(response)
    }
}
