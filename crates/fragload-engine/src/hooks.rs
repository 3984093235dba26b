//! Caller hooks for upload lifecycle events
//!
//! Every hook is optional. Unset hooks fall back to no-ops (or, for the
//! field-producing hooks, to passing the configured fields through), so a
//! session can be driven without registering anything.
//!
//! ```rust
//! use fragload_engine::hooks::UploadHooks;
//!
//! let hooks = UploadHooks::new()
//!     .on_completed(|file, _response| println!("{} uploaded", file.name()))
//!     .on_error(|file, err| eprintln!("{}: {err}", file.name()));
//! ```

use std::fmt;

use fragload_core::domain::FileDescriptor;
use fragload_core::ports::{ExtraFields, TransportResponse};

use crate::UploadError;

/// Produces the extra fields of a file's fragments from the static fields
pub type BeforeUploadFn = Box<dyn Fn(&ExtraFields, &FileDescriptor) -> ExtraFields + Send + Sync>;
/// Produces the extra fields of a save or delete form
pub type FormFieldsFn = Box<dyn Fn(&FileDescriptor) -> ExtraFields + Send + Sync>;
pub type FileFn = Box<dyn Fn(&FileDescriptor) + Send + Sync>;
pub type FragmentFn = Box<dyn Fn(&FileDescriptor, u64) + Send + Sync>;
pub type ErrorFn = Box<dyn Fn(&FileDescriptor, &UploadError) + Send + Sync>;
pub type ResponseFn = Box<dyn Fn(&FileDescriptor, &TransportResponse) + Send + Sync>;
pub type BatchFn = Box<dyn Fn(&[FileDescriptor]) + Send + Sync>;

/// Set of callbacks invoked by an [`Uploader`](crate::uploader::Uploader)
pub struct UploadHooks {
    pub(crate) before_upload: BeforeUploadFn,
    pub(crate) before_save: FormFieldsFn,
    pub(crate) before_delete: FormFieldsFn,
    pub(crate) on_progress: FileFn,
    pub(crate) on_upload_success: FragmentFn,
    pub(crate) on_error: ErrorFn,
    pub(crate) on_completed: ResponseFn,
    pub(crate) on_completed_all: BatchFn,
    pub(crate) on_saved: ResponseFn,
    pub(crate) on_deleted: ResponseFn,
}

impl UploadHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs once per file at admission; the result replaces its extra fields
    pub fn before_upload(
        mut self,
        f: impl Fn(&ExtraFields, &FileDescriptor) -> ExtraFields + Send + Sync + 'static,
    ) -> Self {
        self.before_upload = Box::new(f);
        self
    }

    pub fn before_save(
        mut self,
        f: impl Fn(&FileDescriptor) -> ExtraFields + Send + Sync + 'static,
    ) -> Self {
        self.before_save = Box::new(f);
        self
    }

    pub fn before_delete(
        mut self,
        f: impl Fn(&FileDescriptor) -> ExtraFields + Send + Sync + 'static,
    ) -> Self {
        self.before_delete = Box::new(f);
        self
    }

    /// Fires after every progress update, including size corrections
    pub fn on_progress(mut self, f: impl Fn(&FileDescriptor) + Send + Sync + 'static) -> Self {
        self.on_progress = Box::new(f);
        self
    }

    /// Fires once per accepted fragment with its index
    pub fn on_upload_success(
        mut self,
        f: impl Fn(&FileDescriptor, u64) + Send + Sync + 'static,
    ) -> Self {
        self.on_upload_success = Box::new(f);
        self
    }

    pub fn on_error(
        mut self,
        f: impl Fn(&FileDescriptor, &UploadError) + Send + Sync + 'static,
    ) -> Self {
        self.on_error = Box::new(f);
        self
    }

    /// Fires when a file's last fragment is accepted, with the raw response
    pub fn on_completed(
        mut self,
        f: impl Fn(&FileDescriptor, &TransportResponse) + Send + Sync + 'static,
    ) -> Self {
        self.on_completed = Box::new(f);
        self
    }

    /// Fires when no transfer is left running, with the full file list
    pub fn on_completed_all(
        mut self,
        f: impl Fn(&[FileDescriptor]) + Send + Sync + 'static,
    ) -> Self {
        self.on_completed_all = Box::new(f);
        self
    }

    pub fn on_saved(
        mut self,
        f: impl Fn(&FileDescriptor, &TransportResponse) + Send + Sync + 'static,
    ) -> Self {
        self.on_saved = Box::new(f);
        self
    }

    pub fn on_deleted(
        mut self,
        f: impl Fn(&FileDescriptor, &TransportResponse) + Send + Sync + 'static,
    ) -> Self {
        self.on_deleted = Box::new(f);
        self
    }
}

impl Default for UploadHooks {
    fn default() -> Self {
        Self {
            before_upload: Box::new(|fields, _| fields.clone()),
            before_save: Box::new(|_| ExtraFields::new()),
            before_delete: Box::new(|_| ExtraFields::new()),
            on_progress: Box::new(|_| {}),
            on_upload_success: Box::new(|_, _| {}),
            on_error: Box::new(|_, _| {}),
            on_completed: Box::new(|_, _| {}),
            on_completed_all: Box::new(|_| {}),
            on_saved: Box::new(|_, _| {}),
            on_deleted: Box::new(|_, _| {}),
        }
    }
}

impl fmt::Debug for UploadHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadHooks").finish_non_exhaustive()
    }
}
