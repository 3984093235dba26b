//! FileRegistry - ordered collection of tracked files
//!
//! The registry exclusively owns every descriptor of a session. Positions
//! always form the contiguous sequence `0..n-1` in insertion order, and are
//! re-issued after a removal. Keys never change.

use std::sync::Arc;

use crate::domain::descriptor::{FileDescriptor, RemoteRecord};
use crate::domain::errors::DomainError;
use crate::domain::newtypes::DescriptorKey;
use crate::ports::byte_source::IByteSource;

/// Ordered collection of file descriptors
#[derive(Debug, Default)]
pub struct FileRegistry {
    files: Vec<FileDescriptor>,
    next_key: u64,
}

impl FileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one `ReadyLocal` descriptor per source
    ///
    /// Returns the keys of the new descriptors in insertion order.
    pub fn add_local<I>(&mut self, sources: I) -> Vec<DescriptorKey>
    where
        I: IntoIterator<Item = Arc<dyn IByteSource>>,
    {
        sources
            .into_iter()
            .map(|source| {
                let key = self.allocate_key();
                let position = self.files.len();
                self.files
                    .push(FileDescriptor::local(key, position, source));
                key
            })
            .collect()
    }

    /// Appends one `ReadyRemoteOnly` descriptor per server record
    pub fn add_remote<I>(&mut self, records: I) -> Vec<DescriptorKey>
    where
        I: IntoIterator<Item = RemoteRecord>,
    {
        records
            .into_iter()
            .map(|record| {
                let key = self.allocate_key();
                let position = self.files.len();
                self.files
                    .push(FileDescriptor::remote(key, position, record));
                key
            })
            .collect()
    }

    /// Read-only view of all descriptors in order
    pub fn list(&self) -> &[FileDescriptor] {
        &self.files
    }

    /// Removes the descriptor at `index` and renumbers the rest
    pub fn remove(&mut self, index: usize) -> Result<FileDescriptor, DomainError> {
        if index >= self.files.len() {
            return Err(DomainError::IndexOutOfRange {
                index,
                len: self.files.len(),
            });
        }
        let removed = self.files.remove(index);
        for (position, file) in self.files.iter_mut().enumerate().skip(index) {
            file.set_position_index(position);
        }
        Ok(removed)
    }

    pub fn get(&self, index: usize) -> Result<&FileDescriptor, DomainError> {
        self.files.get(index).ok_or(DomainError::IndexOutOfRange {
            index,
            len: self.files.len(),
        })
    }

    pub fn get_by_key(&self, key: DescriptorKey) -> Option<&FileDescriptor> {
        self.files.iter().find(|f| f.key() == key)
    }

    pub fn get_mut_by_key(&mut self, key: DescriptorKey) -> Option<&mut FileDescriptor> {
        self.files.iter_mut().find(|f| f.key() == key)
    }

    /// Mutable iteration in position order, used by admission scans
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, FileDescriptor> {
        self.files.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn allocate_key(&mut self) -> DescriptorKey {
        let key = DescriptorKey::new(self.next_key);
        self.next_key += 1;
        key
    }
}
