//! Domain entities and business logic
//!
//! This module contains the core domain types for fragload:
//! - Newtypes for identifiers (descriptor keys, server ids, uploader ids)
//! - File descriptors and their status machine
//! - Fragment planning
//! - Domain-specific error types

pub mod descriptor;
pub mod errors;
pub mod fragment;
pub mod newtypes;

// Re-export commonly used types
pub use descriptor::{FileDescriptor, FileStatus, RemoteRecord};
pub use errors::DomainError;
pub use fragment::{fragment_count, FragmentSpec, FRAGMENT_SIZE};
pub use newtypes::*;
