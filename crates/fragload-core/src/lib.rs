//! fragload Core - Domain logic for fragmented uploads
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `FileDescriptor`, `FileStatus`, `RemoteRecord`
//! - **Fragment plan** - fixed-size fragment arithmetic shared by every transfer
//! - **Registry** - `FileRegistry`, the ordered source of truth for tracked files
//! - **Port definitions** - Traits for adapters: `IUploadTransport`, `IByteSource`
//!
//! # Architecture
//!
//! The domain module contains pure business logic with no I/O.
//! Ports define trait interfaces that adapter crates implement
//! (`fragload-http` for the transport, `fragload-engine` for file sources).

pub mod config;
pub mod domain;
pub mod ports;
pub mod registry;
