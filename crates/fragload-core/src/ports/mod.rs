//! Port definitions (hexagonal architecture interfaces)
//!
//! Ports are interfaces that the domain core depends on, but whose
//! implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IByteSource`] - Byte-range-addressable file contents
//! - [`IUploadTransport`] - Fragment and form requests to the server

pub mod byte_source;
pub mod transport;

pub use byte_source::{IByteSource, MemorySource};
pub use transport::{
    ExtraFields, FormRequest, FragmentRequest, IUploadTransport, ProgressFn, TransportError,
    TransportResponse,
};
