//! Domain error types
//!
//! This module defines error types specific to domain operations,
//! including registry indexing failures and invalid state transitions.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A registry position does not exist
    #[error("Index {index} out of range for registry of {len} files")]
    IndexOutOfRange {
        /// The requested position
        index: usize,
        /// Number of descriptors in the registry
        len: usize,
    },

    /// Invalid state transition attempt
    #[error("Invalid state transition from {from} to {to}")]
    InvalidState {
        /// The current state
        from: String,
        /// The attempted target state
        to: String,
    },

    /// Server identifier was empty or not a string/number
    #[error("Invalid server id: {0}")]
    InvalidServerId(String),
}
