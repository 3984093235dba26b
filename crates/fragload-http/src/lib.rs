//! fragload HTTP - reqwest adapter for the upload transport port
//!
//! Provides [`HttpTransport`](client::HttpTransport), the production
//! implementation of `IUploadTransport`:
//! - Multipart fragment requests whose byte part is streamed, so progress
//!   is reported while the body is being written
//! - Multipart form requests for saving and deleting files already on the
//!   server
//!
//! ## Modules
//!
//! - [`client`] - HTTP client construction and request execution

pub mod client;

use fragload_core::ports::TransportError;
use thiserror::Error;

/// Errors raised while building or using the HTTP client
#[derive(Debug, Error)]
pub enum HttpError {
    /// A configured header name or value is not valid HTTP
    #[error("Invalid header '{name}': {reason}")]
    InvalidHeader {
        /// Header name as configured
        name: String,
        /// Why it was rejected
        reason: String,
    },

    /// The server answered with a non-success status
    #[error("Server returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, possibly empty
        body: String,
    },

    /// A network-level error occurred
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

impl From<HttpError> for TransportError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Status { status, body } => TransportError::Status { status, body },
            HttpError::NetworkError(e) if e.is_builder() => TransportError::InvalidUrl(
                e.url()
                    .map(|u| u.to_string())
                    .unwrap_or_else(|| e.to_string()),
            ),
            other => TransportError::Network(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_maps_to_transport_status() {
        let err: TransportError = HttpError::Status {
            status: 503,
            body: "busy".into(),
        }
        .into();
        assert_eq!(
            err,
            TransportError::Status {
                status: 503,
                body: "busy".into()
            }
        );
    }

    #[test]
    fn invalid_header_maps_to_network() {
        let err: TransportError = HttpError::InvalidHeader {
            name: "X Bad".into(),
            reason: "invalid HTTP header name".into(),
        }
        .into();
        assert!(matches!(err, TransportError::Network(msg) if msg.contains("X Bad")));
    }
}
