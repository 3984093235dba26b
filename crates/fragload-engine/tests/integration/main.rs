//! End-to-end tests for fragload-engine
//!
//! Drives an Uploader session over the real HttpTransport against a
//! wiremock upload server, with file-backed sources.

mod common;

mod test_upload_session;
