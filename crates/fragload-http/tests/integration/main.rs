//! Integration tests for fragload-http
//!
//! Uses wiremock to simulate the upload server and verifies the multipart
//! layout of fragment and form requests, status handling, and streamed
//! progress reporting of the HttpTransport.

mod common;

mod test_fragments;
mod test_remote_forms;
