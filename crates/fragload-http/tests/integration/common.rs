//! Shared test helpers for upload server integration tests
//!
//! Provides wiremock-based mock server setup for the upload, edit and
//! delete endpoints. Each helper mounts the necessary mock endpoints; the
//! setup function returns an HttpTransport ready to talk to the server.

use std::collections::BTreeMap;

use fragload_http::client::HttpTransport;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Multipart marker present only in the last fragment of a file
pub const LAST_FRAGMENT_MARKER: &str = "name=\"fileLastFragment\"\r\n\r\ntrue";

/// Starts a mock server and returns it with a transport sending `headers`.
pub async fn setup_upload_mock(headers: &[(&str, &str)]) -> (MockServer, HttpTransport) {
    let server = MockServer::start().await;

    let headers: BTreeMap<String, String> = headers
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let transport = HttpTransport::new(&headers, false).expect("build transport");

    (server, transport)
}

/// Mounts `POST /upload`.
///
/// Intermediate fragments get an empty 200; the last fragment gets the
/// completion JSON `{url, id}`.
pub async fn mount_upload(server: &MockServer, id: serde_json::Value, url: &str) {
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(body_string_contains(LAST_FRAGMENT_MARKER))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "url": url,
            "id": id
        })))
        .with_priority(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200))
        .with_priority(2)
        .mount(server)
        .await;
}

/// Mounts a POST endpoint at `endpoint` answering `status` with `body`.
pub async fn mount_form(server: &MockServer, endpoint: &str, status: u16, body: &str) {
    Mock::given(method("POST"))
        .and(path(endpoint))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

/// Bodies of every request the server received, in arrival order.
pub async fn received_bodies(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|r| String::from_utf8_lossy(&r.body).into_owned())
        .collect()
}

/// Byte offset of the multipart part named `name` within `body`.
pub fn part_offset(body: &str, name: &str) -> Option<usize> {
    body.find(&format!("name=\"{name}\""))
}
