//! Shared helpers for end-to-end upload tests

use std::path::Path;
use std::sync::Arc;

use fragload_core::config::{ConfigBuilder, UploaderConfig};
use fragload_core::ports::{IByteSource, IUploadTransport};
use fragload_engine::file_source::FileSource;
use fragload_http::client::HttpTransport;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Multipart marker present only in the last fragment of a file
pub const LAST_FRAGMENT_MARKER: &str = "name=\"fileLastFragment\"\r\n\r\ntrue";

/// Starts a mock server and returns it with a session config pointing at it.
pub async fn setup_server(concurrency: i64) -> (MockServer, UploaderConfig) {
    let server = MockServer::start().await;
    let config = ConfigBuilder::new()
        .upload_url(format!("{}/upload", server.uri()))
        .edit_url(format!("{}/edit", server.uri()))
        .delete_url(format!("{}/delete", server.uri()))
        .concurrency(concurrency)
        .data("album", "e2e")
        .build();
    (server, config.uploader)
}

pub fn transport(config: &UploaderConfig) -> Arc<dyn IUploadTransport> {
    Arc::new(HttpTransport::from_config(config).expect("build transport"))
}

/// Mounts a last-fragment response for the file named `file_name`.
pub async fn mount_completion(server: &MockServer, file_name: &str, body: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(body_string_contains(LAST_FRAGMENT_MARKER))
        .and(body_string_contains(format!("filename=\"{file_name}\"")))
        .respond_with(body)
        .with_priority(1)
        .mount(server)
        .await;
}

/// Accepts every intermediate fragment.
pub async fn mount_fragments(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200))
        .with_priority(5)
        .mount(server)
        .await;
}

/// Writes `len` ASCII bytes to `dir/name` and opens it as a byte source.
pub async fn ascii_file(dir: &Path, name: &str, len: usize) -> Arc<dyn IByteSource> {
    let path = dir.join(name);
    let content: Vec<u8> = (0..len).map(|i| b'a' + (i % 26) as u8).collect();
    std::fs::write(&path, content).expect("write fixture");
    Arc::new(FileSource::open(&path).await.expect("open fixture"))
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
