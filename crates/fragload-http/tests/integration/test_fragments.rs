//! Integration tests for fragment requests
//!
//! Verifies the multipart layout of fragment requests, streamed progress
//! reporting and status handling against a wiremock upload server.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use fragload_core::domain::FragmentSpec;
use fragload_core::ports::{ExtraFields, FragmentRequest, IUploadTransport, TransportError};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common;

/// ASCII payload so request bodies stay valid UTF-8 for matchers
fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| b'a' + (i % 26) as u8).collect()
}

fn fragment_request(url: String, index: u64, size: u64, data: Vec<u8>) -> FragmentRequest {
    let mut extra = ExtraFields::new();
    extra.insert("album".to_string(), "holidays".to_string());
    FragmentRequest {
        url,
        field_name: "file".to_string(),
        file_name: "photo.jpg".to_string(),
        fragment: FragmentSpec::at(index, size),
        data,
        extra,
    }
}

fn no_progress() -> Arc<dyn Fn(u64) + Send + Sync> {
    Arc::new(|_: u64| {})
}

// ============================================================================
// Multipart layout
// ============================================================================

#[tokio::test]
async fn test_first_fragment_field_order() {
    let (server, transport) = common::setup_upload_mock(&[]).await;
    common::mount_upload(&server, serde_json::json!(1), "https://cdn/photo.jpg").await;

    let request = fragment_request(format!("{}/upload", server.uri()), 0, 600_000, payload(64));
    transport
        .send_fragment(request, no_progress())
        .await
        .expect("Fragment upload failed");

    let bodies = common::received_bodies(&server).await;
    assert_eq!(bodies.len(), 1);
    let body = &bodies[0];

    let init = common::part_offset(body, "fileInit").expect("fileInit missing");
    let last = common::part_offset(body, "fileLastFragment").expect("fileLastFragment missing");
    let num = common::part_offset(body, "fileFragmentNum").expect("fileFragmentNum missing");
    let extra = common::part_offset(body, "album").expect("extra field missing");
    let file = common::part_offset(body, "file").expect("file part missing");

    assert!(init < last && last < num && num < extra && extra < file);
    assert!(body.contains("name=\"fileLastFragment\"\r\n\r\nfalse"));
    assert!(body.contains("name=\"fileFragmentNum\"\r\n\r\n0"));
    assert!(body.contains("filename=\"photo.jpg\""));
}

#[tokio::test]
async fn test_later_fragment_omits_init() {
    let (server, transport) = common::setup_upload_mock(&[]).await;
    common::mount_upload(&server, serde_json::json!(1), "https://cdn/photo.jpg").await;

    let request = fragment_request(format!("{}/upload", server.uri()), 1, 600_000, payload(64));
    transport.send_fragment(request, no_progress()).await.unwrap();

    let bodies = common::received_bodies(&server).await;
    assert!(common::part_offset(&bodies[0], "fileInit").is_none());
    assert!(bodies[0].contains("name=\"fileFragmentNum\"\r\n\r\n1"));
}

#[tokio::test]
async fn test_last_fragment_returns_completion_body() {
    let (server, transport) = common::setup_upload_mock(&[]).await;
    common::mount_upload(&server, serde_json::json!("abc-9"), "https://cdn/photo.jpg").await;

    let request = fragment_request(format!("{}/upload", server.uri()), 2, 600_000, payload(75_856));
    let response = transport.send_fragment(request, no_progress()).await.unwrap();

    assert_eq!(response.status, 200);
    let json: serde_json::Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(json["id"], "abc-9");
    assert_eq!(json["url"], "https://cdn/photo.jpg");
}

#[tokio::test]
async fn test_empty_file_sends_single_init_and_last_fragment() {
    let (server, transport) = common::setup_upload_mock(&[]).await;
    common::mount_upload(&server, serde_json::json!(3), "https://cdn/empty.txt").await;

    let request = fragment_request(format!("{}/upload", server.uri()), 0, 0, Vec::new());
    let response = transport.send_fragment(request, no_progress()).await.unwrap();
    assert!(response.body.contains("empty.txt"));

    let bodies = common::received_bodies(&server).await;
    assert!(bodies[0].contains("name=\"fileInit\"\r\n\r\ntrue"));
    assert!(bodies[0].contains(common::LAST_FRAGMENT_MARKER));
}

// ============================================================================
// Progress and headers
// ============================================================================

#[tokio::test]
async fn test_progress_reports_every_byte() {
    let (server, transport) = common::setup_upload_mock(&[]).await;
    common::mount_upload(&server, serde_json::json!(1), "https://cdn/photo.jpg").await;

    let sent = Arc::new(AtomicU64::new(0));
    let calls = Arc::new(AtomicU64::new(0));
    let progress = {
        let sent = Arc::clone(&sent);
        let calls = Arc::clone(&calls);
        Arc::new(move |delta: u64| {
            sent.fetch_add(delta, Ordering::SeqCst);
            calls.fetch_add(1, Ordering::SeqCst);
        })
    };

    let data = payload(100_000);
    let request = fragment_request(format!("{}/upload", server.uri()), 0, 600_000, data);
    transport.send_fragment(request, progress).await.unwrap();

    assert_eq!(sent.load(Ordering::SeqCst), 100_000);
    assert!(calls.load(Ordering::SeqCst) > 1);
}

#[tokio::test]
async fn test_configured_headers_are_sent() {
    let (server, transport) = common::setup_upload_mock(&[("X-Upload-Token", "secret")]).await;

    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(header("X-Upload-Token", "secret"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let request = fragment_request(format!("{}/upload", server.uri()), 0, 600_000, payload(10));
    transport.send_fragment(request, no_progress()).await.unwrap();
}

// ============================================================================
// Error handling
// ============================================================================

#[tokio::test]
async fn test_error_status_is_reported_with_body() {
    let (server, transport) = common::setup_upload_mock(&[]).await;
    common::mount_form(&server, "/upload", 413, "too large").await;

    let request = fragment_request(format!("{}/upload", server.uri()), 0, 10, payload(10));
    let err = transport.send_fragment(request, no_progress()).await.unwrap_err();

    assert_eq!(
        err,
        TransportError::Status {
            status: 413,
            body: "too large".to_string()
        }
    );
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let (_server, transport) = common::setup_upload_mock(&[]).await;

    // Reserve a port, then release it so nothing is listening there
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/upload", listener.local_addr().unwrap());
    drop(listener);

    let request = fragment_request(url, 0, 10, payload(10));
    let err = transport.send_fragment(request, no_progress()).await.unwrap_err();
    assert!(matches!(err, TransportError::Network(_)));
}
