//! Integration tests for save and delete form requests

use fragload_core::domain::ServerId;
use fragload_core::ports::{ExtraFields, FormRequest, IUploadTransport, TransportError};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use crate::common;

fn extras(pairs: &[(&str, &str)]) -> ExtraFields {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[tokio::test]
async fn test_save_posts_file_id_and_fields() {
    let (server, transport) = common::setup_upload_mock(&[]).await;
    common::mount_form(&server, "/edit", 200, "{\"ok\":true}").await;

    let id = ServerId::new("42").unwrap();
    let request = FormRequest::save(
        &format!("{}/edit", server.uri()),
        &id,
        &extras(&[("title", "Sunset")]),
    );
    let response = transport.send_form(request).await.expect("Save failed");

    assert_eq!(response.status, 200);
    assert_eq!(response.body, "{\"ok\":true}");

    let bodies = common::received_bodies(&server).await;
    let body = &bodies[0];
    assert!(body.contains("name=\"fileId\"\r\n\r\n42"));
    assert!(body.contains("name=\"title\"\r\n\r\nSunset"));
    assert!(common::part_offset(body, "fileId") < common::part_offset(body, "title"));
}

#[tokio::test]
async fn test_delete_carries_id_in_query_and_body() {
    let (server, transport) = common::setup_upload_mock(&[]).await;

    Mock::given(method("POST"))
        .and(path("/delete"))
        .and(query_param("token", "t1"))
        .and(query_param("fileId", "7"))
        .respond_with(ResponseTemplate::new(200).set_body_string("deleted"))
        .expect(1)
        .mount(&server)
        .await;

    let id = ServerId::new("7").unwrap();
    let request = FormRequest::delete(
        &format!("{}/delete?token=t1", server.uri()),
        &id,
        &ExtraFields::new(),
    )
    .unwrap();
    let response = transport.send_form(request).await.expect("Delete failed");
    assert_eq!(response.body, "deleted");

    let bodies = common::received_bodies(&server).await;
    assert!(bodies[0].contains("name=\"fileId\"\r\n\r\n7"));
}

#[tokio::test]
async fn test_form_error_status() {
    let (server, transport) = common::setup_upload_mock(&[]).await;
    common::mount_form(&server, "/edit", 404, "no such file").await;

    let id = ServerId::new("1").unwrap();
    let request = FormRequest::save(&format!("{}/edit", server.uri()), &id, &ExtraFields::new());
    let err = transport.send_form(request).await.unwrap_err();

    assert!(matches!(err, TransportError::Status { status: 404, .. }));
}
