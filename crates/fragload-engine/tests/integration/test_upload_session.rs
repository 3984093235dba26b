//! Upload sessions against a wiremock server

use std::sync::{Arc, Mutex};

use fragload_core::domain::{FileStatus, RemoteRecord, ServerId};
use fragload_engine::hooks::UploadHooks;
use fragload_engine::uploader::Uploader;
use fragload_engine::ErrorKind;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use crate::common;

#[tokio::test]
async fn test_multi_fragment_file_uploads_in_order() {
    let (server, config) = common::setup_server(1).await;
    common::mount_completion(
        &server,
        "report.txt",
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "url": "https://cdn.example.com/report.txt",
            "id": 501
        })),
    )
    .await;
    common::mount_fragments(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let source = common::ascii_file(dir.path(), "report.txt", 600_000).await;

    let transport = common::transport(&config);
    let mut uploader = Uploader::new(config, transport);
    uploader.add_local([source]);
    uploader.start_upload().unwrap();
    uploader.run_until_idle().await;

    let file = &uploader.files()[0];
    assert_eq!(file.status(), FileStatus::Completed);
    assert_eq!(file.server_id().unwrap().as_str(), "501");
    assert_eq!(file.remote_url(), Some("https://cdn.example.com/report.txt"));
    assert_eq!(file.loaded_bytes(), 600_000);

    let bodies = common::received_bodies(&server).await;
    assert_eq!(bodies.len(), 3);
    for (index, body) in bodies.iter().enumerate() {
        assert!(body.contains(&format!("name=\"fileFragmentNum\"\r\n\r\n{index}")));
        assert!(body.contains("name=\"album\"\r\n\r\ne2e"));
    }
    assert!(bodies[0].contains("name=\"fileInit\""));
    assert!(!bodies[1].contains("name=\"fileInit\""));
    assert!(bodies[2].contains(common::LAST_FRAGMENT_MARKER));
}

#[tokio::test]
async fn test_malformed_completion_frees_slot_for_next_file() {
    let (server, config) = common::setup_server(1).await;
    common::mount_completion(
        &server,
        "first.txt",
        ResponseTemplate::new(200).set_body_string("OK"),
    )
    .await;
    common::mount_completion(
        &server,
        "second.txt",
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "url": "https://cdn.example.com/second.txt",
            "id": "s-2"
        })),
    )
    .await;
    common::mount_fragments(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let first = common::ascii_file(dir.path(), "first.txt", 100).await;
    let second = common::ascii_file(dir.path(), "second.txt", 100).await;

    let errors = Arc::new(Mutex::new(Vec::new()));
    let batches = Arc::new(Mutex::new(0usize));
    let hooks = UploadHooks::new()
        .on_error({
            let errors = Arc::clone(&errors);
            move |file, err| errors.lock().unwrap().push((file.name().to_string(), err.kind()))
        })
        .on_completed_all({
            let batches = Arc::clone(&batches);
            move |_| *batches.lock().unwrap() += 1
        });

    let transport = common::transport(&config);
    let mut uploader = Uploader::new(config, transport).with_hooks(hooks);
    uploader.add_local([first, second]);
    uploader.start_upload().unwrap();
    uploader.run_until_idle().await;

    assert_eq!(uploader.files()[0].status(), FileStatus::ReadyLocal);
    assert_eq!(uploader.files()[1].status(), FileStatus::Completed);
    assert_eq!(
        *errors.lock().unwrap(),
        vec![("first.txt".to_string(), ErrorKind::MalformedResponse)]
    );
    assert_eq!(*batches.lock().unwrap(), 1);
}

#[tokio::test]
async fn test_server_error_demotes_file() {
    let (server, config) = common::setup_server(2).await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(500).set_body_string("disk full"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let source = common::ascii_file(dir.path(), "a.txt", 10).await;

    let transport = common::transport(&config);
    let mut uploader = Uploader::new(config, transport);
    uploader.add_local([source]);
    uploader.start_upload().unwrap();
    uploader.run_until_idle().await;

    let file = &uploader.files()[0];
    assert_eq!(file.status(), FileStatus::ReadyLocal);
    assert!(file.last_error().unwrap().contains("500"));
    assert_eq!(common::received_bodies(&server).await.len(), 1);
}

#[tokio::test]
async fn test_delete_remote_file() {
    let (server, config) = common::setup_server(1).await;
    Mock::given(method("POST"))
        .and(path("/delete"))
        .and(query_param("fileId", "77"))
        .respond_with(ResponseTemplate::new(200).set_body_string("gone"))
        .expect(1)
        .mount(&server)
        .await;

    let deleted = Arc::new(Mutex::new(Vec::new()));
    let hooks = UploadHooks::new().on_deleted({
        let deleted = Arc::clone(&deleted);
        move |file, response| {
            deleted
                .lock()
                .unwrap()
                .push((file.title().to_string(), response.body.clone()))
        }
    });

    let transport = common::transport(&config);
    let mut uploader = Uploader::new(config, transport).with_hooks(hooks);
    uploader.add_remote(vec![RemoteRecord {
        id: ServerId::new("77").unwrap(),
        title: "old.png".into(),
        url: "https://cdn.example.com/old.png".into(),
        size: 2048,
    }]);

    uploader.delete(0).await.unwrap();

    assert_eq!(
        *deleted.lock().unwrap(),
        vec![("old.png".to_string(), "gone".to_string())]
    );
    assert_eq!(uploader.files().len(), 1);
}
