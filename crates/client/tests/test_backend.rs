//! Tests for backend HTTP decoding and failure classification

use serde_json::json;
use std::sync::Arc;
use strato_client::{classify, BackendError, ClientHandle, Credentials, Service};
use strato_config::{AuthMethod, InstanceConfig, PerformanceConfig};
use strato_core::ErrorKind;

fn handle_for(server_url: &str) -> ClientHandle {
    let instance = InstanceConfig {
        region: "test".to_string(),
        compartment_id: "cmp.test".to_string(),
        namespace: "acme".to_string(),
        endpoint: Some(server_url.to_string()),
        default_bucket: None,
        display_name: None,
    };
    let credentials = Arc::new(Credentials {
        tenancy: "ten.test".to_string(),
        user: None,
        fingerprint: None,
        region: "test".to_string(),
        method: AuthMethod::AmbientIdentity,
    });
    ClientHandle::connect(
        Service::ObjectStorage,
        &instance,
        &PerformanceConfig::default(),
        credentials,
    )
    .expect("client handle")
}

#[tokio::test]
async fn test_success_body_decoded_as_json() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/object-storage/n/acme/b")
        .match_header("x-strato-tenancy", "ten.test")
        .with_status(200)
        .with_body(r#"{"items": [{"name": "data-lake"}]}"#)
        .create_async()
        .await;

    let handle = handle_for(&server.url());
    let value = handle.get_json("/n/acme/b", &[]).await.expect("response");

    mock.assert_async().await;
    assert_eq!(value["items"][0]["name"], "data-lake");
}

#[tokio::test]
async fn test_empty_success_body_is_null() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("DELETE", "/object-storage/n/acme/b/old")
        .with_status(204)
        .create_async()
        .await;

    let handle = handle_for(&server.url());
    let value = handle.delete("/n/acme/b/old").await.expect("response");
    assert!(value.is_null());
}

#[tokio::test]
async fn test_error_body_carries_status_code_and_message() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/object-storage/n/acme/b/missing")
        .with_status(404)
        .with_body(r#"{"code": "BucketNotFound", "message": "bucket 'missing' does not exist"}"#)
        .create_async()
        .await;

    let handle = handle_for(&server.url());
    let err = handle.get_json("/n/acme/b/missing", &[]).await.unwrap_err();

    match &err {
        BackendError::Service {
            status,
            code,
            message,
        } => {
            assert_eq!(*status, 404);
            assert_eq!(code, "BucketNotFound");
            assert!(message.contains("does not exist"));
        }
        other => panic!("expected service error, got {:?}", other),
    }

    let classified = classify("get_bucket_details", err);
    assert_eq!(classified.kind, ErrorKind::ResourceNotFound);
    assert_eq!(classified.details["code"], "BucketNotFound");
}

#[tokio::test]
async fn test_put_bytes_sends_raw_body_with_content_type() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("PUT", "/object-storage/n/acme/b/ingest/o/data.bin")
        .match_header("x-strato-tenancy", "ten.test")
        .match_header("content-type", "application/octet-stream")
        .match_body("raw-body-payload")
        .with_status(200)
        .with_body(r#"{"etag": "e-1"}"#)
        .create_async()
        .await;

    let handle = handle_for(&server.url());
    let value = handle
        .put_bytes(
            "/n/acme/b/ingest/o/data.bin",
            b"raw-body-payload".to_vec(),
            Some("application/octet-stream"),
        )
        .await
        .expect("response");

    mock.assert_async().await;
    assert_eq!(value["etag"], "e-1");
}

#[tokio::test]
async fn test_get_bytes_returns_raw_body_and_decodes_errors() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/object-storage/n/acme/b/ingest/o/report.csv")
        .with_status(200)
        .with_body("a,b\n1,2\n")
        .create_async()
        .await;
    server
        .mock("GET", "/object-storage/n/acme/b/ingest/o/missing.csv")
        .with_status(404)
        .with_body(r#"{"code": "ObjectNotFound", "message": "no such object"}"#)
        .create_async()
        .await;

    let handle = handle_for(&server.url());
    let bytes = handle
        .get_bytes("/n/acme/b/ingest/o/report.csv")
        .await
        .expect("bytes");
    assert_eq!(bytes, b"a,b\n1,2\n".to_vec());

    let err = handle
        .get_bytes("/n/acme/b/ingest/o/missing.csv")
        .await
        .unwrap_err();
    match err {
        BackendError::Service { status, code, .. } => {
            assert_eq!(status, 404);
            assert_eq!(code, "ObjectNotFound");
        }
        other => panic!("expected service error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_server_fault_classified_as_api() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/object-storage/n/acme/b")
        .with_status(502)
        .with_body("bad gateway")
        .create_async()
        .await;

    let handle = handle_for(&server.url());
    let err = handle
        .post_json("/n/acme/b", &json!({"name": "new-bucket"}))
        .await
        .unwrap_err();

    let classified = classify("create_bucket", err);
    assert_eq!(classified.kind, ErrorKind::Api);
    assert_eq!(classified.details["status"], 502);
}

#[tokio::test]
async fn test_unauthorized_classified_as_authentication() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/object-storage/tenancy")
        .with_status(401)
        .with_body(r#"{"code": "NotAuthenticated", "message": "signature invalid"}"#)
        .create_async()
        .await;

    let handle = handle_for(&server.url());
    let err = handle.get_json("/tenancy", &[]).await.unwrap_err();

    let classified = classify("test_identity", err);
    assert_eq!(classified.kind, ErrorKind::Authentication);
    assert!(classified.source.is_some());
}
