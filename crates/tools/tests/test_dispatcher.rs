//! End-to-end dispatcher tests over a mock backend

use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use strato_config::{AuthConfig, AuthMethod, FeatureFlags, InstanceConfig, LoggingConfig, Settings};
use strato_core::JsonMap;
use strato_tools::{register_enabled, Dispatcher, ToolContext, ToolDescriptor, ToolRegistry};

fn settings(endpoint: Option<&str>, log_level: &str) -> Arc<Settings> {
    let mut instances = HashMap::new();
    instances.insert(
        "dev".to_string(),
        InstanceConfig {
            region: "ap-melbourne-1".to_string(),
            compartment_id: "cmp.aaaa1111".to_string(),
            namespace: "acme".to_string(),
            endpoint: endpoint.map(str::to_string),
            default_bucket: None,
            display_name: Some("Dev".to_string()),
        },
    );
    Arc::new(Settings {
        instances,
        active_instance: "dev".to_string(),
        auth: AuthConfig {
            method: AuthMethod::AmbientIdentity,
            credentials_path: String::new(),
            profile: "DEFAULT".to_string(),
        },
        defaults: Default::default(),
        performance: Default::default(),
        logging: LoggingConfig {
            level: log_level.to_string(),
        },
        features: FeatureFlags::default(),
    })
}

fn dispatcher(endpoint: Option<&str>, log_level: &str) -> Dispatcher {
    let settings = settings(endpoint, log_level);
    let mut registry = ToolRegistry::new();
    register_enabled(&mut registry, &settings.features).expect("registry assembly");
    let ctx = Arc::new(ToolContext::new(settings).expect("context"));
    Dispatcher::new(registry, ctx)
}

fn args(value: Value) -> JsonMap {
    value.as_object().cloned().unwrap_or_default()
}

#[tokio::test]
async fn test_unknown_tool_is_validation_without_invoking_handlers() {
    let settings = settings(None, "info");
    let invocations = Arc::new(AtomicUsize::new(0));

    let mut registry = ToolRegistry::new();
    let counter = invocations.clone();
    registry
        .register(
            ToolDescriptor::new("ping", "test tool", json!({"type": "object", "properties": {}})),
            move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Ok(json!({"pong": true})) }
            },
        )
        .expect("register");

    let ctx = Arc::new(ToolContext::new(settings).expect("context"));
    let dispatcher = Dispatcher::new(registry, ctx);

    let envelope = dispatcher.dispatch("does_not_exist", None).await;
    let value = envelope.to_value();

    assert_eq!(value["success"], false);
    assert_eq!(value["error"]["type"], "Validation");
    assert_eq!(value["error"]["message"], "Unknown tool: does_not_exist");
    assert_eq!(invocations.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_missing_required_fields_are_all_reported() {
    let dispatcher = dispatcher(None, "info");

    let envelope = dispatcher.dispatch("copy_object", Some(args(json!({})))).await;
    let value = envelope.to_value();

    assert_eq!(value["success"], false);
    assert_eq!(value["error"]["type"], "Validation");
    assert_eq!(
        value["error"]["details"]["missing_fields"],
        json!(["source_bucket", "source_object", "dest_bucket", "dest_object"])
    );
}

#[tokio::test]
async fn test_invalid_bucket_name_rejected_before_any_backend_call() {
    // No backend configured; a backend call would fail differently.
    let dispatcher = dispatcher(None, "info");

    let envelope = dispatcher
        .dispatch("create_bucket", Some(args(json!({"bucket_name": ".bad."}))))
        .await;
    let value = envelope.to_value();

    assert_eq!(value["error"]["type"], "Validation");
    assert!(value["error"]["message"]
        .as_str()
        .unwrap()
        .contains("cannot start or end with a period"));
}

#[tokio::test]
async fn test_successful_call_produces_success_envelope() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/object-storage/n/acme/b")
        .match_query(mockito::Matcher::AllOf(vec![
            mockito::Matcher::UrlEncoded("compartmentId".into(), "cmp.aaaa1111".into()),
            mockito::Matcher::UrlEncoded("limit".into(), "100".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"items": [{"name": "data-lake", "namespace": "acme"}]}"#)
        .create_async()
        .await;

    let dispatcher = dispatcher(Some(&server.url()), "info");
    let envelope = dispatcher.dispatch("list_buckets", None).await;
    let value = envelope.to_value();

    assert_eq!(value["success"], true);
    assert_eq!(value["data"]["count"], 1);
    assert_eq!(value["data"]["items"][0]["name"], "data-lake");
    assert!(value["metadata"]["request_id"]
        .as_str()
        .unwrap()
        .starts_with("req_"));
    assert!(value["metadata"]["execution_time_ms"].as_f64().unwrap() >= 0.0);
    assert!(value.get("error").is_none());
}

#[tokio::test]
async fn test_backend_not_found_maps_to_resource_not_found() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/object-storage/n/acme/b/missing")
        .with_status(404)
        .with_body(r#"{"code": "BucketNotFound", "message": "no such bucket"}"#)
        .create_async()
        .await;

    let dispatcher = dispatcher(Some(&server.url()), "info");
    let envelope = dispatcher
        .dispatch(
            "get_bucket_details",
            Some(args(json!({"bucket_name": "missing"}))),
        )
        .await;
    let value = envelope.to_value();

    assert_eq!(value["success"], false);
    assert_eq!(value["error"]["type"], "ResourceNotFound");
    assert_eq!(value["error"]["details"]["operation"], "get_bucket_details");
    // Quiet mode never echoes the raw backend error.
    assert!(value["error"].get("original_error").is_none());
}

#[tokio::test]
async fn test_verbose_mode_echoes_original_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/object-storage/n/acme/b/missing")
        .with_status(404)
        .with_body(r#"{"code": "BucketNotFound", "message": "no such bucket"}"#)
        .create_async()
        .await;

    let dispatcher = dispatcher(Some(&server.url()), "debug");
    let envelope = dispatcher
        .dispatch(
            "get_bucket_details",
            Some(args(json!({"bucket_name": "missing"}))),
        )
        .await;
    let value = envelope.to_value();

    assert_eq!(value["success"], false);
    assert!(value["error"]["original_error"]
        .as_str()
        .unwrap()
        .contains("no such bucket"));
}

#[tokio::test]
async fn test_move_object_partial_failure_names_delete_step() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/object-storage/n/acme/b/src/actions/copyObject")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;
    server
        .mock("DELETE", "/object-storage/n/acme/b/src/o/report.csv")
        .with_status(404)
        .with_body(r#"{"code": "ObjectNotFound", "message": "gone"}"#)
        .create_async()
        .await;

    let dispatcher = dispatcher(Some(&server.url()), "info");
    let envelope = dispatcher
        .dispatch(
            "move_object",
            Some(args(json!({
                "source_bucket": "src",
                "source_object": "report.csv",
                "dest_bucket": "dst",
                "dest_object": "report.csv"
            }))),
        )
        .await;
    let value = envelope.to_value();

    assert_eq!(value["success"], false);
    assert_eq!(value["error"]["details"]["step"], "delete_source");
    assert_eq!(value["error"]["details"]["copy_completed"], true);
}

#[tokio::test]
async fn test_scale_cluster_rejects_non_positive_worker_count() {
    let dispatcher = dispatcher(None, "info");

    let envelope = dispatcher
        .dispatch(
            "scale_cluster",
            Some(args(json!({"cluster_id": "cl-1", "worker_count": 0}))),
        )
        .await;
    let value = envelope.to_value();

    assert_eq!(value["error"]["type"], "Validation");
    assert!(value["error"]["message"]
        .as_str()
        .unwrap()
        .contains("worker_count"));
}

#[tokio::test]
async fn test_placeholder_tools_flow_through_the_dispatcher() {
    let dispatcher = dispatcher(None, "info");

    let envelope = dispatcher
        .dispatch(
            "create_notebook_session",
            Some(args(json!({"session_name": "analysis-01"}))),
        )
        .await;
    let value = envelope.to_value();

    assert_eq!(value["success"], true);
    assert_eq!(value["data"]["status"], "CREATING");
    assert_eq!(value["data"]["shape"], "compute.standard.1");

    let envelope = dispatcher
        .dispatch("cancel_job_run", Some(args(json!({"run_id": "run-9"}))))
        .await;
    assert_eq!(envelope.to_value()["data"]["status"], "CANCELING");
}

#[tokio::test]
async fn test_handler_panic_becomes_unexpected_envelope() {
    let settings = settings(None, "info");
    let mut registry = ToolRegistry::new();
    registry
        .register(
            ToolDescriptor::new("boom", "test tool", json!({"type": "object", "properties": {}})),
            |_, _| async {
                if true {
                    panic!("handler blew up");
                }
                Ok(json!({}))
            },
        )
        .expect("register");
    let ctx = Arc::new(ToolContext::new(settings).expect("context"));
    let dispatcher = Dispatcher::new(registry, ctx);

    let envelope = dispatcher.dispatch("boom", None).await;
    let value = envelope.to_value();

    assert_eq!(value["success"], false);
    assert_eq!(value["error"]["type"], "Unexpected");
    assert_eq!(value["error"]["details"]["panic"], "handler blew up");

    // The dispatcher keeps serving after the panic.
    let envelope = dispatcher.dispatch("does_not_exist", None).await;
    assert_eq!(envelope.to_value()["error"]["type"], "Validation");
}

#[tokio::test]
async fn test_upload_object_sends_file_bytes() {
    let dir = tempfile::tempdir().expect("tempdir");
    let file_path = dir.path().join("data.csv");
    std::fs::write(&file_path, b"a,b\n1,2\n").expect("write fixture");

    let mut server = mockito::Server::new_async().await;
    server
        .mock("PUT", "/object-storage/n/acme/b/ingest/o/data.csv")
        .match_body("a,b\n1,2\n")
        .with_status(200)
        .with_body(r#"{"etag": "abc123"}"#)
        .create_async()
        .await;

    let dispatcher = dispatcher(Some(&server.url()), "info");
    let envelope = dispatcher
        .dispatch(
            "upload_object",
            Some(args(json!({
                "bucket_name": "ingest",
                "object_name": "data.csv",
                "file_path": file_path.to_str().unwrap()
            }))),
        )
        .await;
    let value = envelope.to_value();

    assert_eq!(value["success"], true, "envelope: {}", value);
    assert_eq!(value["data"]["size"], 8);
    assert_eq!(value["data"]["etag"], "abc123");
}

#[tokio::test]
async fn test_upload_object_missing_file_is_validation() {
    let dispatcher = dispatcher(None, "info");
    let envelope = dispatcher
        .dispatch(
            "upload_object",
            Some(args(json!({
                "bucket_name": "ingest",
                "object_name": "data.csv",
                "file_path": "/definitely/not/here.csv"
            }))),
        )
        .await;
    let value = envelope.to_value();

    assert_eq!(value["error"]["type"], "Validation");
    assert_eq!(
        value["error"]["details"]["file_path"],
        "/definitely/not/here.csv"
    );
}

#[tokio::test]
async fn test_download_object_writes_destination_file() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/object-storage/n/acme/b/ingest/o/report.csv")
        .with_status(200)
        .with_body("x,y\n3,4\n")
        .create_async()
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let dest = dir.path().join("nested/report.csv");

    let dispatcher = dispatcher(Some(&server.url()), "info");
    let envelope = dispatcher
        .dispatch(
            "download_object",
            Some(args(json!({
                "bucket_name": "ingest",
                "object_name": "report.csv",
                "dest_path": dest.to_str().unwrap()
            }))),
        )
        .await;
    let value = envelope.to_value();

    assert_eq!(value["success"], true, "envelope: {}", value);
    assert_eq!(
        std::fs::read_to_string(&dest).expect("downloaded file"),
        "x,y\n3,4\n"
    );
}

#[tokio::test]
async fn test_bulk_upload_reports_per_file_outcomes() {
    let dir = tempfile::tempdir().expect("tempdir");
    let good = dir.path().join("a.csv");
    std::fs::write(&good, b"1").expect("write fixture");

    let mut server = mockito::Server::new_async().await;
    server
        .mock("PUT", "/object-storage/n/acme/b/ingest/o/batch/a.csv")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let dispatcher = dispatcher(Some(&server.url()), "info");
    let envelope = dispatcher
        .dispatch(
            "bulk_upload",
            Some(args(json!({
                "bucket_name": "ingest",
                "prefix": "batch",
                "file_paths": [good.to_str().unwrap(), "/definitely/not/here.csv"]
            }))),
        )
        .await;
    let value = envelope.to_value();

    assert_eq!(value["success"], true, "envelope: {}", value);
    assert_eq!(value["data"]["successful"], 1);
    assert_eq!(value["data"]["failed"], 1);
    assert_eq!(value["data"]["results"][0]["status"], "success");
    assert_eq!(value["data"]["results"][1]["status"], "failed");
    assert!(value["data"]["results"][1]["error"]
        .as_str()
        .unwrap()
        .contains("File not found"));
}

#[tokio::test]
async fn test_grant_workspace_access_rejects_unknown_role() {
    let dispatcher = dispatcher(None, "info");
    let envelope = dispatcher
        .dispatch(
            "grant_workspace_access",
            Some(args(json!({
                "workspace_name": "analytics",
                "user_id": "usr-1",
                "role": "owner"
            }))),
        )
        .await;
    let value = envelope.to_value();

    assert_eq!(value["error"]["type"], "Validation");
    assert_eq!(
        value["error"]["details"]["valid_values"],
        json!(["viewer", "contributor", "admin"])
    );
}

#[tokio::test]
async fn test_instance_metrics_filter_by_type() {
    let dispatcher = dispatcher(None, "info");
    let envelope = dispatcher
        .dispatch(
            "get_instance_metrics",
            Some(args(json!({"metric_type": "cpu"}))),
        )
        .await;
    let value = envelope.to_value();

    assert_eq!(value["success"], true);
    assert_eq!(value["data"]["metric_type"], "cpu");
    assert!(value["data"]["metrics"]["cpu"].is_object());
    assert!(value["data"]["metrics"]["memory"].is_null());
    assert!(value["data"]["timestamp"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn test_pool_lifecycle_actions_report_transitional_status() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/compute/pools/pool-7/actions/start")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let dispatcher = dispatcher(Some(&server.url()), "info");
    let envelope = dispatcher
        .dispatch("start_pool", Some(args(json!({"pool_id": "pool-7"}))))
        .await;
    let value = envelope.to_value();

    assert_eq!(value["success"], true, "envelope: {}", value);
    assert_eq!(value["data"]["status"], "STARTING");
}

#[tokio::test]
async fn test_list_tools_serializes_descriptors() {
    let dispatcher = dispatcher(None, "info");
    let listing = dispatcher.list_tools();

    let tools = listing.as_array().expect("array");
    assert_eq!(tools.len(), 61);
    let bucket_tool = tools
        .iter()
        .find(|tool| tool["name"] == "get_bucket_details")
        .expect("get_bucket_details listed");
    assert_eq!(bucket_tool["inputSchema"]["required"], json!(["bucket_name"]));
    assert!(bucket_tool["description"].as_str().unwrap().len() > 10);
}
