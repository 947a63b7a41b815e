//! Tests for the client registry and single-flight construction

use std::collections::HashMap;
use std::sync::Arc;
use strato_client::{ClientRegistry, Service};
use strato_config::{AuthConfig, AuthMethod, InstanceConfig, Settings};
use strato_core::ErrorKind;

fn settings(method: AuthMethod, credentials_path: &str) -> Arc<Settings> {
    let mut instances = HashMap::new();
    instances.insert(
        "dev".to_string(),
        InstanceConfig {
            region: "ap-melbourne-1".to_string(),
            compartment_id: "cmp.aaaa1111".to_string(),
            namespace: "acme".to_string(),
            endpoint: None,
            default_bucket: None,
            display_name: None,
        },
    );
    Arc::new(Settings {
        instances,
        active_instance: "dev".to_string(),
        auth: AuthConfig {
            method,
            credentials_path: credentials_path.to_string(),
            profile: "DEFAULT".to_string(),
        },
        defaults: Default::default(),
        performance: Default::default(),
        logging: Default::default(),
        features: Default::default(),
    })
}

#[tokio::test]
async fn test_handle_constructed_once_and_reused() {
    let registry = ClientRegistry::new(settings(AuthMethod::AmbientIdentity, ""));

    let first = registry.object_storage().await.expect("handle");
    let second = registry.object_storage().await.expect("handle");

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(registry.construction_count(), 1);
}

#[tokio::test]
async fn test_single_flight_under_concurrent_first_use() {
    let registry = Arc::new(ClientRegistry::new(settings(AuthMethod::AmbientIdentity, "")));

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let registry = registry.clone();
        tasks.push(tokio::spawn(async move {
            registry.handle(Service::Compute).await.expect("handle")
        }));
    }
    for task in tasks {
        task.await.expect("join");
    }

    assert_eq!(registry.construction_count(), 1);
}

#[tokio::test]
async fn test_distinct_services_get_distinct_handles() {
    let registry = ClientRegistry::new(settings(AuthMethod::AmbientIdentity, ""));

    let storage = registry.object_storage().await.expect("handle");
    let catalog = registry.catalog().await.expect("handle");

    assert_eq!(storage.service(), Service::ObjectStorage);
    assert_eq!(catalog.service(), Service::Catalog);
    assert_eq!(registry.construction_count(), 2);
}

#[tokio::test]
async fn test_shutdown_clears_handles_and_reconstructs() {
    let registry = ClientRegistry::new(settings(AuthMethod::AmbientIdentity, ""));

    let before = registry.identity().await.expect("handle");
    registry.shutdown().await;
    let after = registry.identity().await.expect("handle");

    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(registry.construction_count(), 2);
}

#[tokio::test]
async fn test_missing_credentials_file_fails_without_caching() {
    let registry = ClientRegistry::new(settings(
        AuthMethod::ConfigFile,
        "/nonexistent/credentials",
    ));

    let err = registry.object_storage().await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authentication);
    assert_eq!(err.details["credentials_path"], "/nonexistent/credentials");

    // The failure must not leave a partially-cached handle behind.
    let err = registry.object_storage().await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authentication);
    assert_eq!(registry.construction_count(), 0);
}

#[tokio::test]
async fn test_credentials_loaded_from_profile_file() {
    let dir = tempfile::TempDir::new().expect("temp dir");
    let path = dir.path().join("credentials");
    tokio::fs::write(
        &path,
        "[DEFAULT]\ntenancy = ten.dddd4444\nuser = usr.eeee5555\n",
    )
    .await
    .expect("write credentials");

    let registry = ClientRegistry::new(settings(
        AuthMethod::ConfigFile,
        path.to_str().expect("utf-8 path"),
    ));

    let handle = registry.object_storage().await.expect("handle");
    assert_eq!(handle.credentials().tenancy, "ten.dddd4444");
    assert_eq!(handle.credentials().user.as_deref(), Some("usr.eeee5555"));
    // Instance region overrides the profile default.
    assert_eq!(handle.credentials().region, "ap-melbourne-1");
}

#[tokio::test]
async fn test_unknown_profile_is_authentication_error() {
    let dir = tempfile::TempDir::new().expect("temp dir");
    let path = dir.path().join("credentials");
    tokio::fs::write(&path, "[OTHER]\ntenancy = ten.x\n")
        .await
        .expect("write credentials");

    let registry = ClientRegistry::new(settings(
        AuthMethod::ConfigFile,
        path.to_str().expect("utf-8 path"),
    ));

    let err = registry.identity().await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authentication);
    assert_eq!(err.details["profile"], "DEFAULT");
}
