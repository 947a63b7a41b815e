//! Tests for registry assembly from feature flags

use strato_config::FeatureFlags;
use strato_tools::{register_enabled, ToolRegistry};

fn build(features: &FeatureFlags) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    register_enabled(&mut registry, features).expect("registry assembly");
    registry
}

#[test]
fn test_all_features_contribute_their_tools() {
    let registry = build(&FeatureFlags::default());

    for name in [
        "get_instance_details",
        "get_instance_metrics",
        "list_workspaces",
        "grant_workspace_access",
        "list_databases",
        "search_catalog",
        "list_buckets",
        "move_object",
        "upload_object",
        "bulk_download",
        "set_object_lifecycle",
        "list_clusters",
        "scale_cluster",
        "list_cluster_runs",
        "create_pool",
        "list_notebook_sessions",
        "cancel_job_run",
    ] {
        assert!(registry.has(name), "missing tool: {}", name);
    }
    assert_eq!(registry.len(), 61);
}

#[test]
fn test_disabled_flag_removes_exactly_that_module() {
    let full = build(&FeatureFlags::default());
    let without_storage = build(&FeatureFlags {
        object_storage: false,
        ..FeatureFlags::default()
    });

    assert!(!without_storage.has("list_buckets"));
    assert!(!without_storage.has("move_object"));
    assert!(!without_storage.has("bulk_upload"));
    assert!(without_storage.has("list_clusters"));
    assert!(without_storage.has("get_instance_details"));
    assert_eq!(full.len() - without_storage.len(), 20);
}

#[test]
fn test_disabling_everything_yields_empty_registry() {
    let registry = build(&FeatureFlags {
        object_storage: false,
        compute_clusters: false,
        data_catalog: false,
        workspaces: false,
        notebooks: false,
        jobs: false,
    });
    assert!(registry.is_empty());
}

#[test]
fn test_listing_is_stable_and_ordered() {
    let registry = build(&FeatureFlags::default());
    let names = registry.names();

    // Workspace tools register first, jobs last.
    assert_eq!(names.first().map(String::as_str), Some("get_instance_details"));
    assert_eq!(names.last().map(String::as_str), Some("cancel_job_run"));
    assert_eq!(names, registry.names());
}

#[test]
fn test_every_descriptor_has_an_object_schema() {
    let registry = build(&FeatureFlags::default());
    for descriptor in registry.list() {
        assert_eq!(
            descriptor.input_schema["type"], "object",
            "schema for {}",
            descriptor.name
        );
        assert!(
            !descriptor.description.is_empty(),
            "description for {}",
            descriptor.name
        );
    }
}
