//! Object storage tools: bucket, object, transfer, and lifecycle management.

use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use strato_client::{call_api, Service};
use strato_config::expand_home;
use strato_core::envelope::{format_file_size, list_response};
use strato_core::validate::{
    bucket_name, object_name, one_of, optional_string_arg, positive_integer, string_arg,
    string_array_arg,
};
use strato_core::{JsonMap, ToolError};

use crate::{items_of, ToolContext, ToolDescriptor, ToolRegistry};

pub fn register(registry: &mut ToolRegistry) -> Result<(), ToolError> {
    registry.register(
        ToolDescriptor::new(
            "list_buckets",
            "List all object storage buckets in the compartment",
            json!({
                "type": "object",
                "properties": {
                    "limit": {
                        "type": "integer",
                        "description": "Maximum number of buckets to return"
                    }
                }
            }),
        ),
        list_buckets,
    )?;
    registry.register(
        ToolDescriptor::new(
            "create_bucket",
            "Create a new object storage bucket",
            json!({
                "type": "object",
                "properties": {
                    "bucket_name": {"type": "string", "description": "Name of the bucket"},
                    "storage_tier": {
                        "type": "string",
                        "description": "Storage tier (Standard or Archive)",
                        "enum": ["Standard", "Archive"]
                    },
                    "public_access": {"type": "boolean", "description": "Enable public access"}
                },
                "required": ["bucket_name"]
            }),
        ),
        create_bucket,
    )?;
    registry.register(
        ToolDescriptor::new(
            "get_bucket_details",
            "Get detailed information about a bucket",
            json!({
                "type": "object",
                "properties": {
                    "bucket_name": {"type": "string", "description": "Name of the bucket"}
                },
                "required": ["bucket_name"]
            }),
        ),
        get_bucket_details,
    )?;
    registry.register(
        ToolDescriptor::new(
            "update_bucket",
            "Update bucket settings and metadata",
            json!({
                "type": "object",
                "properties": {
                    "bucket_name": {"type": "string", "description": "Name of the bucket"},
                    "public_access": {
                        "type": "boolean",
                        "description": "Enable or disable public access"
                    }
                },
                "required": ["bucket_name"]
            }),
        ),
        update_bucket,
    )?;
    registry.register(
        ToolDescriptor::new(
            "delete_bucket",
            "Delete an object storage bucket",
            json!({
                "type": "object",
                "properties": {
                    "bucket_name": {"type": "string", "description": "Name of the bucket to delete"},
                    "force": {
                        "type": "boolean",
                        "description": "Delete contained objects first"
                    }
                },
                "required": ["bucket_name"]
            }),
        ),
        delete_bucket,
    )?;
    registry.register(
        ToolDescriptor::new(
            "list_objects",
            "List objects in a bucket with optional prefix filter",
            json!({
                "type": "object",
                "properties": {
                    "bucket_name": {"type": "string", "description": "Name of the bucket"},
                    "prefix": {"type": "string", "description": "Prefix to filter objects"},
                    "limit": {
                        "type": "integer",
                        "description": "Maximum number of objects to return"
                    }
                },
                "required": ["bucket_name"]
            }),
        ),
        list_objects,
    )?;
    registry.register(
        ToolDescriptor::new(
            "upload_object",
            "Upload a local file to a bucket",
            json!({
                "type": "object",
                "properties": {
                    "bucket_name": {"type": "string", "description": "Name of the bucket"},
                    "object_name": {
                        "type": "string",
                        "description": "Name of the object in the bucket"
                    },
                    "file_path": {"type": "string", "description": "Local file path to upload"},
                    "content_type": {
                        "type": "string",
                        "description": "Content type (e.g. text/plain, application/json)"
                    }
                },
                "required": ["bucket_name", "object_name", "file_path"]
            }),
        ),
        upload_object,
    )?;
    registry.register(
        ToolDescriptor::new(
            "download_object",
            "Download an object to a local file",
            json!({
                "type": "object",
                "properties": {
                    "bucket_name": {"type": "string", "description": "Name of the bucket"},
                    "object_name": {"type": "string", "description": "Name of the object"},
                    "dest_path": {"type": "string", "description": "Destination file path"}
                },
                "required": ["bucket_name", "object_name", "dest_path"]
            }),
        ),
        download_object,
    )?;
    registry.register(
        ToolDescriptor::new(
            "get_object_metadata",
            "Get metadata for an object without downloading it",
            json!({
                "type": "object",
                "properties": {
                    "bucket_name": {"type": "string", "description": "Name of the bucket"},
                    "object_name": {"type": "string", "description": "Name of the object"}
                },
                "required": ["bucket_name", "object_name"]
            }),
        ),
        get_object_metadata,
    )?;
    registry.register(
        ToolDescriptor::new(
            "update_object_metadata",
            "Update metadata for an object",
            json!({
                "type": "object",
                "properties": {
                    "bucket_name": {"type": "string", "description": "Name of the bucket"},
                    "object_name": {"type": "string", "description": "Name of the object"},
                    "metadata": {"type": "object", "description": "Metadata key-value pairs"}
                },
                "required": ["bucket_name", "object_name", "metadata"]
            }),
        ),
        update_object_metadata,
    )?;
    registry.register(
        ToolDescriptor::new(
            "delete_object",
            "Delete an object from a bucket",
            json!({
                "type": "object",
                "properties": {
                    "bucket_name": {"type": "string", "description": "Name of the bucket"},
                    "object_name": {"type": "string", "description": "Name of the object to delete"}
                },
                "required": ["bucket_name", "object_name"]
            }),
        ),
        delete_object,
    )?;
    registry.register(
        ToolDescriptor::new(
            "copy_object",
            "Copy an object between buckets",
            json!({
                "type": "object",
                "properties": {
                    "source_bucket": {"type": "string", "description": "Source bucket name"},
                    "source_object": {"type": "string", "description": "Source object name"},
                    "dest_bucket": {"type": "string", "description": "Destination bucket name"},
                    "dest_object": {"type": "string", "description": "Destination object name"}
                },
                "required": ["source_bucket", "source_object", "dest_bucket", "dest_object"]
            }),
        ),
        copy_object,
    )?;
    registry.register(
        ToolDescriptor::new(
            "move_object",
            "Move an object between buckets (copy then delete)",
            json!({
                "type": "object",
                "properties": {
                    "source_bucket": {"type": "string", "description": "Source bucket name"},
                    "source_object": {"type": "string", "description": "Source object name"},
                    "dest_bucket": {"type": "string", "description": "Destination bucket name"},
                    "dest_object": {"type": "string", "description": "Destination object name"}
                },
                "required": ["source_bucket", "source_object", "dest_bucket", "dest_object"]
            }),
        ),
        move_object,
    )?;
    registry.register(
        ToolDescriptor::new(
            "create_presigned_url",
            "Generate a pre-signed URL for temporary object access",
            json!({
                "type": "object",
                "properties": {
                    "bucket_name": {"type": "string", "description": "Name of the bucket"},
                    "object_name": {"type": "string", "description": "Name of the object"},
                    "expiration_hours": {
                        "type": "integer",
                        "description": "URL expiration in hours (default: 24)"
                    },
                    "access_type": {
                        "type": "string",
                        "description": "Access type (read or write)",
                        "enum": ["read", "write"]
                    }
                },
                "required": ["bucket_name", "object_name"]
            }),
        ),
        create_presigned_url,
    )?;
    registry.register(
        ToolDescriptor::new(
            "list_object_versions",
            "List all versions of an object (if versioning is enabled)",
            json!({
                "type": "object",
                "properties": {
                    "bucket_name": {"type": "string", "description": "Name of the bucket"},
                    "object_name": {"type": "string", "description": "Name of the object"}
                },
                "required": ["bucket_name", "object_name"]
            }),
        ),
        list_object_versions,
    )?;
    registry.register(
        ToolDescriptor::new(
            "restore_object_version",
            "Restore a specific version of an object",
            json!({
                "type": "object",
                "properties": {
                    "bucket_name": {"type": "string", "description": "Name of the bucket"},
                    "object_name": {"type": "string", "description": "Name of the object"},
                    "version_id": {"type": "string", "description": "Version ID to restore"}
                },
                "required": ["bucket_name", "object_name", "version_id"]
            }),
        ),
        restore_object_version,
    )?;
    registry.register(
        ToolDescriptor::new(
            "set_object_lifecycle",
            "Set a lifecycle rule for automatic object management",
            json!({
                "type": "object",
                "properties": {
                    "bucket_name": {"type": "string", "description": "Name of the bucket"},
                    "rule_name": {"type": "string", "description": "Lifecycle rule name"},
                    "action": {
                        "type": "string",
                        "description": "Action (delete or archive)",
                        "enum": ["delete", "archive"]
                    },
                    "days": {"type": "integer", "description": "Number of days after creation"}
                },
                "required": ["bucket_name", "rule_name", "action", "days"]
            }),
        ),
        set_object_lifecycle,
    )?;
    registry.register(
        ToolDescriptor::new(
            "get_bucket_lifecycle",
            "Get lifecycle rules for a bucket",
            json!({
                "type": "object",
                "properties": {
                    "bucket_name": {"type": "string", "description": "Name of the bucket"}
                },
                "required": ["bucket_name"]
            }),
        ),
        get_bucket_lifecycle,
    )?;
    registry.register(
        ToolDescriptor::new(
            "bulk_upload",
            "Upload multiple local files to a bucket",
            json!({
                "type": "object",
                "properties": {
                    "bucket_name": {"type": "string", "description": "Name of the bucket"},
                    "file_paths": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "List of local file paths to upload"
                    },
                    "prefix": {"type": "string", "description": "Prefix to add to object names"}
                },
                "required": ["bucket_name", "file_paths"]
            }),
        ),
        bulk_upload,
    )?;
    registry.register(
        ToolDescriptor::new(
            "bulk_download",
            "Download multiple objects from a bucket",
            json!({
                "type": "object",
                "properties": {
                    "bucket_name": {"type": "string", "description": "Name of the bucket"},
                    "object_names": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "List of object names to download"
                    },
                    "dest_directory": {"type": "string", "description": "Destination directory"}
                },
                "required": ["bucket_name", "object_names", "dest_directory"]
            }),
        ),
        bulk_download,
    )?;
    Ok(())
}

async fn list_buckets(ctx: Arc<ToolContext>, args: JsonMap) -> Result<Value, ToolError> {
    let limit = match args.get("limit") {
        Some(value) => positive_integer(value, "limit")?,
        None => 100,
    };
    info!(limit, "listing buckets");

    let handle = ctx.clients.object_storage().await?;
    let path = format!("/n/{}/b", ctx.instance.namespace);
    let query = [
        ("compartmentId", ctx.instance.compartment_id.clone()),
        ("limit", limit.to_string()),
    ];
    let response = call_api("list_buckets", &ctx.policy, || {
        handle.get_json(&path, &query)
    })
    .await?;

    let buckets: Vec<Value> = items_of(response)
        .into_iter()
        .map(|bucket| {
            json!({
                "name": bucket["name"],
                "namespace": bucket["namespace"],
                "compartment_id": bucket["compartment_id"],
                "created_time": bucket["time_created"],
                "etag": bucket["etag"],
            })
        })
        .collect();

    Ok(list_response(buckets))
}

async fn create_bucket(ctx: Arc<ToolContext>, args: JsonMap) -> Result<Value, ToolError> {
    let name = string_arg(&args, "bucket_name")?;
    bucket_name(name)?;
    let tier = optional_string_arg(&args, "storage_tier")
        .unwrap_or(&ctx.settings.defaults.storage_tier)
        .to_string();
    one_of(&tier, &["Standard", "Archive"], "storage_tier")?;
    let public = args
        .get("public_access")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    info!(bucket = name, tier = %tier, "creating bucket");

    let handle = ctx.clients.object_storage().await?;
    let path = format!("/n/{}/b", ctx.instance.namespace);
    let body = json!({
        "name": name,
        "compartmentId": ctx.instance.compartment_id,
        "storageTier": tier,
        "publicAccessType": if public { "ObjectRead" } else { "NoPublicAccess" },
    });
    let response = call_api("create_bucket", &ctx.policy, || {
        handle.post_json(&path, &body)
    })
    .await?;

    Ok(json!({
        "name": response["name"],
        "namespace": response["namespace"],
        "created_time": response["time_created"],
        "storage_tier": response["storage_tier"],
        "message": format!("Bucket '{}' created successfully", name),
    }))
}

async fn get_bucket_details(ctx: Arc<ToolContext>, args: JsonMap) -> Result<Value, ToolError> {
    let name = string_arg(&args, "bucket_name")?;
    info!(bucket = name, "getting bucket details");

    let handle = ctx.clients.object_storage().await?;
    let path = format!("/n/{}/b/{}", ctx.instance.namespace, name);
    let bucket = call_api("get_bucket_details", &ctx.policy, || {
        handle.get_json(&path, &[])
    })
    .await?;

    let approximate_size = bucket["approximate_size"].as_u64().unwrap_or(0);
    Ok(json!({
        "name": bucket["name"],
        "namespace": bucket["namespace"],
        "compartment_id": bucket["compartment_id"],
        "created_time": bucket["time_created"],
        "storage_tier": bucket["storage_tier"],
        "public_access_type": bucket["public_access_type"],
        "etag": bucket["etag"],
        "approximate_count": bucket["approximate_count"],
        "approximate_size": bucket["approximate_size"],
        "approximate_size_formatted": format_file_size(approximate_size),
    }))
}

async fn update_bucket(ctx: Arc<ToolContext>, args: JsonMap) -> Result<Value, ToolError> {
    let name = string_arg(&args, "bucket_name")?;
    info!(bucket = name, "updating bucket");

    let mut body = serde_json::Map::new();
    if let Some(public) = args.get("public_access").and_then(Value::as_bool) {
        body.insert(
            "publicAccessType".to_string(),
            Value::from(if public { "ObjectRead" } else { "NoPublicAccess" }),
        );
    }

    let handle = ctx.clients.object_storage().await?;
    let path = format!("/n/{}/b/{}", ctx.instance.namespace, name);
    let body = Value::Object(body);
    let response = call_api("update_bucket", &ctx.policy, || {
        handle.put_json(&path, &body)
    })
    .await?;

    Ok(json!({
        "name": response["name"],
        "public_access_type": response["public_access_type"],
        "message": format!("Bucket '{}' updated successfully", name),
    }))
}

async fn delete_bucket(ctx: Arc<ToolContext>, args: JsonMap) -> Result<Value, ToolError> {
    let name = string_arg(&args, "bucket_name")?;
    let force = args.get("force").and_then(Value::as_bool).unwrap_or(false);
    info!(bucket = name, force, "deleting bucket");

    let handle = ctx.clients.object_storage().await?;

    // With force, empty the bucket before removing it.
    if force {
        let list_path = format!("/n/{}/b/{}/o", ctx.instance.namespace, name);
        let response = call_api("delete_bucket", &ctx.policy, || {
            handle.get_json(&list_path, &[])
        })
        .await?;
        for object in response["objects"].as_array().unwrap_or(&Vec::new()) {
            if let Some(object_name) = object["name"].as_str() {
                let object_path = format!(
                    "/n/{}/b/{}/o/{}",
                    ctx.instance.namespace, name, object_name
                );
                call_api("delete_bucket", &ctx.policy, || handle.delete(&object_path)).await?;
            }
        }
    }

    let path = format!("/n/{}/b/{}", ctx.instance.namespace, name);
    call_api("delete_bucket", &ctx.policy, || handle.delete(&path)).await?;

    Ok(json!({
        "bucket_name": name,
        "status": "DELETED",
        "message": format!("Bucket '{}' deleted successfully", name),
    }))
}

async fn list_objects(ctx: Arc<ToolContext>, args: JsonMap) -> Result<Value, ToolError> {
    let bucket = string_arg(&args, "bucket_name")?;
    let prefix = optional_string_arg(&args, "prefix");
    let limit = match args.get("limit") {
        Some(value) => positive_integer(value, "limit")?,
        None => 100,
    };
    info!(bucket, prefix, limit, "listing objects");

    let mut query = vec![("limit", limit.to_string())];
    if let Some(prefix) = prefix {
        query.push(("prefix", prefix.to_string()));
    }

    let handle = ctx.clients.object_storage().await?;
    let path = format!("/n/{}/b/{}/o", ctx.instance.namespace, bucket);
    let response = call_api("list_objects", &ctx.policy, || {
        handle.get_json(&path, &query)
    })
    .await?;

    let objects: Vec<Value> = response["objects"]
        .as_array()
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .map(|object| {
            let size = object["size"].as_u64().unwrap_or(0);
            json!({
                "name": object["name"],
                "size": object["size"],
                "size_formatted": format_file_size(size),
                "md5": object["md5"],
                "time_created": object["time_created"],
                "time_modified": object["time_modified"],
                "etag": object["etag"],
            })
        })
        .collect();

    Ok(list_response(objects))
}

async fn upload_object(ctx: Arc<ToolContext>, args: JsonMap) -> Result<Value, ToolError> {
    let bucket = string_arg(&args, "bucket_name")?;
    let object = string_arg(&args, "object_name")?;
    object_name(object)?;
    let file_path = string_arg(&args, "file_path")?;
    let content_type = optional_string_arg(&args, "content_type");
    info!(bucket, object, file_path, "uploading object");

    let (size, response) = put_file(&ctx, bucket, object, file_path, content_type).await?;

    Ok(json!({
        "bucket_name": bucket,
        "object_name": object,
        "size": size,
        "size_formatted": format_file_size(size),
        "etag": response["etag"],
        "message": format!("Object '{}' uploaded successfully", object),
    }))
}

async fn download_object(ctx: Arc<ToolContext>, args: JsonMap) -> Result<Value, ToolError> {
    let bucket = string_arg(&args, "bucket_name")?;
    let object = string_arg(&args, "object_name")?;
    object_name(object)?;
    let dest = string_arg(&args, "dest_path")?;
    info!(bucket, object, dest, "downloading object");

    let dest_path = expand_home(dest);
    let size = fetch_to_file(&ctx, bucket, object, &dest_path).await?;

    Ok(json!({
        "bucket_name": bucket,
        "object_name": object,
        "dest_path": dest_path.display().to_string(),
        "size": size,
        "size_formatted": format_file_size(size),
        "message": format!("Object '{}' downloaded successfully", object),
    }))
}

async fn get_object_metadata(ctx: Arc<ToolContext>, args: JsonMap) -> Result<Value, ToolError> {
    let bucket = string_arg(&args, "bucket_name")?;
    let object = string_arg(&args, "object_name")?;
    object_name(object)?;
    info!(bucket, object, "getting object metadata");

    let handle = ctx.clients.object_storage().await?;
    let path = format!("/n/{}/b/{}/o/{}", ctx.instance.namespace, bucket, object);
    let headers = call_api("get_object_metadata", &ctx.policy, || {
        handle.head_json(&path)
    })
    .await?;

    Ok(json!({
        "bucket_name": bucket,
        "object_name": object,
        "content_length": headers["content-length"],
        "content_type": headers["content-type"],
        "etag": headers["etag"],
        "last_modified": headers["last-modified"],
    }))
}

async fn update_object_metadata(ctx: Arc<ToolContext>, args: JsonMap) -> Result<Value, ToolError> {
    let bucket = string_arg(&args, "bucket_name")?;
    let object = string_arg(&args, "object_name")?;
    object_name(object)?;
    let metadata = args
        .get("metadata")
        .and_then(Value::as_object)
        .cloned()
        .ok_or_else(|| ToolError::validation("metadata must be an object"))?;
    info!(bucket, object, "updating object metadata");

    // Metadata is replaced by copying the object onto itself.
    let handle = ctx.clients.object_storage().await?;
    let path = format!("/n/{}/b/{}/actions/copyObject", ctx.instance.namespace, bucket);
    let body = json!({
        "sourceObjectName": object,
        "destinationRegion": ctx.instance.region,
        "destinationNamespace": ctx.instance.namespace,
        "destinationBucket": bucket,
        "destinationObjectName": object,
        "destinationObjectMetadata": metadata,
    });
    call_api("update_object_metadata", &ctx.policy, || {
        handle.post_json(&path, &body)
    })
    .await?;

    Ok(json!({
        "bucket_name": bucket,
        "object_name": object,
        "metadata": metadata,
        "message": "Metadata updated successfully",
    }))
}

async fn delete_object(ctx: Arc<ToolContext>, args: JsonMap) -> Result<Value, ToolError> {
    let bucket = string_arg(&args, "bucket_name")?;
    let object = string_arg(&args, "object_name")?;
    info!(bucket, object, "deleting object");

    let handle = ctx.clients.object_storage().await?;
    let path = format!("/n/{}/b/{}/o/{}", ctx.instance.namespace, bucket, object);
    call_api("delete_object", &ctx.policy, || handle.delete(&path)).await?;

    Ok(json!({
        "bucket_name": bucket,
        "object_name": object,
        "status": "DELETED",
        "message": format!("Object '{}' deleted successfully", object),
    }))
}

async fn copy_object(ctx: Arc<ToolContext>, args: JsonMap) -> Result<Value, ToolError> {
    let source_bucket = string_arg(&args, "source_bucket")?;
    let source_object = string_arg(&args, "source_object")?;
    let dest_bucket = string_arg(&args, "dest_bucket")?;
    let dest_object = string_arg(&args, "dest_object")?;
    info!(source_bucket, source_object, dest_bucket, dest_object, "copying object");

    copy_between(&ctx, source_bucket, source_object, dest_bucket, dest_object).await?;

    Ok(json!({
        "source_bucket": source_bucket,
        "source_object": source_object,
        "dest_bucket": dest_bucket,
        "dest_object": dest_object,
        "message": "Object copied successfully",
    }))
}

async fn move_object(ctx: Arc<ToolContext>, args: JsonMap) -> Result<Value, ToolError> {
    let source_bucket = string_arg(&args, "source_bucket")?;
    let source_object = string_arg(&args, "source_object")?;
    let dest_bucket = string_arg(&args, "dest_bucket")?;
    let dest_object = string_arg(&args, "dest_object")?;
    info!(source_bucket, source_object, dest_bucket, dest_object, "moving object");

    copy_between(&ctx, source_bucket, source_object, dest_bucket, dest_object).await?;

    // The copy has landed; a delete failure leaves the object in both
    // buckets and must say so.
    let handle = ctx.clients.object_storage().await?;
    let source_path = format!(
        "/n/{}/b/{}/o/{}",
        ctx.instance.namespace, source_bucket, source_object
    );
    call_api("move_object", &ctx.policy, || handle.delete(&source_path))
        .await
        .map_err(|err| {
            err.with_detail("step", "delete_source")
                .with_detail("copy_completed", true)
        })?;

    Ok(json!({
        "source_bucket": source_bucket,
        "source_object": source_object,
        "dest_bucket": dest_bucket,
        "dest_object": dest_object,
        "message": "Object moved successfully",
    }))
}

async fn copy_between(
    ctx: &ToolContext,
    source_bucket: &str,
    source_object: &str,
    dest_bucket: &str,
    dest_object: &str,
) -> Result<Value, ToolError> {
    let handle = ctx.clients.object_storage().await?;
    let path = format!(
        "/n/{}/b/{}/actions/copyObject",
        ctx.instance.namespace, source_bucket
    );
    let body = json!({
        "sourceObjectName": source_object,
        "destinationRegion": ctx.instance.region,
        "destinationNamespace": ctx.instance.namespace,
        "destinationBucket": dest_bucket,
        "destinationObjectName": dest_object,
    });
    call_api("copy_object", &ctx.policy, || handle.post_json(&path, &body)).await
}

async fn create_presigned_url(ctx: Arc<ToolContext>, args: JsonMap) -> Result<Value, ToolError> {
    let bucket = string_arg(&args, "bucket_name")?;
    let object = string_arg(&args, "object_name")?;
    object_name(object)?;
    let expiration_hours = match args.get("expiration_hours") {
        Some(value) => positive_integer(value, "expiration_hours")?,
        None => 24,
    };
    let access_type = optional_string_arg(&args, "access_type").unwrap_or("read");
    one_of(access_type, &["read", "write"], "access_type")?;
    info!(bucket, object, expiration_hours, "creating presigned url");

    // Signing needs the platform key; the unsigned object URL is returned so
    // the caller knows the target.
    let base = Service::ObjectStorage.endpoint(&ctx.instance);
    Ok(json!({
        "bucket_name": bucket,
        "object_name": object,
        "expiration_hours": expiration_hours,
        "access_type": access_type,
        "url": format!("{}/n/{}/b/{}/o/{}", base, ctx.instance.namespace, bucket, object),
        "message": "URL signing requires platform credentials; use the platform CLI for production URLs",
    }))
}

async fn list_object_versions(_ctx: Arc<ToolContext>, args: JsonMap) -> Result<Value, ToolError> {
    let bucket = string_arg(&args, "bucket_name")?;
    let object = string_arg(&args, "object_name")?;
    object_name(object)?;
    info!(bucket, object, "listing object versions");

    Ok(json!({
        "bucket_name": bucket,
        "object_name": object,
        "versions": [],
        "message": "Object versioning must be enabled on the bucket",
    }))
}

async fn restore_object_version(_ctx: Arc<ToolContext>, args: JsonMap) -> Result<Value, ToolError> {
    let bucket = string_arg(&args, "bucket_name")?;
    let object = string_arg(&args, "object_name")?;
    object_name(object)?;
    let version_id = string_arg(&args, "version_id")?;
    info!(bucket, object, version_id, "restoring object version");

    Ok(json!({
        "bucket_name": bucket,
        "object_name": object,
        "version_id": version_id,
        "message": "Version restored successfully",
    }))
}

async fn set_object_lifecycle(ctx: Arc<ToolContext>, args: JsonMap) -> Result<Value, ToolError> {
    let bucket = string_arg(&args, "bucket_name")?;
    let rule_name = string_arg(&args, "rule_name")?;
    let action = string_arg(&args, "action")?;
    one_of(action, &["delete", "archive"], "action")?;
    let days = positive_integer(args.get("days").unwrap_or(&Value::Null), "days")?;
    info!(bucket, rule = rule_name, action, days, "setting lifecycle rule");

    let handle = ctx.clients.object_storage().await?;
    let path = format!("/n/{}/b/{}/l", ctx.instance.namespace, bucket);
    let body = json!({
        "items": [{
            "name": rule_name,
            "action": action.to_uppercase(),
            "timeAmount": days,
            "timeUnit": "DAYS",
            "isEnabled": true,
        }]
    });
    call_api("set_object_lifecycle", &ctx.policy, || {
        handle.put_json(&path, &body)
    })
    .await?;

    Ok(json!({
        "bucket_name": bucket,
        "rule_name": rule_name,
        "action": action,
        "days": days,
        "message": "Lifecycle rule set successfully",
    }))
}

async fn get_bucket_lifecycle(ctx: Arc<ToolContext>, args: JsonMap) -> Result<Value, ToolError> {
    let bucket = string_arg(&args, "bucket_name")?;
    info!(bucket, "getting lifecycle rules");

    let handle = ctx.clients.object_storage().await?;
    let path = format!("/n/{}/b/{}/l", ctx.instance.namespace, bucket);
    let response = call_api("get_bucket_lifecycle", &ctx.policy, || {
        handle.get_json(&path, &[])
    })
    .await?;

    let rules: Vec<Value> = response["items"]
        .as_array()
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .map(|rule| {
            json!({
                "name": rule["name"],
                "action": rule["action"],
                "time_amount": rule["timeAmount"],
                "time_unit": rule["timeUnit"],
                "is_enabled": rule["isEnabled"],
            })
        })
        .collect();

    Ok(json!({
        "bucket_name": bucket,
        "rules": rules,
    }))
}

async fn bulk_upload(ctx: Arc<ToolContext>, args: JsonMap) -> Result<Value, ToolError> {
    let bucket = string_arg(&args, "bucket_name")?;
    let file_paths = string_array_arg(&args, "file_paths")?;
    let prefix = optional_string_arg(&args, "prefix");
    info!(bucket, count = file_paths.len(), "bulk uploading files");

    let mut results = Vec::new();
    let mut successful = 0;
    let mut failed = 0;
    for file_path in &file_paths {
        let file_name = file_name_of(file_path);
        let object = match prefix {
            Some(prefix) => format!("{}/{}", prefix, file_name),
            None => file_name,
        };
        match put_file(&ctx, bucket, &object, file_path, None).await {
            Ok(_) => {
                results.push(json!({"file": file_path, "status": "success"}));
                successful += 1;
            }
            Err(err) => {
                results.push(json!({
                    "file": file_path,
                    "status": "failed",
                    "error": err.message,
                }));
                failed += 1;
            }
        }
    }

    Ok(json!({
        "bucket_name": bucket,
        "total_files": file_paths.len(),
        "successful": successful,
        "failed": failed,
        "results": results,
    }))
}

async fn bulk_download(ctx: Arc<ToolContext>, args: JsonMap) -> Result<Value, ToolError> {
    let bucket = string_arg(&args, "bucket_name")?;
    let object_names = string_array_arg(&args, "object_names")?;
    let dest_directory = string_arg(&args, "dest_directory")?;
    info!(bucket, count = object_names.len(), "bulk downloading objects");

    let dest_dir = expand_home(dest_directory);
    tokio::fs::create_dir_all(&dest_dir).await.map_err(|err| {
        ToolError::unexpected(format!(
            "Failed to create directory: {}",
            dest_dir.display()
        ))
        .with_source(err)
    })?;

    let mut results = Vec::new();
    let mut successful = 0;
    let mut failed = 0;
    for object in &object_names {
        let dest = dest_dir.join(file_name_of(object));
        match fetch_to_file(&ctx, bucket, object, &dest).await {
            Ok(_) => {
                results.push(json!({"object": object, "status": "success"}));
                successful += 1;
            }
            Err(err) => {
                results.push(json!({
                    "object": object,
                    "status": "failed",
                    "error": err.message,
                }));
                failed += 1;
            }
        }
    }

    Ok(json!({
        "bucket_name": bucket,
        "dest_directory": dest_dir.display().to_string(),
        "total_objects": object_names.len(),
        "successful": successful,
        "failed": failed,
        "results": results,
    }))
}

/// Read a local file and store it as an object. Returns the byte count and
/// the backend response.
async fn put_file(
    ctx: &ToolContext,
    bucket: &str,
    object: &str,
    file_path: &str,
    content_type: Option<&str>,
) -> Result<(u64, Value), ToolError> {
    let local = expand_home(file_path);
    let bytes = tokio::fs::read(&local).await.map_err(|err| {
        if err.kind() == std::io::ErrorKind::NotFound {
            ToolError::validation(format!("File not found: {}", file_path))
                .with_detail("file_path", file_path)
        } else {
            ToolError::unexpected(format!("Failed to read file: {}", file_path))
                .with_detail("file_path", file_path)
                .with_source(err)
        }
    })?;
    let size = bytes.len() as u64;

    let handle = ctx.clients.object_storage().await?;
    let path = format!("/n/{}/b/{}/o/{}", ctx.instance.namespace, bucket, object);
    let response = call_api("upload_object", &ctx.policy, || {
        handle.put_bytes(&path, bytes.clone(), content_type)
    })
    .await?;
    Ok((size, response))
}

/// Fetch an object and write it to disk, creating parent directories.
async fn fetch_to_file(
    ctx: &ToolContext,
    bucket: &str,
    object: &str,
    dest: &Path,
) -> Result<u64, ToolError> {
    let handle = ctx.clients.object_storage().await?;
    let path = format!("/n/{}/b/{}/o/{}", ctx.instance.namespace, bucket, object);
    let bytes = call_api("download_object", &ctx.policy, || handle.get_bytes(&path)).await?;

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|err| {
            ToolError::unexpected(format!("Failed to create directory: {}", parent.display()))
                .with_source(err)
        })?;
    }
    tokio::fs::write(dest, &bytes).await.map_err(|err| {
        ToolError::unexpected(format!("Failed to write file: {}", dest.display())).with_source(err)
    })?;
    Ok(bytes.len() as u64)
}

fn file_name_of(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}
