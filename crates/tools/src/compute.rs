//! Compute tools: cluster lifecycle and scaling, runs, and resource pools.

use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use strato_client::call_api;
use strato_core::envelope::list_response;
use strato_core::validate::{display_name, optional_string_arg, positive_integer, string_arg};
use strato_core::{JsonMap, ToolError};

use crate::{items_of, ToolContext, ToolDescriptor, ToolRegistry};

pub fn register(registry: &mut ToolRegistry) -> Result<(), ToolError> {
    registry.register(
        ToolDescriptor::new(
            "list_clusters",
            "List all compute clusters in the compartment",
            json!({
                "type": "object",
                "properties": {
                    "limit": {
                        "type": "integer",
                        "description": "Maximum number of clusters to return"
                    }
                }
            }),
        ),
        list_clusters,
    )?;
    registry.register(
        ToolDescriptor::new(
            "create_cluster",
            "Create a new compute cluster",
            json!({
                "type": "object",
                "properties": {
                    "cluster_name": {"type": "string", "description": "Name for the cluster"},
                    "shape": {
                        "type": "string",
                        "description": "Node shape (e.g. compute.standard.4)"
                    },
                    "worker_count": {"type": "integer", "description": "Number of worker nodes"}
                },
                "required": ["cluster_name"]
            }),
        ),
        create_cluster,
    )?;
    registry.register(
        ToolDescriptor::new(
            "get_cluster_details",
            "Get detailed information about a specific cluster",
            json!({
                "type": "object",
                "properties": {
                    "cluster_id": {"type": "string", "description": "Cluster identifier"}
                },
                "required": ["cluster_id"]
            }),
        ),
        get_cluster_details,
    )?;
    registry.register(
        ToolDescriptor::new(
            "start_cluster",
            "Start a stopped cluster",
            json!({
                "type": "object",
                "properties": {
                    "cluster_id": {"type": "string", "description": "Cluster identifier"}
                },
                "required": ["cluster_id"]
            }),
        ),
        start_cluster,
    )?;
    registry.register(
        ToolDescriptor::new(
            "stop_cluster",
            "Stop a running cluster",
            json!({
                "type": "object",
                "properties": {
                    "cluster_id": {"type": "string", "description": "Cluster identifier"}
                },
                "required": ["cluster_id"]
            }),
        ),
        stop_cluster,
    )?;
    registry.register(
        ToolDescriptor::new(
            "scale_cluster",
            "Change the worker count of a cluster",
            json!({
                "type": "object",
                "properties": {
                    "cluster_id": {"type": "string", "description": "Cluster identifier"},
                    "worker_count": {
                        "type": "integer",
                        "description": "Target number of worker nodes"
                    }
                },
                "required": ["cluster_id", "worker_count"]
            }),
        ),
        scale_cluster,
    )?;
    registry.register(
        ToolDescriptor::new(
            "delete_cluster",
            "Delete a compute cluster",
            json!({
                "type": "object",
                "properties": {
                    "cluster_id": {"type": "string", "description": "Cluster identifier to delete"}
                },
                "required": ["cluster_id"]
            }),
        ),
        delete_cluster,
    )?;
    registry.register(
        ToolDescriptor::new(
            "list_cluster_runs",
            "List runs/executions for clusters",
            json!({
                "type": "object",
                "properties": {
                    "cluster_id": {
                        "type": "string",
                        "description": "Filter by a specific cluster identifier"
                    },
                    "limit": {
                        "type": "integer",
                        "description": "Maximum number of runs to return"
                    }
                }
            }),
        ),
        list_cluster_runs,
    )?;
    registry.register(
        ToolDescriptor::new(
            "get_run_details",
            "Get details about a specific cluster run",
            json!({
                "type": "object",
                "properties": {
                    "run_id": {"type": "string", "description": "Run identifier"}
                },
                "required": ["run_id"]
            }),
        ),
        get_run_details,
    )?;
    registry.register(
        ToolDescriptor::new(
            "create_run",
            "Start a new run/execution on a cluster",
            json!({
                "type": "object",
                "properties": {
                    "cluster_id": {"type": "string", "description": "Cluster identifier"},
                    "display_name": {
                        "type": "string",
                        "description": "Display name for the run"
                    }
                },
                "required": ["cluster_id"]
            }),
        ),
        create_run,
    )?;
    registry.register(
        ToolDescriptor::new(
            "delete_run",
            "Delete a cluster run",
            json!({
                "type": "object",
                "properties": {
                    "run_id": {"type": "string", "description": "Run identifier to delete"}
                },
                "required": ["run_id"]
            }),
        ),
        delete_run,
    )?;
    registry.register(
        ToolDescriptor::new(
            "get_run_logs",
            "Get logs from a cluster run",
            json!({
                "type": "object",
                "properties": {
                    "run_id": {"type": "string", "description": "Run identifier"}
                },
                "required": ["run_id"]
            }),
        ),
        get_run_logs,
    )?;
    registry.register(
        ToolDescriptor::new(
            "list_pools",
            "List all resource pools",
            json!({
                "type": "object",
                "properties": {
                    "limit": {
                        "type": "integer",
                        "description": "Maximum number of pools to return"
                    }
                }
            }),
        ),
        list_pools,
    )?;
    registry.register(
        ToolDescriptor::new(
            "get_pool_details",
            "Get details about a resource pool",
            json!({
                "type": "object",
                "properties": {
                    "pool_id": {"type": "string", "description": "Pool identifier"}
                },
                "required": ["pool_id"]
            }),
        ),
        get_pool_details,
    )?;
    registry.register(
        ToolDescriptor::new(
            "create_pool",
            "Create a new resource pool",
            json!({
                "type": "object",
                "properties": {
                    "pool_name": {"type": "string", "description": "Name for the pool"},
                    "node_count": {
                        "type": "integer",
                        "description": "Number of nodes in the pool"
                    }
                },
                "required": ["pool_name"]
            }),
        ),
        create_pool,
    )?;
    registry.register(
        ToolDescriptor::new(
            "start_pool",
            "Start a stopped resource pool",
            json!({
                "type": "object",
                "properties": {
                    "pool_id": {"type": "string", "description": "Pool identifier"}
                },
                "required": ["pool_id"]
            }),
        ),
        start_pool,
    )?;
    registry.register(
        ToolDescriptor::new(
            "stop_pool",
            "Stop a running resource pool",
            json!({
                "type": "object",
                "properties": {
                    "pool_id": {"type": "string", "description": "Pool identifier"}
                },
                "required": ["pool_id"]
            }),
        ),
        stop_pool,
    )?;
    registry.register(
        ToolDescriptor::new(
            "delete_pool",
            "Delete a resource pool",
            json!({
                "type": "object",
                "properties": {
                    "pool_id": {"type": "string", "description": "Pool identifier to delete"}
                },
                "required": ["pool_id"]
            }),
        ),
        delete_pool,
    )?;
    Ok(())
}

async fn list_clusters(ctx: Arc<ToolContext>, args: JsonMap) -> Result<Value, ToolError> {
    let limit = match args.get("limit") {
        Some(value) => positive_integer(value, "limit")?,
        None => 100,
    };
    info!(limit, "listing clusters");

    let handle = ctx.clients.compute().await?;
    let query = [
        ("compartmentId", ctx.instance.compartment_id.clone()),
        ("limit", limit.to_string()),
    ];
    let response = call_api("list_clusters", &ctx.policy, || {
        handle.get_json("/clusters", &query)
    })
    .await?;

    let clusters: Vec<Value> = items_of(response)
        .into_iter()
        .map(|cluster| {
            json!({
                "id": cluster["id"],
                "name": cluster["display_name"],
                "shape": cluster["shape"],
                "worker_count": cluster["worker_count"],
                "state": cluster["lifecycle_state"],
                "time_created": cluster["time_created"],
            })
        })
        .collect();

    Ok(list_response(clusters))
}

async fn create_cluster(ctx: Arc<ToolContext>, args: JsonMap) -> Result<Value, ToolError> {
    let name = string_arg(&args, "cluster_name")?;
    display_name(name, "cluster_name")?;
    let shape = optional_string_arg(&args, "shape")
        .unwrap_or(&ctx.settings.defaults.cluster_shape)
        .to_string();
    let workers = match args.get("worker_count") {
        Some(value) => positive_integer(value, "worker_count")?,
        None => ctx.settings.defaults.cluster_worker_count as i64,
    };
    info!(cluster = name, shape = %shape, workers, "creating cluster");

    let handle = ctx.clients.compute().await?;
    let body = json!({
        "compartmentId": ctx.instance.compartment_id,
        "displayName": name,
        "shape": shape,
        "workerCount": workers,
    });
    let response = call_api("create_cluster", &ctx.policy, || {
        handle.post_json("/clusters", &body)
    })
    .await?;

    Ok(json!({
        "id": response["id"],
        "name": response["display_name"],
        "state": response["lifecycle_state"],
        "message": format!("Cluster '{}' created successfully", name),
    }))
}

async fn get_cluster_details(ctx: Arc<ToolContext>, args: JsonMap) -> Result<Value, ToolError> {
    let cluster_id = string_arg(&args, "cluster_id")?;
    info!(cluster_id, "getting cluster details");

    let handle = ctx.clients.compute().await?;
    let path = format!("/clusters/{}", cluster_id);
    let cluster = call_api("get_cluster_details", &ctx.policy, || {
        handle.get_json(&path, &[])
    })
    .await?;

    Ok(json!({
        "id": cluster["id"],
        "name": cluster["display_name"],
        "description": cluster["description"],
        "shape": cluster["shape"],
        "worker_count": cluster["worker_count"],
        "state": cluster["lifecycle_state"],
        "time_created": cluster["time_created"],
        "time_updated": cluster["time_updated"],
    }))
}

async fn start_cluster(ctx: Arc<ToolContext>, args: JsonMap) -> Result<Value, ToolError> {
    let cluster_id = string_arg(&args, "cluster_id")?;
    info!(cluster_id, "starting cluster");

    let handle = ctx.clients.compute().await?;
    let path = format!("/clusters/{}/actions/start", cluster_id);
    call_api("start_cluster", &ctx.policy, || {
        handle.post_json(&path, &Value::Null)
    })
    .await?;

    Ok(json!({
        "cluster_id": cluster_id,
        "status": "STARTING",
        "message": "Cluster started successfully",
    }))
}

async fn stop_cluster(ctx: Arc<ToolContext>, args: JsonMap) -> Result<Value, ToolError> {
    let cluster_id = string_arg(&args, "cluster_id")?;
    info!(cluster_id, "stopping cluster");

    let handle = ctx.clients.compute().await?;
    let path = format!("/clusters/{}/actions/stop", cluster_id);
    call_api("stop_cluster", &ctx.policy, || {
        handle.post_json(&path, &Value::Null)
    })
    .await?;

    Ok(json!({
        "cluster_id": cluster_id,
        "status": "STOPPING",
        "message": "Cluster stopped successfully",
    }))
}

async fn scale_cluster(ctx: Arc<ToolContext>, args: JsonMap) -> Result<Value, ToolError> {
    let cluster_id = string_arg(&args, "cluster_id")?;
    let workers = positive_integer(
        args.get("worker_count").unwrap_or(&Value::Null),
        "worker_count",
    )?;
    info!(cluster_id, workers, "scaling cluster");

    let handle = ctx.clients.compute().await?;
    let path = format!("/clusters/{}/actions/scale", cluster_id);
    let body = json!({"workerCount": workers});
    let response = call_api("scale_cluster", &ctx.policy, || {
        handle.post_json(&path, &body)
    })
    .await?;

    Ok(json!({
        "cluster_id": cluster_id,
        "worker_count": workers,
        "state": response["lifecycle_state"],
        "message": format!("Cluster scaling to {} workers", workers),
    }))
}

async fn delete_cluster(ctx: Arc<ToolContext>, args: JsonMap) -> Result<Value, ToolError> {
    let cluster_id = string_arg(&args, "cluster_id")?;
    info!(cluster_id, "deleting cluster");

    let handle = ctx.clients.compute().await?;
    let path = format!("/clusters/{}", cluster_id);
    call_api("delete_cluster", &ctx.policy, || handle.delete(&path)).await?;

    Ok(json!({
        "cluster_id": cluster_id,
        "status": "DELETED",
        "message": "Cluster deleted successfully",
    }))
}

async fn list_cluster_runs(ctx: Arc<ToolContext>, args: JsonMap) -> Result<Value, ToolError> {
    let cluster_id = optional_string_arg(&args, "cluster_id");
    let limit = match args.get("limit") {
        Some(value) => positive_integer(value, "limit")?,
        None => 100,
    };
    info!(cluster_id, limit, "listing cluster runs");

    let mut query = vec![
        ("compartmentId", ctx.instance.compartment_id.clone()),
        ("limit", limit.to_string()),
    ];
    if let Some(cluster_id) = cluster_id {
        query.push(("clusterId", cluster_id.to_string()));
    }

    let handle = ctx.clients.compute().await?;
    let response = call_api("list_cluster_runs", &ctx.policy, || {
        handle.get_json("/runs", &query)
    })
    .await?;

    let runs: Vec<Value> = items_of(response)
        .into_iter()
        .map(|run| {
            json!({
                "id": run["id"],
                "display_name": run["display_name"],
                "cluster_id": run["cluster_id"],
                "state": run["lifecycle_state"],
                "time_created": run["time_created"],
                "time_updated": run["time_updated"],
            })
        })
        .collect();

    Ok(list_response(runs))
}

async fn get_run_details(ctx: Arc<ToolContext>, args: JsonMap) -> Result<Value, ToolError> {
    let run_id = string_arg(&args, "run_id")?;
    info!(run_id, "getting run details");

    let handle = ctx.clients.compute().await?;
    let path = format!("/runs/{}", run_id);
    let run = call_api("get_run_details", &ctx.policy, || {
        handle.get_json(&path, &[])
    })
    .await?;

    Ok(json!({
        "id": run["id"],
        "display_name": run["display_name"],
        "cluster_id": run["cluster_id"],
        "state": run["lifecycle_state"],
        "time_created": run["time_created"],
        "time_updated": run["time_updated"],
    }))
}

async fn create_run(ctx: Arc<ToolContext>, args: JsonMap) -> Result<Value, ToolError> {
    let cluster_id = string_arg(&args, "cluster_id")?;
    let name = match optional_string_arg(&args, "display_name") {
        Some(name) => {
            display_name(name, "display_name")?;
            name.to_string()
        }
        None => format!("run-{}", cluster_id.chars().take(8).collect::<String>()),
    };
    info!(cluster_id, run = %name, "creating run");

    let handle = ctx.clients.compute().await?;
    let body = json!({
        "compartmentId": ctx.instance.compartment_id,
        "clusterId": cluster_id,
        "displayName": name,
    });
    let response = call_api("create_run", &ctx.policy, || {
        handle.post_json("/runs", &body)
    })
    .await?;

    Ok(json!({
        "id": response["id"],
        "display_name": response["display_name"],
        "state": response["lifecycle_state"],
        "message": "Run created successfully",
    }))
}

async fn delete_run(ctx: Arc<ToolContext>, args: JsonMap) -> Result<Value, ToolError> {
    let run_id = string_arg(&args, "run_id")?;
    info!(run_id, "deleting run");

    let handle = ctx.clients.compute().await?;
    let path = format!("/runs/{}", run_id);
    call_api("delete_run", &ctx.policy, || handle.delete(&path)).await?;

    Ok(json!({
        "run_id": run_id,
        "status": "DELETED",
        "message": "Run deleted successfully",
    }))
}

async fn get_run_logs(ctx: Arc<ToolContext>, args: JsonMap) -> Result<Value, ToolError> {
    let run_id = string_arg(&args, "run_id")?;
    info!(run_id, "getting run logs");

    let handle = ctx.clients.compute().await?;
    let path = format!("/runs/{}/logs", run_id);
    let response = call_api("get_run_logs", &ctx.policy, || {
        handle.get_json(&path, &[])
    })
    .await?;

    let logs: Vec<Value> = items_of(response)
        .into_iter()
        .map(|log| {
            json!({
                "name": log["name"],
                "size_in_bytes": log["size_in_bytes"],
                "time_created": log["time_created"],
                "type": log["type"],
            })
        })
        .collect();

    Ok(list_response(logs))
}

async fn list_pools(ctx: Arc<ToolContext>, args: JsonMap) -> Result<Value, ToolError> {
    let limit = match args.get("limit") {
        Some(value) => positive_integer(value, "limit")?,
        None => 100,
    };
    info!(limit, "listing pools");

    let handle = ctx.clients.compute().await?;
    let query = [
        ("compartmentId", ctx.instance.compartment_id.clone()),
        ("limit", limit.to_string()),
    ];
    let response = call_api("list_pools", &ctx.policy, || {
        handle.get_json("/pools", &query)
    })
    .await?;

    let pools: Vec<Value> = items_of(response)
        .into_iter()
        .map(|pool| {
            json!({
                "id": pool["id"],
                "name": pool["display_name"],
                "state": pool["lifecycle_state"],
                "time_created": pool["time_created"],
            })
        })
        .collect();

    Ok(list_response(pools))
}

async fn get_pool_details(ctx: Arc<ToolContext>, args: JsonMap) -> Result<Value, ToolError> {
    let pool_id = string_arg(&args, "pool_id")?;
    info!(pool_id, "getting pool details");

    let handle = ctx.clients.compute().await?;
    let path = format!("/pools/{}", pool_id);
    let pool = call_api("get_pool_details", &ctx.policy, || {
        handle.get_json(&path, &[])
    })
    .await?;

    Ok(json!({
        "id": pool["id"],
        "name": pool["display_name"],
        "description": pool["description"],
        "state": pool["lifecycle_state"],
        "time_created": pool["time_created"],
        "time_updated": pool["time_updated"],
    }))
}

async fn create_pool(ctx: Arc<ToolContext>, args: JsonMap) -> Result<Value, ToolError> {
    let name = string_arg(&args, "pool_name")?;
    display_name(name, "pool_name")?;
    let node_count = match args.get("node_count") {
        Some(value) => Some(positive_integer(value, "node_count")?),
        None => None,
    };
    info!(pool = name, node_count, "creating pool");

    let handle = ctx.clients.compute().await?;
    let body = json!({
        "compartmentId": ctx.instance.compartment_id,
        "displayName": name,
        "configurations": [{
            "shape": ctx.settings.defaults.cluster_shape,
            "min": node_count.unwrap_or(1),
            "max": node_count.unwrap_or(10),
        }],
    });
    let response = call_api("create_pool", &ctx.policy, || {
        handle.post_json("/pools", &body)
    })
    .await?;

    Ok(json!({
        "id": response["id"],
        "name": response["display_name"],
        "state": response["lifecycle_state"],
        "message": format!("Pool '{}' created successfully", name),
    }))
}

async fn start_pool(ctx: Arc<ToolContext>, args: JsonMap) -> Result<Value, ToolError> {
    let pool_id = string_arg(&args, "pool_id")?;
    info!(pool_id, "starting pool");

    let handle = ctx.clients.compute().await?;
    let path = format!("/pools/{}/actions/start", pool_id);
    call_api("start_pool", &ctx.policy, || {
        handle.post_json(&path, &Value::Null)
    })
    .await?;

    Ok(json!({
        "pool_id": pool_id,
        "status": "STARTING",
        "message": "Pool started successfully",
    }))
}

async fn stop_pool(ctx: Arc<ToolContext>, args: JsonMap) -> Result<Value, ToolError> {
    let pool_id = string_arg(&args, "pool_id")?;
    info!(pool_id, "stopping pool");

    let handle = ctx.clients.compute().await?;
    let path = format!("/pools/{}/actions/stop", pool_id);
    call_api("stop_pool", &ctx.policy, || {
        handle.post_json(&path, &Value::Null)
    })
    .await?;

    Ok(json!({
        "pool_id": pool_id,
        "status": "STOPPING",
        "message": "Pool stopped successfully",
    }))
}

async fn delete_pool(ctx: Arc<ToolContext>, args: JsonMap) -> Result<Value, ToolError> {
    let pool_id = string_arg(&args, "pool_id")?;
    info!(pool_id, "deleting pool");

    let handle = ctx.clients.compute().await?;
    let path = format!("/pools/{}", pool_id);
    call_api("delete_pool", &ctx.policy, || handle.delete(&path)).await?;

    Ok(json!({
        "pool_id": pool_id,
        "status": "DELETED",
        "message": "Pool deleted successfully",
    }))
}
