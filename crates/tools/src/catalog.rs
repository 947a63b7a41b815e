//! Data catalog tools: discovery and metadata browsing.

use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use strato_client::call_api;
use strato_core::envelope::list_response;
use strato_core::validate::{positive_integer, string_arg};
use strato_core::{JsonMap, ToolError};

use crate::{items_of, ToolContext, ToolDescriptor, ToolRegistry};

pub fn register(registry: &mut ToolRegistry) -> Result<(), ToolError> {
    registry.register(
        ToolDescriptor::new(
            "list_databases",
            "List all databases in the data catalog",
            json!({
                "type": "object",
                "properties": {
                    "limit": {
                        "type": "integer",
                        "description": "Maximum number of databases to return"
                    }
                }
            }),
        ),
        list_databases,
    )?;
    registry.register(
        ToolDescriptor::new(
            "list_schemas",
            "List schemas in a database",
            json!({
                "type": "object",
                "properties": {
                    "database_id": {"type": "string", "description": "Database identifier"}
                },
                "required": ["database_id"]
            }),
        ),
        list_schemas,
    )?;
    registry.register(
        ToolDescriptor::new(
            "list_tables",
            "List tables in a schema",
            json!({
                "type": "object",
                "properties": {
                    "schema_id": {"type": "string", "description": "Schema identifier"}
                },
                "required": ["schema_id"]
            }),
        ),
        list_tables,
    )?;
    registry.register(
        ToolDescriptor::new(
            "get_table_details",
            "Get structure and statistics for a table",
            json!({
                "type": "object",
                "properties": {
                    "table_id": {"type": "string", "description": "Table identifier"}
                },
                "required": ["table_id"]
            }),
        ),
        get_table_details,
    )?;
    registry.register(
        ToolDescriptor::new(
            "search_catalog",
            "Search the catalog by keyword",
            json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "Search keywords"},
                    "limit": {
                        "type": "integer",
                        "description": "Maximum number of results to return"
                    }
                },
                "required": ["query"]
            }),
        ),
        search_catalog,
    )?;
    Ok(())
}

async fn list_databases(ctx: Arc<ToolContext>, args: JsonMap) -> Result<Value, ToolError> {
    let limit = match args.get("limit") {
        Some(value) => positive_integer(value, "limit")?,
        None => 100,
    };
    info!(limit, "listing databases");

    let handle = ctx.clients.catalog().await?;
    let query = [
        ("compartmentId", ctx.instance.compartment_id.clone()),
        ("limit", limit.to_string()),
    ];
    let response = call_api("list_databases", &ctx.policy, || {
        handle.get_json("/databases", &query)
    })
    .await?;

    let databases: Vec<Value> = items_of(response)
        .into_iter()
        .map(|db| {
            json!({
                "id": db["id"],
                "name": db["name"],
                "description": db["description"],
                "time_created": db["time_created"],
            })
        })
        .collect();

    Ok(list_response(databases))
}

async fn list_schemas(ctx: Arc<ToolContext>, args: JsonMap) -> Result<Value, ToolError> {
    let database_id = string_arg(&args, "database_id")?;
    info!(database_id, "listing schemas");

    let handle = ctx.clients.catalog().await?;
    let path = format!("/databases/{}/schemas", database_id);
    let response = call_api("list_schemas", &ctx.policy, || handle.get_json(&path, &[])).await?;

    let schemas: Vec<Value> = items_of(response)
        .into_iter()
        .map(|schema| {
            json!({
                "id": schema["id"],
                "name": schema["name"],
                "database_id": database_id,
                "table_count": schema["table_count"],
            })
        })
        .collect();

    Ok(list_response(schemas))
}

async fn list_tables(ctx: Arc<ToolContext>, args: JsonMap) -> Result<Value, ToolError> {
    let schema_id = string_arg(&args, "schema_id")?;
    info!(schema_id, "listing tables");

    let handle = ctx.clients.catalog().await?;
    let path = format!("/schemas/{}/tables", schema_id);
    let response = call_api("list_tables", &ctx.policy, || handle.get_json(&path, &[])).await?;

    let tables: Vec<Value> = items_of(response)
        .into_iter()
        .map(|table| {
            json!({
                "id": table["id"],
                "name": table["name"],
                "schema_id": schema_id,
                "row_count": table["row_count"],
                "time_updated": table["time_updated"],
            })
        })
        .collect();

    Ok(list_response(tables))
}

async fn get_table_details(ctx: Arc<ToolContext>, args: JsonMap) -> Result<Value, ToolError> {
    let table_id = string_arg(&args, "table_id")?;
    info!(table_id, "getting table details");

    let handle = ctx.clients.catalog().await?;
    let path = format!("/tables/{}", table_id);
    let table = call_api("get_table_details", &ctx.policy, || {
        handle.get_json(&path, &[])
    })
    .await?;

    Ok(json!({
        "id": table["id"],
        "name": table["name"],
        "description": table["description"],
        "columns": table["columns"],
        "row_count": table["row_count"],
        "size_bytes": table["size_bytes"],
        "time_created": table["time_created"],
        "time_updated": table["time_updated"],
    }))
}

async fn search_catalog(ctx: Arc<ToolContext>, args: JsonMap) -> Result<Value, ToolError> {
    let query_text = string_arg(&args, "query")?;
    if query_text.trim().is_empty() {
        return Err(ToolError::validation("query cannot be empty"));
    }
    let limit = match args.get("limit") {
        Some(value) => positive_integer(value, "limit")?,
        None => 50,
    };
    info!(query = query_text, limit, "searching catalog");

    let handle = ctx.clients.catalog().await?;
    let query = [
        ("q", query_text.to_string()),
        ("limit", limit.to_string()),
    ];
    let response = call_api("search_catalog", &ctx.policy, || {
        handle.get_json("/search", &query)
    })
    .await?;

    let results: Vec<Value> = items_of(response)
        .into_iter()
        .map(|hit| {
            json!({
                "id": hit["id"],
                "name": hit["name"],
                "type": hit["type"],
                "description": hit["description"],
            })
        })
        .collect();

    Ok(json!({
        "query": query_text,
        "count": results.len(),
        "items": results,
    }))
}
