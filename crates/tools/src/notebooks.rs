//! Notebook session tools.
//!
//! These handlers return placeholder data and make no backend calls; they
//! keep the full dispatcher contract (schemas, validation, envelopes) so the
//! surface is stable while the backing service is wired up.

use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use strato_core::envelope::{list_response, timestamp};
use strato_core::validate::{display_name, optional_string_arg, string_arg};
use strato_core::{JsonMap, ToolError};

use crate::{ToolContext, ToolDescriptor, ToolRegistry};

pub fn register(registry: &mut ToolRegistry) -> Result<(), ToolError> {
    registry.register(
        ToolDescriptor::new(
            "list_notebook_sessions",
            "List notebook sessions in the instance",
            json!({
                "type": "object",
                "properties": {
                    "limit": {
                        "type": "integer",
                        "description": "Maximum number of sessions to return"
                    }
                }
            }),
        ),
        list_notebook_sessions,
    )?;
    registry.register(
        ToolDescriptor::new(
            "create_notebook_session",
            "Create a new notebook session",
            json!({
                "type": "object",
                "properties": {
                    "session_name": {"type": "string", "description": "Name for the session"},
                    "shape": {"type": "string", "description": "Node shape for the session"}
                },
                "required": ["session_name"]
            }),
        ),
        create_notebook_session,
    )?;
    registry.register(
        ToolDescriptor::new(
            "get_notebook_session",
            "Get details about a notebook session",
            json!({
                "type": "object",
                "properties": {
                    "session_id": {"type": "string", "description": "Session identifier"}
                },
                "required": ["session_id"]
            }),
        ),
        get_notebook_session,
    )?;
    registry.register(
        ToolDescriptor::new(
            "stop_notebook_session",
            "Stop a running notebook session",
            json!({
                "type": "object",
                "properties": {
                    "session_id": {"type": "string", "description": "Session identifier"}
                },
                "required": ["session_id"]
            }),
        ),
        stop_notebook_session,
    )?;
    Ok(())
}

async fn list_notebook_sessions(_ctx: Arc<ToolContext>, _args: JsonMap) -> Result<Value, ToolError> {
    info!("listing notebook sessions");

    Ok(list_response(Vec::new()))
}

async fn create_notebook_session(ctx: Arc<ToolContext>, args: JsonMap) -> Result<Value, ToolError> {
    let name = string_arg(&args, "session_name")?;
    display_name(name, "session_name")?;
    let shape = optional_string_arg(&args, "shape")
        .unwrap_or(&ctx.settings.defaults.notebook_shape)
        .to_string();
    info!(session = name, shape = %shape, "creating notebook session");

    Ok(json!({
        "name": name,
        "shape": shape,
        "status": "CREATING",
        "created_time": timestamp(),
        "message": format!("Notebook session '{}' created successfully", name),
    }))
}

async fn get_notebook_session(_ctx: Arc<ToolContext>, args: JsonMap) -> Result<Value, ToolError> {
    let session_id = string_arg(&args, "session_id")?;
    info!(session_id, "getting notebook session");

    Ok(json!({
        "session_id": session_id,
        "status": "ACTIVE",
        "created_time": timestamp(),
    }))
}

async fn stop_notebook_session(_ctx: Arc<ToolContext>, args: JsonMap) -> Result<Value, ToolError> {
    let session_id = string_arg(&args, "session_id")?;
    info!(session_id, "stopping notebook session");

    Ok(json!({
        "session_id": session_id,
        "status": "STOPPING",
        "message": "Notebook session stopped successfully",
    }))
}
