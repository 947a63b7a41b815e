//! Job and workflow tools.
//!
//! Placeholder-level like the notebook module: stable schemas and
//! validation, fabricated results, no backend calls yet.

use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use strato_core::envelope::{list_response, timestamp};
use strato_core::validate::{display_name, string_arg};
use strato_core::{JsonMap, ToolError};

use crate::{ToolContext, ToolDescriptor, ToolRegistry};

pub fn register(registry: &mut ToolRegistry) -> Result<(), ToolError> {
    registry.register(
        ToolDescriptor::new(
            "list_jobs",
            "List jobs in the instance",
            json!({
                "type": "object",
                "properties": {
                    "limit": {
                        "type": "integer",
                        "description": "Maximum number of jobs to return"
                    }
                }
            }),
        ),
        list_jobs,
    )?;
    registry.register(
        ToolDescriptor::new(
            "create_job",
            "Create a new job definition",
            json!({
                "type": "object",
                "properties": {
                    "job_name": {"type": "string", "description": "Name for the job"},
                    "timeout_minutes": {
                        "type": "integer",
                        "description": "Run timeout in minutes"
                    }
                },
                "required": ["job_name"]
            }),
        ),
        create_job,
    )?;
    registry.register(
        ToolDescriptor::new(
            "get_job_run",
            "Get details about a job run",
            json!({
                "type": "object",
                "properties": {
                    "run_id": {"type": "string", "description": "Job run identifier"}
                },
                "required": ["run_id"]
            }),
        ),
        get_job_run,
    )?;
    registry.register(
        ToolDescriptor::new(
            "cancel_job_run",
            "Cancel an in-progress job run",
            json!({
                "type": "object",
                "properties": {
                    "run_id": {"type": "string", "description": "Job run identifier"}
                },
                "required": ["run_id"]
            }),
        ),
        cancel_job_run,
    )?;
    Ok(())
}

async fn list_jobs(_ctx: Arc<ToolContext>, _args: JsonMap) -> Result<Value, ToolError> {
    info!("listing jobs");

    Ok(list_response(Vec::new()))
}

async fn create_job(ctx: Arc<ToolContext>, args: JsonMap) -> Result<Value, ToolError> {
    let name = string_arg(&args, "job_name")?;
    display_name(name, "job_name")?;
    let timeout = match args.get("timeout_minutes") {
        Some(value) => strato_core::validate::positive_integer(value, "timeout_minutes")?,
        None => ctx.settings.defaults.job_timeout_minutes as i64,
    };
    info!(job = name, timeout, "creating job");

    Ok(json!({
        "name": name,
        "timeout_minutes": timeout,
        "status": "CREATED",
        "created_time": timestamp(),
        "message": format!("Job '{}' created successfully", name),
    }))
}

async fn get_job_run(_ctx: Arc<ToolContext>, args: JsonMap) -> Result<Value, ToolError> {
    let run_id = string_arg(&args, "run_id")?;
    info!(run_id, "getting job run");

    Ok(json!({
        "run_id": run_id,
        "status": "SUCCEEDED",
        "created_time": timestamp(),
    }))
}

async fn cancel_job_run(_ctx: Arc<ToolContext>, args: JsonMap) -> Result<Value, ToolError> {
    let run_id = string_arg(&args, "run_id")?;
    info!(run_id, "cancelling job run");

    Ok(json!({
        "run_id": run_id,
        "status": "CANCELING",
        "message": "Job run cancellation requested",
    }))
}
