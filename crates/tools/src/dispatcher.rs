//! Per-invocation lifecycle: request id, validation, handler execution,
//! envelope construction, and outcome logging.

use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

use strato_core::envelope::Envelope;
use strato_core::request::next_request_id;
use strato_core::validate::require;
use strato_core::{JsonMap, ToolError};

use crate::{ToolContext, ToolRegistry};

pub struct Dispatcher {
    registry: ToolRegistry,
    ctx: Arc<ToolContext>,
    verbose: bool,
}

impl Dispatcher {
    pub fn new(registry: ToolRegistry, ctx: Arc<ToolContext>) -> Self {
        let verbose = ctx.settings.logging.verbose();
        Self {
            registry,
            ctx,
            verbose,
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn context(&self) -> &Arc<ToolContext> {
        &self.ctx
    }

    /// Execute one invocation and wrap the outcome in an envelope.
    ///
    /// Never returns an error; every failure becomes an error envelope.
    pub async fn dispatch(&self, name: &str, arguments: Option<JsonMap>) -> Envelope {
        let request_id = next_request_id();
        let started = Instant::now();
        info!(request_id = %request_id, tool = name, "request received");

        let result = self.run(name, arguments.unwrap_or_default()).await;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        match result {
            Ok(data) => {
                info!(
                    request_id = %request_id,
                    tool = name,
                    elapsed_ms,
                    "request completed"
                );
                Envelope::success(data, request_id, elapsed_ms)
            }
            Err(err) => {
                error!(
                    request_id = %request_id,
                    tool = name,
                    kind = err.kind.as_str(),
                    elapsed_ms,
                    error = %err,
                    "request failed"
                );
                Envelope::failure(&err, request_id, elapsed_ms, self.verbose)
            }
        }
    }

    async fn run(&self, name: &str, args: JsonMap) -> Result<Value, ToolError> {
        let tool = self.registry.get(name).ok_or_else(|| {
            ToolError::validation(format!("Unknown tool: {}", name)).with_detail("tool", name)
        })?;

        let required = tool.descriptor.required_fields();
        let fields: Vec<&str> = required.iter().map(String::as_str).collect();
        require(&args, &fields)?;

        // A panicking handler must not take the serve loop down with it; run
        // it on its own task and fold the unwind into the error taxonomy.
        match tokio::spawn(tool.invoke(self.ctx.clone(), args)).await {
            Ok(result) => result,
            Err(join_error) if join_error.is_panic() => {
                let payload = join_error.into_panic();
                let reason = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "handler panicked".to_string());
                Err(ToolError::unexpected("Internal error while executing tool")
                    .with_detail("panic", reason))
            }
            Err(_) => Err(ToolError::unexpected("Tool execution was cancelled")),
        }
    }

    /// The tool listing as a wire value.
    pub fn list_tools(&self) -> Value {
        let tools: Vec<Value> = self
            .registry
            .list()
            .into_iter()
            .filter_map(|descriptor| serde_json::to_value(descriptor).ok())
            .collect();
        Value::Array(tools)
    }
}
