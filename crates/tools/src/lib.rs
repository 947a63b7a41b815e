//! Tool surface for Strato: descriptors, the static registry, and the
//! per-feature-area operation modules.
//!
//! Each feature area contributes a fixed list of descriptors at startup;
//! routing is a direct name-to-handler table, validated for collisions at
//! registration time.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use strato_client::{ClientRegistry, RetryPolicy};
use strato_config::{FeatureFlags, InstanceConfig, Settings};
use strato_core::{JsonMap, ToolError};

pub mod catalog;
pub mod compute;
pub mod dispatcher;
pub mod jobs;
pub mod notebooks;
pub mod storage;
pub mod workspaces;

pub use dispatcher::Dispatcher;

/// Shared state handed to every handler.
pub struct ToolContext {
    pub settings: Arc<Settings>,
    pub clients: ClientRegistry,
    pub instance: InstanceConfig,
    pub policy: RetryPolicy,
}

impl ToolContext {
    pub fn new(settings: Arc<Settings>) -> Result<Self, ToolError> {
        let instance = settings
            .instance()
            .map_err(|e| ToolError::configuration(e.to_string()))?
            .clone();
        let policy = RetryPolicy::from(&settings.performance);
        let clients = ClientRegistry::new(settings.clone());
        Ok(Self {
            settings,
            clients,
            instance,
            policy,
        })
    }
}

/// Immutable description of one exposed operation.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl ToolDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }

    /// Field names declared required by the input schema.
    pub fn required_fields(&self) -> Vec<String> {
        self.input_schema["required"]
            .as_array()
            .map(|fields| {
                fields
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

type HandlerFuture = Pin<Box<dyn Future<Output = Result<Value, ToolError>> + Send>>;
type Handler = Arc<dyn Fn(Arc<ToolContext>, JsonMap) -> HandlerFuture + Send + Sync>;

/// A descriptor paired with its handler.
pub struct RegisteredTool {
    pub descriptor: ToolDescriptor,
    handler: Handler,
}

impl RegisteredTool {
    pub fn invoke(&self, ctx: Arc<ToolContext>, args: JsonMap) -> HandlerFuture {
        (self.handler)(ctx, args)
    }
}

/// Static mapping from operation name to descriptor + handler.
///
/// Registration order is preserved for `list()`.
#[derive(Default)]
pub struct ToolRegistry {
    entries: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one tool; duplicate names are a startup configuration error.
    pub fn register<F, Fut>(
        &mut self,
        descriptor: ToolDescriptor,
        handler: F,
    ) -> Result<(), ToolError>
    where
        F: Fn(Arc<ToolContext>, JsonMap) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ToolError>> + Send + 'static,
    {
        if self.index.contains_key(&descriptor.name) {
            return Err(ToolError::configuration("Duplicate tool name")
                .with_detail("tool", descriptor.name.clone()));
        }
        let handler: Handler = Arc::new(move |ctx, args| Box::pin(handler(ctx, args)));
        self.index.insert(descriptor.name.clone(), self.entries.len());
        self.entries.push(RegisteredTool {
            descriptor,
            handler,
        });
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredTool> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    pub fn has(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Descriptors in registration order.
    pub fn list(&self) -> Vec<&ToolDescriptor> {
        self.entries.iter().map(|entry| &entry.descriptor).collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|entry| entry.descriptor.name.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Assemble the registry from the enabled feature areas.
pub fn register_enabled(
    registry: &mut ToolRegistry,
    features: &FeatureFlags,
) -> Result<(), ToolError> {
    if features.workspaces {
        workspaces::register(registry)?;
    }
    if features.data_catalog {
        catalog::register(registry)?;
    }
    if features.object_storage {
        storage::register(registry)?;
    }
    if features.compute_clusters {
        compute::register(registry)?;
    }
    if features.notebooks {
        notebooks::register(registry)?;
    }
    if features.jobs {
        jobs::register(registry)?;
    }
    Ok(())
}

/// Pull the item list out of a backend response, whether the backend
/// returned a bare array or an `items` wrapper.
pub(crate) fn items_of(response: Value) -> Vec<Value> {
    match response {
        Value::Array(items) => items,
        other => other["items"].as_array().cloned().unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn descriptor(name: &str) -> ToolDescriptor {
        ToolDescriptor::new(
            name,
            "test tool",
            json!({
                "type": "object",
                "properties": {"a": {"type": "string"}},
                "required": ["a"]
            }),
        )
    }

    #[test]
    fn test_required_fields_read_from_schema() {
        assert_eq!(descriptor("t").required_fields(), vec!["a".to_string()]);

        let bare = ToolDescriptor::new("t", "d", json!({"type": "object", "properties": {}}));
        assert!(bare.required_fields().is_empty());
    }

    #[test]
    fn test_duplicate_registration_is_configuration_error() {
        let mut registry = ToolRegistry::new();
        registry
            .register(descriptor("dup"), |_, _| async { Ok(json!({})) })
            .expect("first registration");

        let err = registry
            .register(descriptor("dup"), |_, _| async { Ok(json!({})) })
            .unwrap_err();
        assert_eq!(err.kind, strato_core::ErrorKind::Configuration);
        assert_eq!(err.details["tool"], "dup");
    }

    #[test]
    fn test_list_preserves_registration_order() {
        let mut registry = ToolRegistry::new();
        for name in ["zeta", "alpha", "mid"] {
            registry
                .register(descriptor(name), |_, _| async { Ok(json!({})) })
                .expect("register");
        }
        let names: Vec<&str> = registry.list().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
        // A second listing is identical.
        let again: Vec<&str> = registry.list().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, again);
    }

    #[test]
    fn test_items_of_unwraps_both_shapes() {
        assert_eq!(items_of(json!([1, 2])), vec![json!(1), json!(2)]);
        assert_eq!(items_of(json!({"items": [3]})), vec![json!(3)]);
        assert!(items_of(json!({"other": true})).is_empty());
    }
}
