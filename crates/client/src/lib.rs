//! Backend client layer for Strato.
//!
//! Owns the lazily-constructed, shared connection to each backend service
//! and the resilient call wrapper every handler goes through. Handles are
//! constructed single-flight: concurrent first use of a service produces
//! exactly one construction, and every later call reuses it until
//! [`ClientRegistry::shutdown`].

use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use strato_config::Settings;
use strato_core::ToolError;

pub mod backend;
pub mod credentials;
pub mod retry;

pub use backend::{BackendError, ClientHandle, Service};
pub use credentials::Credentials;
pub use retry::{call_api, classify, RetryPolicy};

/// Registry of per-service client handles plus the shared credential context.
pub struct ClientRegistry {
    settings: Arc<Settings>,
    handles: RwLock<HashMap<Service, Arc<ClientHandle>>>,
    credentials: RwLock<Option<Arc<Credentials>>>,
    constructions: AtomicUsize,
}

impl ClientRegistry {
    pub fn new(settings: Arc<Settings>) -> Self {
        Self {
            settings,
            handles: RwLock::new(HashMap::new()),
            credentials: RwLock::new(None),
            constructions: AtomicUsize::new(0),
        }
    }

    /// Handle for one backend service, constructing it on first use.
    pub async fn handle(&self, service: Service) -> Result<Arc<ClientHandle>, ToolError> {
        if let Some(handle) = self.handles.read().await.get(&service) {
            return Ok(handle.clone());
        }

        let mut handles = self.handles.write().await;
        // A concurrent caller may have won the construction race.
        if let Some(handle) = handles.get(&service) {
            return Ok(handle.clone());
        }

        let credentials = self.credentials().await?;
        let instance = self
            .settings
            .instance()
            .map_err(|e| ToolError::configuration(e.to_string()))?;
        let handle = Arc::new(ClientHandle::connect(
            service,
            instance,
            &self.settings.performance,
            credentials,
        )?);
        self.constructions.fetch_add(1, Ordering::Relaxed);
        handles.insert(service, handle.clone());
        debug!(service = service.as_str(), "constructed backend client");
        Ok(handle)
    }

    pub async fn object_storage(&self) -> Result<Arc<ClientHandle>, ToolError> {
        self.handle(Service::ObjectStorage).await
    }

    pub async fn identity(&self) -> Result<Arc<ClientHandle>, ToolError> {
        self.handle(Service::Identity).await
    }

    pub async fn compute(&self) -> Result<Arc<ClientHandle>, ToolError> {
        self.handle(Service::Compute).await
    }

    pub async fn catalog(&self) -> Result<Arc<ClientHandle>, ToolError> {
        self.handle(Service::Catalog).await
    }

    /// Shared credential context, loaded once; a failed load caches nothing.
    async fn credentials(&self) -> Result<Arc<Credentials>, ToolError> {
        if let Some(credentials) = self.credentials.read().await.as_ref() {
            return Ok(credentials.clone());
        }

        let mut slot = self.credentials.write().await;
        if let Some(credentials) = slot.as_ref() {
            return Ok(credentials.clone());
        }

        let instance = self
            .settings
            .instance()
            .map_err(|e| ToolError::configuration(e.to_string()))?;
        let credentials =
            Arc::new(Credentials::load(&self.settings.auth, instance).await?);
        *slot = Some(credentials.clone());
        Ok(credentials)
    }

    /// Number of handle constructions since startup.
    pub fn construction_count(&self) -> usize {
        self.constructions.load(Ordering::Relaxed)
    }

    /// Drop every handle and the credential context.
    ///
    /// Later use re-triggers lazy construction.
    pub async fn shutdown(&self) {
        self.handles.write().await.clear();
        *self.credentials.write().await = None;
        info!("backend clients closed");
    }

    /// Probe the identity and object storage services.
    ///
    /// Per-service failures are reported in the result, never raised.
    pub async fn test_connection(&self) -> Value {
        let mut services = Map::new();
        let policy = RetryPolicy::from(&self.settings.performance);

        let identity = match self.identity().await {
            Ok(handle) => {
                call_api("test_identity", &policy, || handle.get_json("/tenancy", &[])).await
            }
            Err(err) => Err(err),
        };
        services.insert("identity".to_string(), probe_result(identity));

        let instance = self.settings.instance().ok().cloned();
        let storage = match (self.object_storage().await, &instance) {
            (Ok(handle), Some(instance)) => {
                let path = format!("/n/{}/b", instance.namespace);
                let query = [("compartmentId", instance.compartment_id.clone())];
                call_api("test_object_storage", &policy, || {
                    handle.get_json(&path, &query)
                })
                .await
            }
            (Ok(_), None) => Err(ToolError::configuration("no active instance")),
            (Err(err), _) => Err(err),
        };
        services.insert("object_storage".to_string(), probe_result(storage));

        json!({
            "region": instance.as_ref().map(|i| i.region.clone()),
            "compartment_id": instance.as_ref().map(|i| i.compartment_id.clone()),
            "namespace": instance.as_ref().map(|i| i.namespace.clone()),
            "services": services,
        })
    }
}

fn probe_result(result: Result<Value, ToolError>) -> Value {
    match result {
        Ok(_) => json!({"status": "connected"}),
        Err(err) => json!({"status": "failed", "error": err.to_string()}),
    }
}
