//! HTTP transport to one backend service.
//!
//! The backend is treated as an opaque set of REST endpoints that either
//! return a JSON body or fail with a status, an error code, and a message.

use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use strato_config::{InstanceConfig, PerformanceConfig};
use strato_core::ToolError;

use crate::credentials::Credentials;

/// Raw backend failure, before taxonomy classification.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("service error {status} ({code}): {message}")]
    Service {
        status: u16,
        code: String,
        message: String,
    },

    #[error("connection timed out: {0}")]
    Timeout(String),

    #[error("transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            BackendError::Timeout(error.to_string())
        } else {
            BackendError::Transport(error.to_string())
        }
    }
}

/// Backend services the registry can hand out clients for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    ObjectStorage,
    Identity,
    Compute,
    Catalog,
}

impl Service {
    pub fn as_str(&self) -> &'static str {
        match self {
            Service::ObjectStorage => "object-storage",
            Service::Identity => "identity",
            Service::Compute => "compute",
            Service::Catalog => "catalog",
        }
    }

    /// Regional endpoint, unless the instance overrides it.
    pub fn endpoint(&self, instance: &InstanceConfig) -> String {
        match &instance.endpoint {
            Some(base) => format!("{}/{}", base.trim_end_matches('/'), self.as_str()),
            None => format!("https://{}.{}.platform.strato.io", self.as_str(), instance.region),
        }
    }
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lazily-constructed, shared connection to one backend service.
#[derive(Debug)]
pub struct ClientHandle {
    service: Service,
    endpoint: String,
    http: reqwest::Client,
    credentials: Arc<Credentials>,
}

impl ClientHandle {
    pub fn connect(
        service: Service,
        instance: &InstanceConfig,
        performance: &PerformanceConfig,
        credentials: Arc<Credentials>,
    ) -> Result<Self, ToolError> {
        let timeout = std::time::Duration::from_secs(performance.request_timeout_secs);
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .pool_max_idle_per_host(performance.connection_pool_size)
            .build()
            .map_err(|e| {
                ToolError::configuration("Failed to build backend HTTP client").with_source(e)
            })?;

        Ok(Self {
            service,
            endpoint: service.endpoint(instance),
            http,
            credentials,
        })
    }

    pub fn service(&self) -> Service {
        self.service
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub async fn get_json(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Value, BackendError> {
        let request = self.http.get(self.url(path)).query(query);
        self.execute(request).await
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Value, BackendError> {
        let request = self.http.post(self.url(path)).json(body);
        self.execute(request).await
    }

    pub async fn put_json(&self, path: &str, body: &Value) -> Result<Value, BackendError> {
        let request = self.http.put(self.url(path)).json(body);
        self.execute(request).await
    }

    pub async fn delete(&self, path: &str) -> Result<Value, BackendError> {
        let request = self.http.delete(self.url(path));
        self.execute(request).await
    }

    /// Upload a raw body; the response body is decoded as JSON.
    pub async fn put_bytes(
        &self,
        path: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<Value, BackendError> {
        let mut request = self.http.put(self.url(path)).body(body);
        if let Some(content_type) = content_type {
            request = request.header("content-type", content_type);
        }
        self.execute(request).await
    }

    /// Download a raw body.
    pub async fn get_bytes(&self, path: &str) -> Result<Vec<u8>, BackendError> {
        let response = self
            .http
            .get(self.url(path))
            .header("x-strato-tenancy", &self.credentials.tenancy)
            .send()
            .await?;
        let status = response.status();
        debug!(service = self.service.as_str(), status = %status, "backend response");

        if !status.is_success() {
            let text = response.text().await?;
            return Err(Self::decode_error(status, text));
        }
        Ok(response.bytes().await?.to_vec())
    }

    /// HEAD request; the decoded value is built from response headers.
    pub async fn head_json(&self, path: &str) -> Result<Value, BackendError> {
        let response = self
            .http
            .head(self.url(path))
            .header("x-strato-tenancy", &self.credentials.tenancy)
            .send()
            .await?;
        let status = response.status();
        debug!(service = self.service.as_str(), status = %status, "backend response");

        if !status.is_success() {
            return Err(BackendError::Service {
                status: status.as_u16(),
                code: status.canonical_reason().unwrap_or("Unknown").to_string(),
                message: status.to_string(),
            });
        }

        let mut headers = serde_json::Map::new();
        for (name, value) in response.headers() {
            if let Ok(text) = value.to_str() {
                headers.insert(name.as_str().to_string(), Value::String(text.to_string()));
            }
        }
        Ok(Value::Object(headers))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    async fn execute(&self, request: reqwest::RequestBuilder) -> Result<Value, BackendError> {
        let response = request
            .header("x-strato-tenancy", &self.credentials.tenancy)
            .send()
            .await?;
        debug!(service = self.service.as_str(), status = %response.status(), "backend response");
        Self::decode(response).await
    }

    async fn decode(response: reqwest::Response) -> Result<Value, BackendError> {
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            if text.is_empty() {
                return Ok(Value::Null);
            }
            return Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)));
        }

        Err(Self::decode_error(status, text))
    }

    fn decode_error(status: reqwest::StatusCode, text: String) -> BackendError {
        let body: Value = serde_json::from_str(&text).unwrap_or(Value::Null);
        let code = body["code"]
            .as_str()
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown"))
            .to_string();
        let message = body["message"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| {
                if text.is_empty() {
                    status.to_string()
                } else {
                    text.clone()
                }
            });

        BackendError::Service {
            status: status.as_u16(),
            code,
            message,
        }
    }
}
