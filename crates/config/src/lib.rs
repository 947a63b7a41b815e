//! Configuration for the Strato control server.
//!
//! Settings are loaded once at startup from a JSON file, adjusted by
//! environment overrides, validated, and then passed by reference into the
//! dispatcher and client registry. There is no ambient global lookup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub mod paths;

pub use paths::{config_path, data_dir, expand_home};

/// Errors raised while loading or validating settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// One platform instance the server can be pointed at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceConfig {
    pub region: String,
    pub compartment_id: String,
    pub namespace: String,
    /// Overrides the per-service endpoint scheme, for private deployments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_bucket: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// How the credential context is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    /// Read a named profile from a local credentials file.
    ConfigFile,
    /// Derive the context from the running environment, no file needed.
    AmbientIdentity,
}

impl Default for AuthMethod {
    fn default() -> Self {
        AuthMethod::ConfigFile
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub method: AuthMethod,
    #[serde(default = "default_credentials_path")]
    pub credentials_path: String,
    #[serde(default = "default_profile")]
    pub profile: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            method: AuthMethod::default(),
            credentials_path: default_credentials_path(),
            profile: default_profile(),
        }
    }
}

fn default_credentials_path() -> String {
    "~/.strato/credentials".to_string()
}

fn default_profile() -> String {
    "DEFAULT".to_string()
}

/// Default values applied when a caller omits optional arguments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default = "default_storage_tier")]
    pub storage_tier: String,
    #[serde(default = "default_cluster_shape")]
    pub cluster_shape: String,
    #[serde(default = "default_cluster_worker_count")]
    pub cluster_worker_count: u32,
    #[serde(default = "default_notebook_shape")]
    pub notebook_shape: String,
    #[serde(default = "default_job_timeout_minutes")]
    pub job_timeout_minutes: u32,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            storage_tier: default_storage_tier(),
            cluster_shape: default_cluster_shape(),
            cluster_worker_count: default_cluster_worker_count(),
            notebook_shape: default_notebook_shape(),
            job_timeout_minutes: default_job_timeout_minutes(),
        }
    }
}

fn default_storage_tier() -> String {
    "Standard".to_string()
}

fn default_cluster_shape() -> String {
    "compute.standard.4".to_string()
}

fn default_cluster_worker_count() -> u32 {
    2
}

fn default_notebook_shape() -> String {
    "compute.standard.1".to_string()
}

fn default_job_timeout_minutes() -> u32 {
    60
}

/// Timeouts, retry bounds, and pool sizing for backend calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceConfig {
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_max_retry_attempts")]
    pub max_retry_attempts: u32,
    #[serde(default = "default_backoff_base_secs")]
    pub backoff_base_secs: u64,
    #[serde(default = "default_backoff_min_secs")]
    pub backoff_min_secs: u64,
    #[serde(default = "default_backoff_max_secs")]
    pub backoff_max_secs: u64,
    #[serde(default = "default_connection_pool_size")]
    pub connection_pool_size: usize,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
            max_retry_attempts: default_max_retry_attempts(),
            backoff_base_secs: default_backoff_base_secs(),
            backoff_min_secs: default_backoff_min_secs(),
            backoff_max_secs: default_backoff_max_secs(),
            connection_pool_size: default_connection_pool_size(),
        }
    }
}

fn default_request_timeout_secs() -> u64 {
    300
}

fn default_max_retry_attempts() -> u32 {
    3
}

fn default_backoff_base_secs() -> u64 {
    1
}

fn default_backoff_min_secs() -> u64 {
    2
}

fn default_backoff_max_secs() -> u64 {
    10
}

fn default_connection_pool_size() -> usize {
    20
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl LoggingConfig {
    /// Verbose mode gates error-cause echo to the caller.
    pub fn verbose(&self) -> bool {
        self.level.eq_ignore_ascii_case("debug")
    }
}

/// One flag per feature area; a disabled area contributes no tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureFlags {
    #[serde(default = "default_true")]
    pub object_storage: bool,
    #[serde(default = "default_true")]
    pub compute_clusters: bool,
    #[serde(default = "default_true")]
    pub data_catalog: bool,
    #[serde(default = "default_true")]
    pub workspaces: bool,
    #[serde(default = "default_true")]
    pub notebooks: bool,
    #[serde(default = "default_true")]
    pub jobs: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            object_storage: true,
            compute_clusters: true,
            data_catalog: true,
            workspaces: true,
            notebooks: true,
            jobs: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Root settings object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub instances: HashMap<String, InstanceConfig>,
    #[serde(default = "default_active_instance")]
    pub active_instance: String,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub performance: PerformanceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub features: FeatureFlags,
}

fn default_active_instance() -> String {
    "default".to_string()
}

impl Settings {
    /// Load from the default location (`~/.strato/config.json`).
    pub async fn load(instance_override: Option<&str>) -> Result<Self> {
        let path = std::env::var("STRATO_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_path());
        Self::load_from(&path, instance_override).await
    }

    /// Load and validate settings from a specific file.
    pub async fn load_from(path: &Path, instance_override: Option<&str>) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        debug!(path = %path.display(), "loading settings");
        let content = tokio::fs::read_to_string(path).await?;
        let mut settings: Settings = serde_json::from_str(&content)?;

        settings.apply_env_overrides();
        if let Some(instance) = instance_override {
            settings.active_instance = instance.to_string();
        }
        settings.validate()?;
        Ok(settings)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(instance) = std::env::var("STRATO_INSTANCE") {
            self.active_instance = instance;
        }
        if let Ok(level) = std::env::var("STRATO_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(path) = std::env::var("STRATO_CREDENTIALS") {
            self.auth.credentials_path = path;
        }
        if let Ok(timeout) = std::env::var("STRATO_TIMEOUT_SECS") {
            if let Ok(value) = timeout.parse() {
                self.performance.request_timeout_secs = value;
            }
        }
        if let Ok(retries) = std::env::var("STRATO_MAX_RETRIES") {
            if let Ok(value) = retries.parse() {
                self.performance.max_retry_attempts = value;
            }
        }
    }

    /// Fail fast on a malformed settings object.
    pub fn validate(&self) -> Result<()> {
        if self.instances.is_empty() {
            return Err(ConfigError::Invalid("no instances configured".to_string()));
        }
        if !self.instances.contains_key(&self.active_instance) {
            let mut available: Vec<&str> = self.instances.keys().map(String::as_str).collect();
            available.sort_unstable();
            return Err(ConfigError::Invalid(format!(
                "instance '{}' not found (available: {})",
                self.active_instance,
                available.join(", ")
            )));
        }
        if self.performance.max_retry_attempts == 0 {
            return Err(ConfigError::Invalid(
                "performance.max_retry_attempts must be at least 1".to_string(),
            ));
        }
        if self.performance.backoff_min_secs > self.performance.backoff_max_secs {
            return Err(ConfigError::Invalid(
                "performance.backoff_min_secs exceeds backoff_max_secs".to_string(),
            ));
        }
        if self.performance.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "performance.request_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// The active instance configuration.
    pub fn instance(&self) -> Result<&InstanceConfig> {
        self.get_instance(&self.active_instance)
    }

    /// Configuration for a named instance.
    pub fn get_instance(&self, name: &str) -> Result<&InstanceConfig> {
        self.instances
            .get(name)
            .ok_or_else(|| ConfigError::Invalid(format!("instance '{}' not found", name)))
    }
}
