//! The closed error taxonomy.
//!
//! Every failure in the system is classified into exactly one [`ErrorKind`]
//! before it crosses the dispatcher boundary; the kind alone determines
//! retry eligibility.

use serde_json::{Map, Value};
use std::fmt;

/// Fixed set of failure classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Authentication,
    Authorization,
    ResourceNotFound,
    ResourceAlreadyExists,
    Validation,
    Api,
    Configuration,
    Timeout,
    RateLimit,
    Network,
    InvalidState,
    QuotaExceeded,
    Unexpected,
}

impl ErrorKind {
    /// Wire name used in error envelopes.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Authentication => "Authentication",
            ErrorKind::Authorization => "Authorization",
            ErrorKind::ResourceNotFound => "ResourceNotFound",
            ErrorKind::ResourceAlreadyExists => "ResourceAlreadyExists",
            ErrorKind::Validation => "Validation",
            ErrorKind::Api => "API",
            ErrorKind::Configuration => "Configuration",
            ErrorKind::Timeout => "Timeout",
            ErrorKind::RateLimit => "RateLimit",
            ErrorKind::Network => "Network",
            ErrorKind::InvalidState => "InvalidState",
            ErrorKind::QuotaExceeded => "QuotaExceeded",
            ErrorKind::Unexpected => "Unexpected",
        }
    }

    /// Only transient transport classes are eligible for retry.
    pub fn retryable(&self) -> bool {
        matches!(self, ErrorKind::Timeout | ErrorKind::Network)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified failure with a message, optional structured detail, and an
/// optional wrapped cause.
#[derive(Debug, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ToolError {
    pub kind: ErrorKind,
    pub message: String,
    pub details: Map<String, Value>,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ToolError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: Map::new(),
            source: None,
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authentication, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ResourceNotFound, message)
    }

    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ResourceAlreadyExists, message)
    }

    pub fn api(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Api, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RateLimit, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message)
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidState, message)
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unexpected, message)
    }

    /// Attach one structured detail entry.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Preserve the underlying failure as the cause.
    pub fn with_source(
        mut self,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn retryable(&self) -> bool {
        self.kind.retryable()
    }

    /// Wire representation of the error object inside an envelope.
    ///
    /// The original error string is only echoed to the caller in verbose
    /// mode; it is always available server-side via the source chain.
    pub fn to_wire(&self, verbose: bool) -> Value {
        let mut out = Map::new();
        out.insert("type".to_string(), Value::from(self.kind.as_str()));
        out.insert("message".to_string(), Value::from(self.message.clone()));
        if !self.details.is_empty() {
            out.insert("details".to_string(), Value::Object(self.details.clone()));
        }
        if verbose {
            if let Some(source) = &self.source {
                out.insert("original_error".to_string(), Value::from(source.to_string()));
            }
        }
        Value::Object(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_wire_names() {
        assert_eq!(ErrorKind::Api.as_str(), "API");
        assert_eq!(ErrorKind::ResourceNotFound.as_str(), "ResourceNotFound");
        assert_eq!(ErrorKind::RateLimit.as_str(), "RateLimit");
    }

    #[test]
    fn test_only_transport_kinds_retryable() {
        assert!(ErrorKind::Timeout.retryable());
        assert!(ErrorKind::Network.retryable());
        assert!(!ErrorKind::RateLimit.retryable());
        assert!(!ErrorKind::Api.retryable());
        assert!(!ErrorKind::Validation.retryable());
        assert!(!ErrorKind::Authentication.retryable());
    }

    #[test]
    fn test_display_includes_kind_and_message() {
        let err = ToolError::validation("Missing required fields");
        assert_eq!(err.to_string(), "Validation: Missing required fields");
    }

    #[test]
    fn test_to_wire_hides_cause_by_default() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        let err = ToolError::network("Network error while calling the backend").with_source(io);

        let quiet = err.to_wire(false);
        assert_eq!(quiet["type"], "Network");
        assert!(quiet.get("original_error").is_none());

        let verbose = err.to_wire(true);
        assert_eq!(verbose["original_error"], "reset");
    }

    #[test]
    fn test_to_wire_includes_details_when_present() {
        let err = ToolError::validation("Missing required fields")
            .with_detail("missing_fields", json!(["bucket_name"]));
        let wire = err.to_wire(false);
        assert_eq!(wire["details"]["missing_fields"], json!(["bucket_name"]));

        let bare = ToolError::api("boom").to_wire(false);
        assert!(bare.get("details").is_none());
    }
}
