//! The uniform response envelope returned for every invocation.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::ToolError;

/// Envelope metadata attached to success and error responses alike.
#[derive(Debug, Clone, Serialize)]
pub struct Metadata {
    pub timestamp: String,
    pub request_id: String,
    pub execution_time_ms: f64,
}

/// Success/error wrapper; exactly one of `data` and `error` is present.
#[derive(Debug, Serialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
    pub metadata: Metadata,
}

impl Envelope {
    pub fn success(data: Value, request_id: impl Into<String>, elapsed_ms: f64) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            metadata: Metadata {
                timestamp: timestamp(),
                request_id: request_id.into(),
                execution_time_ms: round2(elapsed_ms),
            },
        }
    }

    pub fn failure(
        error: &ToolError,
        request_id: impl Into<String>,
        elapsed_ms: f64,
        verbose: bool,
    ) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_wire(verbose)),
            metadata: Metadata {
                timestamp: timestamp(),
                request_id: request_id.into(),
                execution_time_ms: round2(elapsed_ms),
            },
        }
    }

    /// Wire value of the whole envelope.
    pub fn to_value(&self) -> Value {
        let mut out = json!({
            "success": self.success,
            "metadata": {
                "timestamp": self.metadata.timestamp,
                "request_id": self.metadata.request_id,
                "execution_time_ms": self.metadata.execution_time_ms,
            },
        });
        if let Some(data) = &self.data {
            out["data"] = data.clone();
        }
        if let Some(error) = &self.error {
            out["error"] = error.clone();
        }
        out
    }
}

/// ISO-8601 UTC timestamp.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn round2(ms: f64) -> f64 {
    (ms * 100.0).round() / 100.0
}

/// Collection payload with a count, used by list-shaped handlers.
pub fn list_response(items: Vec<Value>) -> Value {
    json!({
        "count": items.len(),
        "items": items,
    })
}

/// Human-readable byte size ("1.50 MB").
pub fn format_file_size(size_bytes: u64) -> String {
    let mut size = size_bytes as f64;
    for unit in ["B", "KB", "MB", "GB", "TB"] {
        if size < 1024.0 {
            return format!("{:.2} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.2} PB", size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope_has_data_only() {
        let env = Envelope::success(json!({"ok": true}), "req_1_0", 12.345);
        assert!(env.success);
        let value = env.to_value();
        assert_eq!(value["data"]["ok"], true);
        assert!(value.get("error").is_none());
        assert_eq!(value["metadata"]["request_id"], "req_1_0");
        assert_eq!(value["metadata"]["execution_time_ms"], 12.35);
    }

    #[test]
    fn test_failure_envelope_has_error_only() {
        let err = ToolError::not_found("Bucket not found");
        let env = Envelope::failure(&err, "req_2_0", 0.0, false);
        assert!(!env.success);
        let value = env.to_value();
        assert!(value.get("data").is_none());
        assert_eq!(value["error"]["type"], "ResourceNotFound");
        assert_eq!(value["metadata"]["execution_time_ms"], 0.0);
    }

    #[test]
    fn test_execution_time_rounded_to_two_decimals() {
        let env = Envelope::success(json!(null), "req", 1.0 / 3.0);
        assert_eq!(env.metadata.execution_time_ms, 0.33);
        assert!(env.metadata.execution_time_ms >= 0.0);
    }

    #[test]
    fn test_list_response_counts_items() {
        let value = list_response(vec![json!("a"), json!("b")]);
        assert_eq!(value["count"], 2);
        assert_eq!(value["items"][1], "b");
    }

    #[test]
    fn test_format_file_size_units() {
        assert_eq!(format_file_size(512), "512.00 B");
        assert_eq!(format_file_size(1536), "1.50 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5.00 MB");
    }
}
