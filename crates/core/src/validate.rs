//! Argument validation, run before any remote call is attempted.

use regex::Regex;
use serde_json::Value;

use crate::error::ToolError;
use crate::JsonMap;

/// Check that every named field is present and non-null.
///
/// Lists every missing field in one error, not just the first.
pub fn require(args: &JsonMap, fields: &[&str]) -> Result<(), ToolError> {
    let missing: Vec<Value> = fields
        .iter()
        .filter(|field| matches!(args.get(**field), None | Some(Value::Null)))
        .map(|field| Value::from(*field))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ToolError::validation("Missing required fields")
            .with_detail("missing_fields", Value::Array(missing)))
    }
}

/// Fetch a string argument, failing with Validation when absent or non-string.
pub fn string_arg<'a>(args: &'a JsonMap, field: &str) -> Result<&'a str, ToolError> {
    args.get(field).and_then(Value::as_str).ok_or_else(|| {
        ToolError::validation(format!("{} must be a string", field)).with_detail("field", field)
    })
}

/// Fetch an optional string argument, treating null as absent.
pub fn optional_string_arg<'a>(args: &'a JsonMap, field: &str) -> Option<&'a str> {
    args.get(field).and_then(Value::as_str)
}

/// Fetch a non-empty array of strings.
pub fn string_array_arg<'a>(args: &'a JsonMap, field: &str) -> Result<Vec<&'a str>, ToolError> {
    let items = args.get(field).and_then(Value::as_array).ok_or_else(|| {
        ToolError::validation(format!("{} must be an array of strings", field))
            .with_detail("field", field)
    })?;
    let strings: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
    if strings.is_empty() || strings.len() != items.len() {
        return Err(
            ToolError::validation(format!("{} must be a non-empty array of strings", field))
                .with_detail("field", field),
        );
    }
    Ok(strings)
}

/// Object Storage bucket name rules: 1-256 chars, alphanumeric plus
/// hyphen/underscore/period, no leading/trailing period, no double periods.
pub fn bucket_name(name: &str) -> Result<(), ToolError> {
    if name.is_empty() {
        return Err(ToolError::validation("Bucket name cannot be empty"));
    }
    if name.len() > 256 {
        return Err(ToolError::validation("Bucket name too long (max 256 characters)")
            .with_detail("length", name.len()));
    }
    if name.starts_with('.') || name.ends_with('.') {
        return Err(ToolError::validation(
            "Bucket name cannot start or end with a period",
        ));
    }
    if name.contains("..") {
        return Err(ToolError::validation(
            "Bucket name cannot contain consecutive periods",
        ));
    }
    let pattern = Regex::new(r"^[a-zA-Z0-9._-]+$").unwrap();
    if !pattern.is_match(name) {
        return Err(
            ToolError::validation("Bucket name contains invalid characters")
                .with_detail("bucket_name", name)
                .with_detail("allowed_characters", "alphanumeric, hyphen, underscore, period"),
        );
    }
    Ok(())
}

/// Object name rules: 1-1024 characters.
pub fn object_name(name: &str) -> Result<(), ToolError> {
    if name.is_empty() {
        return Err(ToolError::validation("Object name cannot be empty"));
    }
    // The limit is in characters, not bytes; multibyte names count per char.
    let length = name.chars().count();
    if length > 1024 {
        return Err(ToolError::validation("Object name too long (max 1024 characters)")
            .with_detail("length", length));
    }
    Ok(())
}

/// Display name rules shared by workspaces and clusters: 1-100 chars,
/// alphanumeric plus hyphen/underscore.
pub fn display_name(name: &str, field: &str) -> Result<(), ToolError> {
    if name.is_empty() {
        return Err(ToolError::validation(format!("{} cannot be empty", field)));
    }
    if name.len() > 100 {
        return Err(
            ToolError::validation(format!("{} too long (max 100 characters)", field))
                .with_detail("length", name.len()),
        );
    }
    let pattern = Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
    if !pattern.is_match(name) {
        return Err(
            ToolError::validation(format!("{} contains invalid characters", field))
                .with_detail(field, name)
                .with_detail("allowed_characters", "alphanumeric, hyphen, underscore"),
        );
    }
    Ok(())
}

/// Coerce a value to a positive integer; accepts numbers and numeric strings.
pub fn positive_integer(value: &Value, field: &str) -> Result<i64, ToolError> {
    let parsed = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    let int_value = parsed.ok_or_else(|| {
        ToolError::validation(format!("{} must be an integer", field))
            .with_detail("value", value.clone())
    })?;

    if int_value <= 0 {
        return Err(ToolError::validation(format!("{} must be positive", field))
            .with_detail("value", int_value));
    }
    Ok(int_value)
}

/// Check that a value is one of the allowed enumeration values.
pub fn one_of(value: &str, valid_values: &[&str], field: &str) -> Result<(), ToolError> {
    if valid_values.contains(&value) {
        Ok(())
    } else {
        Err(ToolError::validation(format!("Invalid {}", field))
            .with_detail("value", value)
            .with_detail(
                "valid_values",
                Value::Array(valid_values.iter().map(|v| Value::from(*v)).collect()),
            ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use serde_json::json;

    fn args(value: Value) -> JsonMap {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_require_lists_every_missing_field() {
        let input = args(json!({"present": 1, "null_field": null}));
        let err = require(&input, &["present", "null_field", "absent"]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(
            err.details["missing_fields"],
            json!(["null_field", "absent"])
        );
    }

    #[test]
    fn test_require_accepts_complete_arguments() {
        let input = args(json!({"a": 1, "b": "x"}));
        assert!(require(&input, &["a", "b"]).is_ok());
    }

    #[test]
    fn test_bucket_name_rejects_period_edges() {
        let err = bucket_name(".bad.").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(err.message.contains("cannot start or end with a period"));
    }

    #[test]
    fn test_bucket_name_rejects_double_periods_and_bad_chars() {
        assert!(bucket_name("a..b").is_err());
        assert!(bucket_name("bad name").is_err());
        assert!(bucket_name("").is_err());
        assert!(bucket_name(&"x".repeat(257)).is_err());
    }

    #[test]
    fn test_bucket_name_accepts_valid_names() {
        assert!(bucket_name("data-lake_raw.2024").is_ok());
    }

    #[test]
    fn test_object_name_bounds() {
        assert!(object_name("path/to/file.parquet").is_ok());
        assert!(object_name("").is_err());
        assert!(object_name(&"x".repeat(1025)).is_err());
    }

    #[test]
    fn test_object_name_limit_counts_characters_not_bytes() {
        // 1000 two-byte characters: 2000 bytes but within the 1024-char limit.
        assert!(object_name(&"é".repeat(1000)).is_ok());
        let err = object_name(&"é".repeat(1025)).unwrap_err();
        assert_eq!(err.details["length"], json!(1025));
    }

    #[test]
    fn test_display_name_rules() {
        assert!(display_name("analytics-01", "workspace_name").is_ok());
        assert!(display_name("has space", "workspace_name").is_err());
        let err = display_name(&"x".repeat(101), "cluster_name").unwrap_err();
        assert!(err.message.contains("cluster_name"));
    }

    #[test]
    fn test_positive_integer_coercion() {
        assert_eq!(positive_integer(&json!(4), "limit").unwrap(), 4);
        assert_eq!(positive_integer(&json!("12"), "limit").unwrap(), 12);
        assert!(positive_integer(&json!(0), "limit").is_err());
        assert!(positive_integer(&json!(-3), "limit").is_err());
        assert!(positive_integer(&json!("abc"), "limit").is_err());
        assert!(positive_integer(&json!(true), "limit").is_err());
    }

    #[test]
    fn test_one_of_reports_valid_values() {
        let err = one_of("Glacier", &["Standard", "Archive"], "storage_tier").unwrap_err();
        assert_eq!(err.details["valid_values"], json!(["Standard", "Archive"]));
        assert!(one_of("Archive", &["Standard", "Archive"], "storage_tier").is_ok());
    }

    #[test]
    fn test_string_array_arg() {
        let input = args(json!({
            "paths": ["a.csv", "b.csv"],
            "mixed": ["a", 2],
            "empty": [],
            "scalar": "x"
        }));
        assert_eq!(string_array_arg(&input, "paths").unwrap(), vec!["a.csv", "b.csv"]);
        assert!(string_array_arg(&input, "mixed").is_err());
        assert!(string_array_arg(&input, "empty").is_err());
        assert!(string_array_arg(&input, "scalar").is_err());
        assert!(string_array_arg(&input, "missing").is_err());
    }

    #[test]
    fn test_string_arg() {
        let input = args(json!({"name": "b1", "n": 3}));
        assert_eq!(string_arg(&input, "name").unwrap(), "b1");
        assert!(string_arg(&input, "n").is_err());
        assert!(string_arg(&input, "missing").is_err());
        assert_eq!(optional_string_arg(&input, "missing"), None);
    }
}
