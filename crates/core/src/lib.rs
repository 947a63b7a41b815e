//! Shared core for Strato: error taxonomy, response envelopes, argument
//! validation, and request identifiers.
//!
//! Every other crate in the workspace speaks these types at its boundary.

pub mod envelope;
pub mod error;
pub mod request;
pub mod validate;

pub use envelope::{format_file_size, list_response, timestamp, Envelope, Metadata};
pub use error::{ErrorKind, ToolError};
pub use request::next_request_id;

/// JSON argument map as received from the caller.
pub type JsonMap = serde_json::Map<String, serde_json::Value>;

pub type Result<T> = std::result::Result<T, ToolError>;
