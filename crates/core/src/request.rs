//! Request identifiers.

use std::sync::atomic::{AtomicU64, Ordering};

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Next per-call request id.
///
/// The millisecond clock keeps log output ordered; the process-wide sequence
/// keeps ids unique when calls land in the same millisecond.
pub fn next_request_id() -> String {
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("req_{}_{}", chrono::Utc::now().timestamp_millis(), seq)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_request_ids_are_unique() {
        let ids: HashSet<String> = (0..1000).map(|_| next_request_id()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_request_id_format() {
        let id = next_request_id();
        assert!(id.starts_with("req_"));
        assert_eq!(id.split('_').count(), 3);
    }
}
