//! Small helpers shared across modules: id generation and clock access.

use std::sync::atomic::{AtomicU64, Ordering};

/// Generates document ids of the form `"<index-name>-<ordinal>-<epoch-ms>"`.
///
/// The ordinal is a per-index monotonic counter; the timestamp is informative
/// only (two ids generated in the same millisecond are still unique because
/// of the ordinal).
#[derive(Debug)]
pub struct DocIdGenerator {
    index_name: String,
    next_ordinal: AtomicU64,
}

impl DocIdGenerator {
    pub fn new(index_name: impl Into<String>) -> Self {
        Self {
            index_name: index_name.into(),
            next_ordinal: AtomicU64::new(0),
        }
    }

    pub fn next(&self, now_ms: i64) -> String {
        let ordinal = self.next_ordinal.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}-{}", self.index_name, ordinal, now_ms)
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
