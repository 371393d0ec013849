//! The event sink: a lifecycle notification hook with no delivery
//! guarantee assumed by the core (no ordering, no acknowledgement). The
//! engine calls it synchronously and does not retry a failed sink.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single lifecycle event. `error` is populated instead of `data` when
/// the corresponding operation failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub name: &'static str,
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Event {
    pub fn ok(name: &'static str, timestamp: i64, data: impl Serialize) -> Self {
        Self {
            name,
            timestamp,
            data: serde_json::to_value(data).ok(),
            error: None,
        }
    }

    pub fn err(name: &'static str, timestamp: i64, error: impl ToString) -> Self {
        Self {
            name,
            timestamp,
            data: None,
            error: Some(error.to_string()),
        }
    }
}

/// Receives lifecycle events from the engine. Implementations must not
/// block for long or panic; the engine makes no attempt to isolate a
/// misbehaving sink.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: Event);
}

/// A sink that drops every event. The default when no sink is configured.
#[derive(Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: Event) {}
}

/// A sink that records every event it receives, for tests.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: parking_lot::Mutex<Vec<Event>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: Event) {
        self.events.lock().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_sink_keeps_events_in_order() {
        let sink = RecordingSink::new();
        sink.emit(Event::ok("engine:initialized", 1, ()));
        sink.emit(Event::ok("index:start", 2, ()));
        let events = sink.events();
        assert_eq!(events[0].name, "engine:initialized");
        assert_eq!(events[1].name, "index:start");
    }

    #[test]
    fn err_event_carries_no_data() {
        let event = Event::err("search:error", 1, "boom");
        assert_eq!(event.error.as_deref(), Some("boom"));
        assert!(event.data.is_none());
    }
}
