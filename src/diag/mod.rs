//! Structured diagnostics.
//!
//! Non-fatal findings (parse failures, unmapped usernames, multi-label
//! issues) are emitted as structured events to an injectable sink instead of
//! being written to any particular output medium. The default sink forwards
//! to `tracing`; tests and embedders that want to inspect events use
//! [`MemorySink`].

use std::fmt;
use std::sync::Mutex;

use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};

/// Severity of a diagnostic event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagLevel {
    Info,
    Warn,
    Error,
}

impl fmt::Display for DiagLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagLevel::Info => write!(f, "info"),
            DiagLevel::Warn => write!(f, "warn"),
            DiagLevel::Error => write!(f, "error"),
        }
    }
}

/// One diagnostic event with structured context fields.
#[derive(Debug, Clone, Serialize)]
pub struct DiagEvent {
    pub level: DiagLevel,
    pub message: String,
    pub context: Vec<(String, Value)>,
}

impl DiagEvent {
    pub fn new(level: DiagLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            context: Vec::new(),
        }
    }

    /// Attach a context field.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.context.push((key.to_string(), value.into()));
        self
    }
}

/// Destination for diagnostic events.
///
/// Implementations must tolerate concurrent emission; the engine only needs
/// `&self` access.
pub trait DiagSink {
    fn emit(&self, event: DiagEvent);

    fn info(&self, message: &str) {
        self.emit(DiagEvent::new(DiagLevel::Info, message));
    }

    fn warn(&self, message: &str) {
        self.emit(DiagEvent::new(DiagLevel::Warn, message));
    }

    fn error(&self, message: &str) {
        self.emit(DiagEvent::new(DiagLevel::Error, message));
    }
}

/// Default sink: forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagSink for TracingSink {
    fn emit(&self, event: DiagEvent) {
        let context = serde_json::to_string(&event.context).unwrap_or_default();
        match event.level {
            DiagLevel::Info => info!(%context, "{}", event.message),
            DiagLevel::Warn => warn!(%context, "{}", event.message),
            DiagLevel::Error => error!(%context, "{}", event.message),
        }
    }
}

/// Collecting sink that keeps every event in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<DiagEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events emitted so far.
    pub fn events(&self) -> Vec<DiagEvent> {
        self.events.lock().expect("diag sink poisoned").clone()
    }

    /// Number of events at the given level.
    pub fn count(&self, level: DiagLevel) -> usize {
        self.events()
            .iter()
            .filter(|e| e.level == level)
            .count()
    }
}

impl DiagSink for MemorySink {
    fn emit(&self, event: DiagEvent) {
        self.events.lock().expect("diag sink poisoned").push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_collects_in_order() {
        let sink = MemorySink::new();
        sink.emit(DiagEvent::new(DiagLevel::Warn, "first").with("iid", 3));
        sink.emit(DiagEvent::new(DiagLevel::Info, "second"));

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].message, "first");
        assert_eq!(events[0].context[0].0, "iid");
        assert_eq!(sink.count(DiagLevel::Warn), 1);
        assert_eq!(sink.count(DiagLevel::Info), 1);
    }

    #[test]
    fn test_level_helpers_work_through_dyn() {
        let sink = MemorySink::new();
        let dyn_sink: &dyn DiagSink = &sink;
        dyn_sink.warn("short warning");
        dyn_sink.info("note");
        assert_eq!(sink.count(DiagLevel::Warn), 1);
        assert_eq!(sink.count(DiagLevel::Info), 1);
        assert!(sink.events()[0].context.is_empty());
    }

    #[test]
    fn test_event_serializes_with_level() {
        let event = DiagEvent::new(DiagLevel::Error, "boom").with("user", "jdoe");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["level"], "error");
        assert_eq!(json["message"], "boom");
    }
}
