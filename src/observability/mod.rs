//! Observability for tables
//!
//! - Structured JSON-lines logging with a process-wide severity filter
//! - Typed lifecycle and rebuild events
//! - Per-table counters
//!
//! Observability never changes table behavior and never fails an operation.

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsSnapshot, TableMetrics};

/// Logs a lifecycle event with fields. Fatal events log at FATAL, the rest
/// at INFO.
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    if event.is_fatal() {
        Logger::fatal(event.as_str(), fields);
    } else {
        Logger::info(event.as_str(), fields);
    }
}
