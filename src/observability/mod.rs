//! Observability subsystem
//!
//! Provides:
//! - Typed lifecycle events rendered through `tracing`
//! - Subscriber setup for the binary (stderr, `EnvFilter`)
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on execution
//! 3. Library code never installs a subscriber
//!
//! # Usage
//!
//! ```ignore
//! use modelgate::observability::{init_logging, log_event_with_fields, Event};
//!
//! init_logging(Some("info"));
//! log_event_with_fields(Event::TableNew, &[("table", "points"), ("version", "1")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{build_filter, init_logging, Severity, DEFAULT_LOG_FILTER};

use tracing::{error, info, warn};

fn severity_of(event: Event) -> Severity {
    if event.is_fatal() {
        Severity::Fatal
    } else if event == Event::RecordRejected {
        Severity::Warn
    } else {
        Severity::Info
    }
}

/// Renders fields as `key=value` pairs in the given order.
fn render_fields(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Logs a lifecycle event at its natural severity.
pub fn log_event(event: Event) {
    log_event_with_fields(event, &[]);
}

/// Logs a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    log_at(severity_of(event), event, fields);
}

/// Tracing has no fatal level; fatal events are errors tagged `fatal`.
fn log_at(severity: Severity, event: Event, fields: &[(&str, &str)]) {
    let event = event.as_str();
    let fields = render_fields(fields);
    match severity {
        Severity::Info => info!(event, "{}", fields),
        Severity::Warn => warn!(event, "{}", fields),
        Severity::Fatal => error!(event, fatal = true, "{}", fields),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_events_log_as_fatal() {
        assert_eq!(severity_of(Event::ReconcileFailed), Severity::Fatal);
        assert_eq!(severity_of(Event::TableNew), Severity::Info);
        assert_eq!(severity_of(Event::RecordRejected), Severity::Warn);
    }

    #[test]
    fn test_fields_keep_order() {
        let rendered = render_fields(&[("table", "points"), ("version", "1")]);
        assert_eq!(rendered, "table=points version=1");
    }

    #[test]
    fn test_log_event() {
        // No subscriber installed; must not panic
        log_event(Event::ReconcileStart);
        log_event_with_fields(Event::ConfigLoaded, &[("data_dir", "/tmp/test")]);
    }
}
