//! Observability for tsreplay
//!
//! Structured JSON log lines for replay lifecycle events. Logging is
//! read-only with respect to replay: it never fails or alters it.
//!
//! ```ignore
//! use tsreplay::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::ReplayBegin, &[("mode", "reconcile")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

/// Log a lifecycle event
pub fn log_event(event: Event) {
    log_event_with_fields(event, &[]);
}

/// Log a lifecycle event with fields.
///
/// Fatal events go to stderr, everything else to stdout.
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    if event.is_fatal() {
        Logger::fatal(event.as_str(), fields);
    } else if event == Event::TimestampSizeMismatch {
        Logger::error(event.as_str(), fields);
    } else {
        Logger::info(event.as_str(), fields);
    }
}
