//! Structured logging for textlift.
//!
//! Console and rolling NDJSON output, secret scrubbing, and extraction
//! lifecycle events.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{EventLogEntry, ExtractionEvent, ExtractionEventLogger};
pub use logger::init_logger;
pub use redact::redact_sensitive_data;
