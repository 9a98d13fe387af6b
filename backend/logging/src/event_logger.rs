//! Extraction lifecycle events, emitted on the `extraction_events` target.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::redact::redact_sensitive_data;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExtractionEvent {
    Started {
        mode: String,
        summarize: bool,
        mime_type: String,
        size_bytes: u64,
    },
    Settled {
        mode: String,
        /// `text`, `forms`, `tables`, or `error`.
        outcome: String,
        latency_ms: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },
    Rejected {
        reason: String,
    },
}

impl ExtractionEvent {
    fn scrub(&mut self) {
        match self {
            ExtractionEvent::Settled {
                detail: Some(detail),
                ..
            } => *detail = redact_sensitive_data(detail),
            ExtractionEvent::Rejected { reason } => *reason = redact_sensitive_data(reason),
            _ => {}
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EventLogEntry {
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub event: ExtractionEvent,
}

pub struct ExtractionEventLogger;

impl ExtractionEventLogger {
    pub fn entry(session_id: &str, mut event: ExtractionEvent) -> EventLogEntry {
        event.scrub();
        EventLogEntry {
            session_id: session_id.to_string(),
            timestamp: Utc::now(),
            event,
        }
    }

    pub fn log(session_id: &str, event: ExtractionEvent) {
        let entry = Self::entry(session_id, event);
        info!(target: "extraction_events", event = ?entry, "Extraction event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settled_detail_is_scrubbed() {
        let entry = ExtractionEventLogger::entry(
            "s1",
            ExtractionEvent::Settled {
                mode: "text".into(),
                outcome: "error".into(),
                latency_ms: 12,
                detail: Some("403 for key=AIzaSyA1b2C3d4E5f6G7h8I9j0KlMn".into()),
            },
        );
        match entry.event {
            ExtractionEvent::Settled { detail, .. } => {
                assert!(!detail.unwrap().contains("AIzaSy"));
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(entry.session_id, "s1");
    }

    #[test]
    fn started_is_untouched() {
        let event = ExtractionEvent::Started {
            mode: "forms".into(),
            summarize: true,
            mime_type: "image/png".into(),
            size_bytes: 42,
        };
        let entry = ExtractionEventLogger::entry("s2", event.clone());
        assert_eq!(entry.event, event);
    }
}
