//! Progress events streamed to the client while a session runs.
//!
//! Events are transient and ordered per session. Delivery is at-most-once:
//! a dropped consumer simply misses updates, it never stops the crawl.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Crawl phase marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlPhase {
    Discovery,
    Investigation,
}

/// One progress event, serialized as a single JSON object per line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    Phase {
        phase: CrawlPhase,
        message: String,
    },
    Scanning {
        url: String,
        depth: u8,
        pages_crawled: usize,
        found: usize,
    },
    Discovery {
        count: usize,
    },
    Info {
        message: String,
    },
    Investigating {
        name: String,
        step: String,
        progress: String,
        message: String,
    },
    FoundCard {
        name: String,
        department: String,
        title: String,
        links_count: usize,
        summary: String,
    },
    Suggestion {
        message: String,
    },
    Error {
        message: String,
    },
    Complete {
        total_cards: usize,
        pages_crawled: usize,
        message: String,
    },
    End {
        message: String,
    },
}

impl ProgressEvent {
    pub fn info(message: impl Into<String>) -> Self {
        ProgressEvent::Info {
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ProgressEvent::Error {
            message: message.into(),
        }
    }
}

/// Best-effort event publisher. Emission never fails and never blocks the
/// crawl; events to a gone consumer are dropped.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

/// Sink writing into a per-session channel (single writer, single reader).
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<ProgressEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: ProgressEvent) {
        // Receiver gone means nobody is watching; the crawl carries on.
        let _ = self.tx.send(event);
    }
}

/// Sink that discards everything. Used by tests and fire-and-forget runs.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: ProgressEvent) {}
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_shape() {
        let event = ProgressEvent::Phase {
            phase: CrawlPhase::Discovery,
            message: "Starting intelligent discovery...".into(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "phase");
        assert_eq!(value["phase"], "discovery");

        let event = ProgressEvent::FoundCard {
            name: "Maria Chen".into(),
            department: "CS".into(),
            title: "Assistant Professor".into(),
            links_count: 2,
            summary: "Vision research".into(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "found_card");
        assert_eq!(value["links_count"], 2);

        let event = ProgressEvent::End {
            message: "Crawling finished".into(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "end");
    }

    #[test]
    fn test_channel_sink_survives_dropped_receiver() {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink = ChannelSink::new(tx);
        drop(rx);
        // Must not panic
        sink.emit(ProgressEvent::info("nobody listening"));
    }
}
