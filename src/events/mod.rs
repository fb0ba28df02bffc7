//! Panel events - pub/sub hand-off to presentation collaborators.
//!
//! The orchestrator has no UI of its own; chat bubbles and the map layer
//! subscribe here. Events are broadcast over a Tokio channel and dropped
//! when nobody is listening, which is fine: the transcript remains the
//! durable record.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;

use crate::debate::DebatePhase;
use crate::report::ReportPayload;

/// Channel capacity for broadcast
const CHANNEL_CAPACITY: usize = 256;

/// Shared reference to an EventBus.
pub type SharedEventBus = Arc<EventBus>;

/// Everything the engine tells the outside world.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PanelEvent {
    /// Session bootstrap finished; `succeeded` of `total` agents got ids.
    SessionsRefreshed {
        succeeded: usize,
        total: usize,
        timestamp: DateTime<Utc>,
    },

    /// A participant said something display-worthy.
    MessagePosted {
        role: String,
        agent: Option<String>,
        content: String,
        /// Knowledge-base citation chunks backing the answer, passed
        /// through unmodified for the presentation layer.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        references: Vec<Value>,
        timestamp: DateTime<Utc>,
    },

    /// An agent call failed; shown inline, never fatal.
    AgentCallFailed {
        agent: String,
        error: String,
        timestamp: DateTime<Utc>,
    },

    /// The host is interrogating one panelist.
    FollowUpIssued {
        target: String,
        question: String,
        timestamp: DateTime<Utc>,
    },

    /// The final report carries geometry; the map layer should draw it.
    /// This is the `drawGeospatialData` hand-off: the payload is passed
    /// unmodified.
    GeospatialReady {
        payload: ReportPayload,
        timestamp: DateTime<Utc>,
    },

    /// A debate reached a terminal phase.
    DebateConcluded {
        phase: DebatePhase,
        rounds: u32,
        timestamp: DateTime<Utc>,
    },
}

impl PanelEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::SessionsRefreshed { .. } => "sessions_refreshed",
            Self::MessagePosted { .. } => "message_posted",
            Self::AgentCallFailed { .. } => "agent_call_failed",
            Self::FollowUpIssued { .. } => "follow_up_issued",
            Self::GeospatialReady { .. } => "geospatial_ready",
            Self::DebateConcluded { .. } => "debate_concluded",
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::SessionsRefreshed { timestamp, .. }
            | Self::MessagePosted { timestamp, .. }
            | Self::AgentCallFailed { timestamp, .. }
            | Self::FollowUpIssued { timestamp, .. }
            | Self::GeospatialReady { timestamp, .. }
            | Self::DebateConcluded { timestamp, .. } => *timestamp,
        }
    }
}

/// Broadcast event bus connecting the engine to its subscribers.
pub struct EventBus {
    sender: broadcast::Sender<PanelEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Create a shared reference to this event bus.
    pub fn shared(self) -> SharedEventBus {
        Arc::new(self)
    }

    /// Publish an event to all subscribers. No receivers is OK.
    pub fn publish(&self, event: PanelEvent) {
        let event_type = event.event_type();
        match self.sender.send(event) {
            Ok(count) => debug!(event_type, receivers = count, "Event published"),
            Err(_) => debug!(event_type, "Event published (no receivers)"),
        }
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<PanelEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(content: &str) -> PanelEvent {
        PanelEvent::MessagePosted {
            role: "Moderator".to_string(),
            agent: Some("host".to_string()),
            content: content.to_string(),
            references: vec![],
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_publish_reaches_subscriber() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        bus.publish(message("hello"));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type(), "message_posted");
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_fine() {
        let bus = EventBus::new();
        bus.publish(message("nobody listening"));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_multiple_subscribers_each_get_events() {
        let bus = EventBus::new();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();
        bus.publish(message("fan-out"));

        assert!(a.recv().await.is_ok());
        assert!(b.recv().await.is_ok());
    }

    #[test]
    fn test_event_serializes_tagged() {
        let json = serde_json::to_value(message("x")).unwrap();
        assert_eq!(json["type"], "message_posted");
        assert_eq!(json["agent"], "host");
        // Empty citation lists stay off the wire.
        assert!(json.get("references").is_none());
    }

    #[test]
    fn test_references_serialize_when_present() {
        let event = PanelEvent::MessagePosted {
            role: "Geophysical Expert".to_string(),
            agent: Some("geophysical".to_string()),
            content: "450nT magnetic high".to_string(),
            references: vec![serde_json::json!({"doc": "survey-2019"})],
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(event).unwrap();
        assert_eq!(json["references"][0]["doc"], "survey-2019");
    }
}
