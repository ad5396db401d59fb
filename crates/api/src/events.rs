//! In-process event fan-out for external workers (socket bridge, calendar
//! sync). Delivery is best-effort: a missing or lagging subscriber never
//! fails the mutation that published.

use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::types::{RequestId, RoomId};
use tokio::sync::broadcast;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoordinationEvent {
    pub room_id: RoomId,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<RequestId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl CoordinationEvent {
    fn base(room_id: RoomId, kind: &'static str) -> Self {
        Self {
            room_id,
            kind,
            at: Utc::now(),
            request_id: None,
            outcome: None,
            suggestion_id: None,
            status: None,
        }
    }

    pub fn schedule_updated(room_id: RoomId) -> Self {
        Self::base(room_id, "schedule-updated")
    }

    pub fn suggestion_updated(room_id: RoomId, suggestion_id: String, status: String) -> Self {
        Self {
            suggestion_id: Some(suggestion_id),
            status: Some(status),
            ..Self::base(room_id, "suggestion-updated")
        }
    }

    pub fn request_created(room_id: RoomId, request_id: RequestId) -> Self {
        Self {
            request_id: Some(request_id),
            ..Self::base(room_id, "request-created")
        }
    }

    pub fn request_resolved(
        room_id: RoomId,
        request_id: RequestId,
        outcome: &'static str,
    ) -> Self {
        Self {
            request_id: Some(request_id),
            outcome: Some(outcome),
            ..Self::base(room_id, "request-resolved")
        }
    }
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<CoordinationEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CoordinationEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: CoordinationEvent) {
        // Err only means nobody is listening right now.
        if self.tx.send(event.clone()).is_err() {
            tracing::debug!(kind = event.kind, room_id = %event.room_id, "event dropped: no subscribers");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_published_event() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        let room_id = RoomId::new();

        bus.publish(CoordinationEvent::schedule_updated(room_id));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.kind, "schedule-updated");
        assert_eq!(event.room_id, room_id);
    }

    #[test]
    fn test_publish_without_subscribers_is_fine() {
        let bus = EventBus::new(8);
        bus.publish(CoordinationEvent::schedule_updated(RoomId::new()));
    }

    #[test]
    fn test_event_payload_shape() {
        let room_id = RoomId::new();
        let request_id = RequestId::new();
        let event = CoordinationEvent::request_resolved(room_id, request_id, "approved");
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "request-resolved");
        assert_eq!(json["roomId"], room_id.to_string());
        assert_eq!(json["requestId"], request_id.to_string());
        assert_eq!(json["outcome"], "approved");
        assert!(json.get("at").is_some());
        // Unused optional fields stay off the wire.
        assert!(json.get("suggestionId").is_none());
    }
}
