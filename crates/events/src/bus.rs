//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] fans [`SessionEvent`]s out to the presentation layer and any
//! other subscriber. It is designed to be shared via `Arc<EventBus>`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use speedwatch_core::alert::MonitorEvent;
use tokio::sync::broadcast;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// SessionEvent
// ---------------------------------------------------------------------------

/// A [`MonitorEvent`] stamped with its origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEvent {
    /// Session that produced the event.
    pub session_id: Uuid,

    #[serde(flatten)]
    pub event: MonitorEvent,

    /// When the event was published (UTC).
    pub timestamp: DateTime<Utc>,
}

impl SessionEvent {
    pub fn new(session_id: Uuid, event: MonitorEvent) -> Self {
        Self {
            session_id,
            event,
            timestamp: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out event bus.
///
/// # Usage
///
/// ```rust
/// use speedwatch_events::{EventBus, MonitorEvent, SessionEvent};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(SessionEvent::new(
///     uuid::Uuid::new_v4(),
///     MonitorEvent::LimitUpdated { limit_kmh: 50 },
/// ));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: SessionEvent) {
        // Ignore the SendError; it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        let session_id = Uuid::new_v4();

        bus.publish(SessionEvent::new(
            session_id,
            MonitorEvent::ViolationStarted {
                speed_kmh: 71.0,
                limit_kmh: 60,
            },
        ));

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.session_id, session_id);
        assert_eq!(
            received.event,
            MonitorEvent::ViolationStarted {
                speed_kmh: 71.0,
                limit_kmh: 60
            }
        );
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(SessionEvent::new(
            Uuid::new_v4(),
            MonitorEvent::LimitUpdated { limit_kmh: 90 },
        ));

        let e1 = rx1.recv().await.expect("subscriber 1 should receive");
        let e2 = rx2.recv().await.expect("subscriber 2 should receive");
        assert_eq!(e1, e2);
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::default();
        bus.publish(SessionEvent::new(
            Uuid::new_v4(),
            MonitorEvent::LimitUpdated { limit_kmh: 60 },
        ));
    }

    #[test]
    fn session_event_serializes_flat() {
        let event = SessionEvent::new(
            Uuid::nil(),
            MonitorEvent::ViolationEnded {
                speed_kmh: 55.0,
                limit_kmh: 60,
            },
        );
        let json = serde_json::to_value(&event).expect("serializable");
        assert_eq!(json["type"], "violation_ended");
        assert_eq!(json["limit_kmh"], 60);
        assert_eq!(json["session_id"], "00000000-0000-0000-0000-000000000000");
        assert!(json["timestamp"].is_string());
    }
}
