// src/events.rs

//! State-change notifications.
//!
//! Repositories and the session handlers publish a [`DomainEvent`] after
//! every local state change. Anything that wants to react (a websocket
//! bridge, a cache, a test) subscribes to the bus; nothing is bound to a
//! particular view layer.

use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    /// The quiz mirror was replaced by a fresh fetch.
    QuizzesReloaded { count: usize },
    QuizCreated { quiz_id: String },
    QuizUpdated { quiz_id: String },
    QuizDeleted { quiz_id: String },
    SessionStarted { session_id: Uuid, quiz_id: String },
    SessionUnlocked { session_id: Uuid },
    SessionAdvanced { session_id: Uuid, index: usize, score: u32 },
    SessionCompleted { session_id: Uuid, score: u32, total: u32 },
    ResultRecorded { quiz_id: String },
    SubscriptionsChanged { uid: String },
    AdminsChanged { uid: String },
    /// Sign-in (`Some`) or sign-out (`None`).
    IdentityChanged { uid: Option<String> },
}

#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }

    /// Publishes an event. Having no subscribers is normal and not an error.
    pub fn publish(&self, event: DomainEvent) {
        tracing::debug!(?event, "domain event");
        let _ = self.sender.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.publish(DomainEvent::QuizCreated {
            quiz_id: "q1".to_string(),
        });

        assert_eq!(
            rx.recv().await.unwrap(),
            DomainEvent::QuizCreated {
                quiz_id: "q1".to_string()
            }
        );
    }

    #[test]
    fn publishing_without_subscribers_is_fine() {
        EventBus::new().publish(DomainEvent::IdentityChanged { uid: None });
    }
}
