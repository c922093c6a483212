//! Real-time fan-out of chat and task-submission events.
//!
//! The hub is an explicit instance owned by [`AppState`](crate::server::AppState),
//! created at process start and dropped at shutdown. Delivery is
//! fire-and-forget: events are published after the corresponding row is
//! durably stored, subscribers that connect later never see past events, and
//! catch-up happens through the read path.
//!
//! Events are delivered to every connected subscriber regardless of project
//! membership (global fan-out). The registry shape would admit per-project
//! filtering, but scoping is intentionally not applied here.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tokio::sync::mpsc;

/// Broadcast events. The field names and formats are the wire contract
/// consumed by the front end and must remain stable.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum Event {
    NewMessage {
        sender_id: i64,
        username: String,
        color_class: &'static str,
        text: String,
        /// Formatted as %H:%M.
        timestamp: String,
    },
    TaskSubmitted {
        task_id: i64,
        project_id: i64,
        submitter_username: String,
        /// Formatted as %Y-%m-%d.
        submitted_at_date: String,
    },
}

/// Handle returned by [`Hub::subscribe`]. Dropping the receiver alone does
/// not deregister; callers should pair it with [`Hub::unsubscribe`] on
/// disconnect (dead senders are also pruned on publish).
pub struct Subscription {
    pub id: u64,
    pub receiver: mpsc::UnboundedReceiver<Event>,
}

#[derive(Default)]
pub struct Hub {
    next_id: AtomicU64,
    subscribers: Mutex<HashMap<u64, mpsc::UnboundedSender<Event>>>,
}

impl Hub {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().insert(id, tx);
        Subscription { id, receiver: rx }
    }

    pub fn unsubscribe(&self, id: u64) {
        self.lock().remove(&id);
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    /// Best-effort delivery to every current subscriber. Failures are logged
    /// and swallowed; they never fail the operation that triggered the event.
    pub fn publish(&self, event: &Event) {
        // Snapshot the senders so subscribers can register or deregister
        // while delivery is in progress.
        let snapshot: Vec<(u64, mpsc::UnboundedSender<Event>)> = self
            .lock()
            .iter()
            .map(|(id, tx)| (*id, tx.clone()))
            .collect();

        let mut dead = Vec::new();
        for (id, tx) in snapshot {
            if tx.send(event.clone()).is_err() {
                tracing::debug!("dropping disconnected subscriber {id}");
                dead.push(id);
            }
        }

        if !dead.is_empty() {
            let mut subscribers = self.lock();
            for id in dead {
                subscribers.remove(&id);
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<u64, mpsc::UnboundedSender<Event>>> {
        self.subscribers.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chat_event(text: &str) -> Event {
        Event::NewMessage {
            sender_id: 1,
            username: "alice".to_string(),
            color_class: "text-success",
            text: text.to_string(),
            timestamp: "12:30".to_string(),
        }
    }

    #[test]
    fn test_publish_reaches_all_subscribers() {
        let hub = Hub::new();
        let mut first = hub.subscribe();
        let mut second = hub.subscribe();

        hub.publish(&chat_event("hi"));

        for sub in [&mut first, &mut second] {
            match sub.receiver.try_recv().unwrap() {
                Event::NewMessage { text, .. } => assert_eq!(text, "hi"),
                other => panic!("unexpected event: {other:?}"),
            }
        }
    }

    #[test]
    fn test_unsubscribed_receives_nothing() {
        let hub = Hub::new();
        let mut sub = hub.subscribe();
        hub.unsubscribe(sub.id);

        hub.publish(&chat_event("hi"));
        assert!(sub.receiver.try_recv().is_err());
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn test_late_subscriber_gets_no_replay() {
        let hub = Hub::new();
        hub.publish(&chat_event("before"));

        let mut sub = hub.subscribe();
        assert!(sub.receiver.try_recv().is_err());

        hub.publish(&chat_event("after"));
        assert!(sub.receiver.try_recv().is_ok());
    }

    #[test]
    fn test_dead_subscribers_are_pruned_on_publish() {
        let hub = Hub::new();
        let sub = hub.subscribe();
        drop(sub.receiver);

        assert_eq!(hub.subscriber_count(), 1);
        hub.publish(&chat_event("hi"));
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn test_event_wire_shape() {
        let event = Event::TaskSubmitted {
            task_id: 7,
            project_id: 3,
            submitter_username: "alice".to_string(),
            submitted_at_date: "2025-01-10".to_string(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "task_submitted");
        assert_eq!(value["data"]["task_id"], 7);
        assert_eq!(value["data"]["project_id"], 3);
        assert_eq!(value["data"]["submitter_username"], "alice");
        assert_eq!(value["data"]["submitted_at_date"], "2025-01-10");

        let value = serde_json::to_value(chat_event("hi")).unwrap();
        assert_eq!(value["event"], "new_message");
        assert_eq!(value["data"]["sender_id"], 1);
        assert_eq!(value["data"]["color_class"], "text-success");
        assert_eq!(value["data"]["timestamp"], "12:30");
    }
}
