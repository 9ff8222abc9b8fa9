//! Repository update events
//!
//! The `EventRouter` is an observer registry: each subscriber owns an
//! unbounded channel, so a slow subscriber never causes an event to be
//! dropped. Publishing never blocks, which keeps it safe to call from
//! filesystem-watcher threads and request handlers alike.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;

/// A schema branch changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryUpdateEvent {
    pub schema: String,
    /// Set when the change was produced by synchronization itself
    pub self_generated: bool,
    pub occurred_at: DateTime<Utc>,
}

impl RepositoryUpdateEvent {
    /// A change made outside the synchronizer
    pub fn external(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            self_generated: false,
            occurred_at: Utc::now(),
        }
    }

    /// A change produced by synchronization
    pub fn self_generated(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            self_generated: true,
            occurred_at: Utc::now(),
        }
    }
}

/// Default subscription filter: drop events the synchronizer caused
pub fn is_external(event: &RepositoryUpdateEvent) -> bool {
    !event.self_generated
}

/// Publish/subscribe hub for repository events
#[derive(Clone, Default)]
pub struct EventRouter {
    subscribers: Arc<Mutex<Vec<mpsc::UnboundedSender<RepositoryUpdateEvent>>>>,
}

impl EventRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber
    pub fn subscribe(&self) -> EventSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        EventSubscription { receiver: rx }
    }

    /// Deliver `event` to every live subscriber, returning how many received it
    pub fn publish(&self, event: RepositoryUpdateEvent) -> usize {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        tracing::debug!(
            schema = %event.schema,
            self_generated = event.self_generated,
            subscribers = subscribers.len(),
            "published repository event"
        );
        subscribers.len()
    }

    /// Number of registered subscribers (closed ones are pruned on publish)
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Receiving half of a subscription
pub struct EventSubscription {
    receiver: mpsc::UnboundedReceiver<RepositoryUpdateEvent>,
}

impl EventSubscription {
    /// Wait for the next event; `None` once the router is gone
    pub async fn recv(&mut self) -> Option<RepositoryUpdateEvent> {
        self.receiver.recv().await
    }

    /// Take an already delivered event without waiting
    pub fn try_recv(&mut self) -> Option<RepositoryUpdateEvent> {
        self.receiver.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_drops_self_generated() {
        assert!(is_external(&RepositoryUpdateEvent::external("demo")));
        assert!(!is_external(&RepositoryUpdateEvent::self_generated("demo")));
    }

    #[tokio::test]
    async fn test_every_subscriber_receives() {
        let router = EventRouter::new();
        let mut first = router.subscribe();
        let mut second = router.subscribe();

        assert_eq!(router.publish(RepositoryUpdateEvent::external("demo")), 2);

        assert_eq!(first.recv().await.unwrap().schema, "demo");
        assert_eq!(second.recv().await.unwrap().schema, "demo");
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let router = EventRouter::new();
        let kept = router.subscribe();
        drop(router.subscribe());

        assert_eq!(router.subscriber_count(), 2);
        assert_eq!(router.publish(RepositoryUpdateEvent::external("demo")), 1);
        assert_eq!(router.subscriber_count(), 1);
        drop(kept);
    }

    #[test]
    fn test_no_event_lost_without_receiver_polling() {
        let router = EventRouter::new();
        let mut sub = router.subscribe();
        for i in 0..1000 {
            router.publish(RepositoryUpdateEvent::external(format!("schema-{i}")));
        }
        let mut count = 0;
        while sub.try_recv().is_some() {
            count += 1;
        }
        assert_eq!(count, 1000);
    }
}
