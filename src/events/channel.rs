use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex, MutexGuard,
};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_debug;

pub type SubscriberId = u64;

struct Subscriber<T> {
    id: SubscriberId,
    tx: UnboundedSender<T>,
}

struct ChannelInner<T> {
    subscribers: Mutex<Vec<Subscriber<T>>>,
    next_id: AtomicU64,
}

/// Publish/subscribe channel. Every subscriber receives its own copy of each
/// event, in publish order. Queues are unbounded; `publish` never waits.
pub struct EventChannel<T> {
    inner: Arc<ChannelInner<T>>,
}

impl<T> Clone for EventChannel<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + 'static> Default for EventChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + 'static> EventChannel<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ChannelInner {
                subscribers: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Subscriber<T>>> {
        match self.inner.subscribers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn subscribe(&self) -> Subscription<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().push(Subscriber { id, tx });
        log_debug!("event channel: subscriber {} registered", id);
        Subscription { id, rx }
    }

    /// Returns true if the subscriber was registered.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut subscribers = self.lock();
        let before = subscribers.len();
        subscribers.retain(|sub| sub.id != id);
        let removed = subscribers.len() != before;
        if removed {
            log_debug!("event channel: subscriber {} removed", id);
        }
        removed
    }

    /// Delivers a copy of `event` to every live subscriber and returns how many
    /// received it. Subscribers whose receiver was dropped are pruned.
    pub fn publish(&self, event: T) -> usize {
        let mut subscribers = self.lock();
        subscribers.retain(|sub| !sub.tx.is_closed());

        let mut delivered = 0;
        for sub in subscribers.iter() {
            if sub.tx.send(event.clone()).is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = self.lock();
        subscribers.retain(|sub| !sub.tx.is_closed());
        subscribers.len()
    }
}

pub struct Subscription<T> {
    id: SubscriberId,
    rx: UnboundedReceiver<T>,
}

impl<T> Subscription<T> {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Waits for the next event. `None` once the subscription was removed
    /// from the channel and its queue is drained.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<T> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_in_publish_order() {
        let channel = EventChannel::new();
        let mut sub = channel.subscribe();

        for n in 0..5 {
            assert_eq!(channel.publish(n), 1);
        }

        for n in 0..5 {
            assert_eq!(sub.recv().await, Some(n));
        }
    }

    #[tokio::test]
    async fn fans_out_copies_to_every_subscriber() {
        let channel = EventChannel::new();
        let mut first = channel.subscribe();
        let mut second = channel.subscribe();

        assert_eq!(channel.publish(String::from("hello")), 2);

        assert_eq!(first.recv().await.as_deref(), Some("hello"));
        assert_eq!(second.recv().await.as_deref(), Some("hello"));
    }

    #[test]
    fn publish_without_subscribers_is_a_no_op() {
        let channel: EventChannel<u32> = EventChannel::new();
        assert_eq!(channel.publish(7), 0);
    }

    #[tokio::test]
    async fn unsubscribe_closes_the_queue_after_draining() {
        let channel = EventChannel::new();
        let mut sub = channel.subscribe();
        channel.publish(1u8);

        assert!(channel.unsubscribe(sub.id()));
        assert!(!channel.unsubscribe(sub.id()));
        assert_eq!(channel.publish(2u8), 0);

        assert_eq!(sub.recv().await, Some(1));
        assert_eq!(sub.recv().await, None);
    }

    #[test]
    fn dropped_subscriptions_are_pruned() {
        let channel = EventChannel::new();
        let sub = channel.subscribe();
        let _kept = channel.subscribe();
        assert_eq!(channel.subscriber_count(), 2);

        drop(sub);
        assert_eq!(channel.publish(1u8), 1);
        assert_eq!(channel.subscriber_count(), 1);
    }
}
