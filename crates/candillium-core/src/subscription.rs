//! Live-query plumbing shared by every `DataClient` implementation.
//!
//! A [`SubscriptionHub`] keeps one sender per live subscriber of a
//! collection. A [`Subscription`] is the subscriber side: it owns the
//! receiver and unregisters itself from the hub when dropped, so a handle
//! that goes out of scope on any path can never be pushed to again.

use std::collections::BTreeMap;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::error::SubscriptionError;
use crate::model::Collection;

/// One push: the full current result set, or the failure that replaced it.
pub type Push<T> = Result<Vec<T>, SubscriptionError>;

struct HubInner<T> {
    next_id: u64,
    senders: BTreeMap<u64, Sender<Push<T>>>,
}

pub struct SubscriptionHub<T> {
    collection: Collection,
    inner: Arc<Mutex<HubInner<T>>>,
}

impl<T> std::fmt::Debug for SubscriptionHub<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionHub")
            .field("collection", &self.collection)
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl<T> SubscriptionHub<T> {
    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().senders.len()
    }
}

impl<T: Clone> SubscriptionHub<T> {
    pub fn new(collection: Collection) -> Self {
        Self {
            collection,
            inner: Arc::new(Mutex::new(HubInner {
                next_id: 1,
                senders: BTreeMap::new(),
            })),
        }
    }

    pub fn subscribe(&self) -> Subscription<T> {
        let (tx, rx) = mpsc::channel();
        self.register(tx, rx)
    }

    /// Subscribes and queues `initial` for the new subscriber only.
    pub fn subscribe_with(&self, initial: Push<T>) -> Subscription<T> {
        let (tx, rx) = mpsc::channel();
        let _ = tx.send(initial);
        self.register(tx, rx)
    }

    fn register(&self, tx: Sender<Push<T>>, rx: Receiver<Push<T>>) -> Subscription<T> {
        let mut inner = self.inner.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.senders.insert(id, tx);
        debug!(
            collection = %self.collection,
            subscription = id,
            live = inner.senders.len(),
            "subscription acquired"
        );

        Subscription {
            id,
            collection: self.collection,
            receiver: rx,
            hub: Arc::downgrade(&self.inner),
        }
    }

    /// Delivers `push` to every live subscriber, pruning any whose receiver
    /// is already gone. Returns how many subscribers received it.
    pub fn publish(&self, push: Push<T>) -> usize {
        let mut inner = self.inner.lock();
        inner
            .senders
            .retain(|_, sender| sender.send(push.clone()).is_ok());
        trace!(
            collection = %self.collection,
            delivered = inner.senders.len(),
            ok = push.is_ok(),
            "published snapshot"
        );
        inner.senders.len()
    }
}

#[derive(Debug)]
pub struct Subscription<T> {
    id: u64,
    collection: Collection,
    receiver: Receiver<Push<T>>,
    hub: Weak<Mutex<HubInner<T>>>,
}

impl<T> Subscription<T> {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Next queued push, without blocking. A hub that has gone away reads
    /// as a closed subscription.
    pub fn try_next(&self) -> Option<Push<T>> {
        match self.receiver.try_recv() {
            Ok(push) => Some(push),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(SubscriptionError {
                collection: self.collection,
                message: "subscription closed by backend".to_string(),
            })),
        }
    }

    /// Drains the queue and keeps only the newest push. An error anywhere in
    /// the queue wins over snapshots queued after it.
    pub fn drain_latest(&self) -> Option<Push<T>> {
        let mut latest = None;
        while let Some(push) = self.try_next() {
            let failed = push.is_err();
            latest = Some(push);
            if failed {
                break;
            }
        }
        latest
    }

    pub fn unsubscribe(self) {}
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            let mut inner = hub.lock();
            inner.senders.remove(&self.id);
            debug!(
                collection = %self.collection,
                subscription = self.id,
                live = inner.senders.len(),
                "subscription released"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_reports_live_subscribers() {
        let hub: SubscriptionHub<u32> = SubscriptionHub::new(Collection::Todo);
        let _live = hub.subscribe();
        let rendered = format!("{hub:?}");
        assert!(rendered.contains("Todo"));
        assert!(rendered.contains("subscribers: 1"));
    }

    #[test]
    fn dropping_handle_unregisters() {
        let hub: SubscriptionHub<u32> = SubscriptionHub::new(Collection::Todo);
        let first = hub.subscribe();
        let second = hub.subscribe();
        assert_eq!(hub.subscriber_count(), 2);
        assert_ne!(first.id(), second.id());

        drop(first);
        assert_eq!(hub.subscriber_count(), 1);

        second.unsubscribe();
        assert_eq!(hub.subscriber_count(), 0);
        assert_eq!(hub.publish(Ok(vec![1])), 0);
    }

    #[test]
    fn initial_push_reaches_only_the_new_subscriber() {
        let hub = SubscriptionHub::new(Collection::Todo);
        let existing = hub.subscribe();
        let fresh = hub.subscribe_with(Ok(vec![7]));

        assert_eq!(fresh.try_next(), Some(Ok(vec![7])));
        assert_eq!(existing.try_next(), None);
    }

    #[test]
    fn drain_latest_keeps_newest_snapshot() {
        let hub = SubscriptionHub::new(Collection::Todo);
        let sub = hub.subscribe();
        hub.publish(Ok(vec![1]));
        hub.publish(Ok(vec![1, 2]));

        assert_eq!(sub.drain_latest(), Some(Ok(vec![1, 2])));
        assert_eq!(sub.drain_latest(), None);
    }

    #[test]
    fn drain_latest_stops_at_error() {
        let hub = SubscriptionHub::new(Collection::Todo);
        let sub = hub.subscribe();
        hub.publish(Ok(vec![1]));
        hub.publish(Err(SubscriptionError {
            collection: Collection::Todo,
            message: "boom".to_string(),
        }));
        hub.publish(Ok(vec![1, 2, 3]));

        assert!(matches!(sub.drain_latest(), Some(Err(_))));
    }

    #[test]
    fn dropped_hub_reads_as_closed() {
        let hub: SubscriptionHub<u32> = SubscriptionHub::new(Collection::Todo);
        let sub = hub.subscribe();
        drop(hub);

        let push = sub.try_next().expect("closed push");
        assert!(push.is_err());
    }
}
