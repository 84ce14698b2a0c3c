//! Broker
//!
//! Store-side channel fan-out. Every subscriber connection owns one
//! unbounded crossbeam queue; the broker keeps, per channel, the senders of
//! the subscribers attached to it.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use crossbeam::channel::{unbounded, Receiver, Sender};
use parking_lot::RwLock;

/// A published message as seen by a subscriber
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub channel: String,
    pub payload: Bytes,
}

type SubscriberId = u64;

#[derive(Default)]
struct BrokerInner {
    /// channel → subscriber id → queue sender
    channels: RwLock<HashMap<String, HashMap<SubscriberId, Sender<Message>>>>,
    next_id: AtomicU64,
}

/// In-process pub/sub hub, cheap to clone
#[derive(Clone, Default)]
pub struct Broker {
    inner: Arc<BrokerInner>,
}

impl Broker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish to every subscriber of `channel`, returning how many received it
    pub fn publish(&self, channel: &str, payload: Bytes) -> usize {
        let channels = self.inner.channels.read();
        let Some(subscribers) = channels.get(channel) else {
            return 0;
        };

        subscribers
            .values()
            .filter(|sender| {
                sender
                    .send(Message {
                        channel: channel.to_string(),
                        payload: payload.clone(),
                    })
                    .is_ok()
            })
            .count()
    }

    /// Open a new subscriber with its own queue
    pub fn subscriber(&self) -> Subscriber {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let (sender, receiver) = unbounded();
        Subscriber {
            id,
            broker: self.clone(),
            sender,
            receiver,
            channels: BTreeSet::new(),
        }
    }

    /// Number of subscribers attached to `channel`
    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.inner.channels.read().get(channel).map_or(0, |s| s.len())
    }

    fn attach(&self, channel: &str, id: SubscriberId, sender: Sender<Message>) {
        self.inner
            .channels
            .write()
            .entry(channel.to_string())
            .or_default()
            .insert(id, sender);
    }

    fn detach(&self, channel: &str, id: SubscriberId) {
        let mut channels = self.inner.channels.write();
        if let Some(subscribers) = channels.get_mut(channel) {
            subscribers.remove(&id);
            if subscribers.is_empty() {
                channels.remove(channel);
            }
        }
    }
}

/// One subscriber connection: a queue plus the set of channels feeding it.
///
/// Dropping the subscriber detaches it from every channel; once the last
/// sender is gone the receiver reports disconnection.
pub struct Subscriber {
    id: SubscriberId,
    broker: Broker,
    sender: Sender<Message>,
    receiver: Receiver<Message>,
    channels: BTreeSet<String>,
}

impl Subscriber {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Attach to `channel`; returns false if already subscribed
    pub fn subscribe(&mut self, channel: &str) -> bool {
        if !self.channels.insert(channel.to_string()) {
            return false;
        }
        self.broker.attach(channel, self.id, self.sender.clone());
        true
    }

    /// Detach from `channel`; returns false if not subscribed
    pub fn unsubscribe(&mut self, channel: &str) -> bool {
        if !self.channels.remove(channel) {
            return false;
        }
        self.broker.detach(channel, self.id);
        true
    }

    pub fn unsubscribe_all(&mut self) {
        for channel in std::mem::take(&mut self.channels) {
            self.broker.detach(&channel, self.id);
        }
    }

    pub fn is_subscribed(&self, channel: &str) -> bool {
        self.channels.contains(channel)
    }

    pub fn channels(&self) -> impl Iterator<Item = &String> {
        self.channels.iter()
    }

    /// A handle on the queue, for a dispatch thread
    pub fn receiver(&self) -> Receiver<Message> {
        self.receiver.clone()
    }

    pub fn try_recv(&self) -> Option<Message> {
        self.receiver.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<Message> {
        self.receiver.recv_timeout(timeout).ok()
    }
}

impl Drop for Subscriber {
    fn drop(&mut self) {
        self.unsubscribe_all();
    }
}
