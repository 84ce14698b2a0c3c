//! Pub/Sub Relay
//!
//! One subscriber connection, many channels, one handler per channel.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::Receiver;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::connection::Connection;
use crate::error::{Result, SoundKvError};

use super::{Message, Subscriber};

/// Raw handler: receives the JSON payload bytes
type Handler = Arc<dyn Fn(&[u8]) + Send + Sync>;

type HandlerTable = Arc<Mutex<HashMap<String, Handler>>>;

/// A channel name bound to its payload type
pub struct Topic<T> {
    name: String,
    _payload: PhantomData<fn() -> T>,
}

impl<T> Topic<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            _payload: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<T> Clone for Topic<T> {
    fn clone(&self) -> Self {
        Self::new(self.name.clone())
    }
}

/// Channel multiplexer over a dedicated subscriber connection
pub struct PubSubRelay {
    /// Connection used for `send`
    publisher: Connection,

    /// Dedicated subscriber connection; `None` once closed
    subscriber: Mutex<Option<Subscriber>>,

    /// channel → handler, shared with the dispatch thread
    handlers: HandlerTable,

    /// Dispatch thread; exits when the subscriber is dropped
    dispatcher: Mutex<Option<JoinHandle<()>>>,

    name: String,
}

impl PubSubRelay {
    /// Create a relay with its own subscriber connection on the same store
    pub fn new(connection: &Connection) -> Result<Self> {
        let name = format!("{}:subscriber", connection.name());
        let subscriber = connection.duplicate(name.clone()).subscriber();
        let receiver = subscriber.receiver();

        let handlers: HandlerTable = Arc::new(Mutex::new(HashMap::new()));
        let thread_handlers = Arc::clone(&handlers);
        let thread_name = name.clone();

        let dispatcher = thread::Builder::new()
            .name("soundkv-relay".to_string())
            .spawn(move || dispatch_loop(&thread_name, receiver, thread_handlers))?;

        tracing::debug!("Relay '{}' started", name);

        Ok(Self {
            publisher: connection.clone(),
            subscriber: Mutex::new(Some(subscriber)),
            handlers,
            dispatcher: Mutex::new(Some(dispatcher)),
            name,
        })
    }

    /// Subscribe to `channel` and register `handler` for it.
    ///
    /// Replaces any handler already registered for the channel. Payloads
    /// that fail to decode as `T` are logged and dropped.
    pub fn on<T, F>(&self, channel: &str, handler: F) -> Result<()>
    where
        T: DeserializeOwned + 'static,
        F: Fn(T) + Send + Sync + 'static,
    {
        let channel_name = channel.to_string();
        let wrapped: Handler = Arc::new(move |payload: &[u8]| {
            match serde_json::from_slice::<T>(payload) {
                Ok(value) => handler(value),
                Err(e) => tracing::warn!(
                    "Dropping undecodable message on '{}': {}",
                    channel_name,
                    e
                ),
            }
        });

        let mut subscriber = self.subscriber.lock();
        let subscriber = subscriber.as_mut().ok_or_else(|| self.closed_error())?;

        // Handler first, so nothing that arrives right after subscribing is dropped
        let replaced = self
            .handlers
            .lock()
            .insert(channel.to_string(), wrapped)
            .is_some();
        subscriber.subscribe(channel);

        tracing::debug!(
            "Relay '{}' listening on '{}'{}",
            self.name,
            channel,
            if replaced { " (handler replaced)" } else { "" }
        );
        Ok(())
    }

    /// Typed variant of [`on`](Self::on)
    pub fn listen<T, F>(&self, topic: &Topic<T>, handler: F) -> Result<()>
    where
        T: DeserializeOwned + 'static,
        F: Fn(T) + Send + Sync + 'static,
    {
        self.on(topic.name(), handler)
    }

    /// Unsubscribe from `channel` and drop its handler.
    ///
    /// Returns whether a handler was registered.
    pub fn remove_listener(&self, channel: &str) -> Result<bool> {
        let mut subscriber = self.subscriber.lock();
        let subscriber = subscriber.as_mut().ok_or_else(|| self.closed_error())?;

        subscriber.unsubscribe(channel);
        let removed = self.handlers.lock().remove(channel).is_some();

        tracing::debug!("Relay '{}' stopped listening on '{}'", self.name, channel);
        Ok(removed)
    }

    /// Serialize `payload` as JSON and publish it on `channel`.
    ///
    /// Returns the number of subscriber connections that received it.
    pub fn send<T: Serialize + ?Sized>(&self, channel: &str, payload: &T) -> Result<usize> {
        let bytes = serde_json::to_vec(payload)?;
        Ok(self.publisher.publish(channel, bytes))
    }

    /// Typed variant of [`send`](Self::send)
    pub fn publish<T: Serialize>(&self, topic: &Topic<T>, payload: &T) -> Result<usize> {
        self.send(topic.name(), payload)
    }

    /// Channels with a registered handler, sorted
    pub fn channels(&self) -> Vec<String> {
        let mut channels: Vec<String> = self.handlers.lock().keys().cloned().collect();
        channels.sort();
        channels
    }

    pub fn is_closed(&self) -> bool {
        self.subscriber.lock().is_none()
    }

    /// Unsubscribe everything and stop the dispatch thread
    pub fn close(&self) -> Result<()> {
        // Dropping the subscriber drops the last queue sender
        drop(self.subscriber.lock().take());
        self.handlers.lock().clear();

        let Some(handle) = self.dispatcher.lock().take() else {
            return Ok(());
        };
        // A handler closing its own relay must not join itself
        if handle.thread().id() == thread::current().id() {
            return Ok(());
        }
        handle.join().map_err(|_| {
            SoundKvError::Disconnected(format!("relay '{}' dispatcher panicked", self.name))
        })
    }

    fn closed_error(&self) -> SoundKvError {
        SoundKvError::Disconnected(format!("relay '{}' is closed", self.name))
    }
}

impl Drop for PubSubRelay {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!("Error closing relay: {}", e);
        }
    }
}

fn dispatch_loop(name: &str, receiver: Receiver<Message>, handlers: HandlerTable) {
    for message in receiver.iter() {
        // Clone out of the table so the handler runs without the lock held
        let handler = handlers.lock().get(&message.channel).cloned();
        match handler {
            Some(handler) => handler(message.payload.as_ref()),
            None => tracing::trace!(
                "Relay '{}' dropping message on '{}': no handler",
                name,
                message.channel
            ),
        }
    }
    tracing::debug!("Relay '{}' dispatcher stopped", name);
}
