//! Connection Handle
//!
//! Explicitly owned client handle onto a store. Components receive a
//! `Connection` instead of reaching for a process-wide client.

use std::sync::Arc;

use bytes::Bytes;

use crate::config::Config;
use crate::engine::Engine;
use crate::error::Result;
use crate::keyspace::{Batch, Keyspace, Txn};
use crate::pubsub::Subscriber;

/// A named handle on a shared engine
#[derive(Clone)]
pub struct Connection {
    /// Shared storage engine
    engine: Arc<Engine>,

    /// Connection name for logging
    name: Arc<str>,
}

impl Connection {
    /// Open the store described by `config` and connect to it
    pub fn open(config: Config) -> Result<Self> {
        let name = config.connection_name.clone();
        let engine = Engine::open(config)?;
        tracing::debug!("Connection '{}' opened", name);
        Ok(Self::new(Arc::new(engine), name))
    }

    /// Connect to an in-memory store
    pub fn in_memory(name: impl Into<String>) -> Self {
        Self::new(Arc::new(Engine::in_memory()), name)
    }

    /// Wrap an already opened engine
    pub fn new(engine: Arc<Engine>, name: impl Into<String>) -> Self {
        Self {
            engine,
            name: Arc::from(name.into()),
        }
    }

    /// Another connection to the same store under a different name
    pub fn duplicate(&self, name: impl Into<String>) -> Self {
        Self::new(Arc::clone(&self.engine), name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    // =========================================================================
    // Store commands
    // =========================================================================

    pub fn read<R>(&self, f: impl FnOnce(&Keyspace) -> Result<R>) -> Result<R> {
        self.engine.read(f)
    }

    pub fn eval<R>(&self, f: impl FnOnce(&mut Txn<'_>) -> Result<R>) -> Result<R> {
        self.engine.eval(f)
    }

    pub fn exec(&self, batch: Batch) -> Result<Vec<i64>> {
        self.engine.exec(batch)
    }

    pub fn incr(&self, key: &str) -> Result<i64> {
        self.engine.incr(key)
    }

    pub fn publish(&self, channel: &str, payload: impl Into<Bytes>) -> usize {
        self.engine.publish(channel, payload)
    }

    /// Open a dedicated subscriber on this store
    pub fn subscriber(&self) -> Subscriber {
        tracing::debug!("Connection '{}' opening subscriber", self.name);
        self.engine.subscriber()
    }

    pub fn checkpoint(&self) -> Result<()> {
        self.engine.checkpoint()
    }

    /// Release this handle.
    ///
    /// The last handle closes the engine (checkpoint + sync); earlier
    /// handles only checkpoint.
    pub fn close(self) -> Result<()> {
        tracing::debug!("Connection '{}' closing", self.name);
        match Arc::try_unwrap(self.engine) {
            Ok(engine) => engine.close(),
            Err(shared) => shared.checkpoint(),
        }
    }
}
