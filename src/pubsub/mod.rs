//! Pub/Sub Module
//!
//! Lightweight event relay between components sharing one store.
//!
//! ## Architecture
//! - `Broker` lives in the engine and fans payloads out per channel
//! - `Subscriber` is one dedicated subscriber connection with its own queue
//! - `PubSubRelay` multiplexes that connection across many logical
//!   channels, dispatching to one typed handler per channel on a
//!   dedicated thread
//!
//! ## Delivery
//! At-most-once, fire-and-forget. Payloads are JSON with no envelope;
//! messages for channels without a handler are dropped silently.

mod broker;
mod relay;

pub use broker::{Broker, Message, Subscriber};
pub use relay::{PubSubRelay, Topic};
