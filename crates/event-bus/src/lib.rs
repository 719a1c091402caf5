//! Publish/subscribe plumbing for product lifecycle events.
//!
//! - [`Transport`] and [`Subscriber`]: the two halves of a message transport
//! - [`InMemoryBroker`]: an in-process transport for tests and single-process runs
//! - [`EventProducer`]: serializes events, publishes them, and drains delivery
//!   reports on a background task
//! - `kafka` feature: [`KafkaTransport`] and [`KafkaSubscriber`] backed by librdkafka

pub mod config;
pub mod error;
#[cfg(feature = "kafka")]
pub mod kafka;
pub mod memory;
pub mod producer;
pub mod transport;

pub use config::{Acks, ConsumerConfig, DEFAULT_FLUSH_TIMEOUT, DEFAULT_TOPIC, ProducerConfig};
pub use error::{BusError, Result};
#[cfg(feature = "kafka")]
pub use kafka::{KafkaSubscriber, KafkaTransport};
pub use memory::{InMemoryBroker, InMemorySubscriber};
pub use producer::{DeliveryReport, DeliveryStats, EventProducer};
pub use transport::{Delivery, DeliveryFuture, InboundMessage, Record, Subscriber, Transport};
