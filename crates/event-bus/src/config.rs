//! Producer and consumer settings.

use std::time::Duration;

use crate::{BusError, Result};

/// Topic that product lifecycle events are published to.
pub const DEFAULT_TOPIC: &str = "products";

/// Upper bound on the flush performed before a producer is released.
pub const DEFAULT_FLUSH_TIMEOUT: Duration = Duration::from_secs(15);

/// Acknowledgment policy requested from the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Acks {
    /// No acknowledgment.
    None,
    /// Leader acknowledgment only.
    Leader,
    /// Every in-sync replica must confirm.
    #[default]
    All,
}

impl Acks {
    /// Returns the value understood by Kafka's `acks` setting.
    pub fn as_str(&self) -> &'static str {
        match self {
            Acks::None => "0",
            Acks::Leader => "1",
            Acks::All => "all",
        }
    }
}

/// Settings for an [`EventProducer`](crate::EventProducer).
#[derive(Debug, Clone)]
pub struct ProducerConfig {
    pub bootstrap_servers: String,
    pub topic: String,
    pub acks: Acks,
    pub flush_timeout: Duration,
    /// Capacity of the bounded delivery report channel.
    pub report_buffer: usize,
}

impl ProducerConfig {
    /// Creates a configuration for `topic` with default settings.
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            ..Self::default()
        }
    }

    /// Sets the broker list.
    pub fn bootstrap_servers(mut self, servers: impl Into<String>) -> Self {
        self.bootstrap_servers = servers.into();
        self
    }

    /// Sets the flush deadline used when the producer is closed.
    pub fn flush_timeout(mut self, timeout: Duration) -> Self {
        self.flush_timeout = timeout;
        self
    }

    /// Sets the capacity of the delivery report channel.
    pub fn report_buffer(mut self, capacity: usize) -> Self {
        self.report_buffer = capacity;
        self
    }

    /// Checks the settings a producer cannot start without.
    pub fn validate(&self) -> Result<()> {
        if self.topic.trim().is_empty() {
            return Err(BusError::ProducerInit("topic must not be empty".to_string()));
        }
        if self.report_buffer == 0 {
            return Err(BusError::ProducerInit(
                "delivery report buffer must hold at least one report".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            bootstrap_servers: "localhost:9092".to_string(),
            topic: DEFAULT_TOPIC.to_string(),
            acks: Acks::All,
            flush_timeout: DEFAULT_FLUSH_TIMEOUT,
            report_buffer: 1024,
        }
    }
}

/// Settings for a transport subscriber.
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    pub bootstrap_servers: String,
    pub topic: String,
    pub group_id: String,
    /// Where to start when the group has no committed offset.
    pub auto_offset_reset: String,
}

impl ConsumerConfig {
    /// Creates a configuration for `topic` with default settings.
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            ..Self::default()
        }
    }
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            bootstrap_servers: "localhost:9092".to_string(),
            topic: DEFAULT_TOPIC.to_string(),
            group_id: "products-group".to_string(),
            auto_offset_reset: "earliest".to_string(),
        }
    }
}
