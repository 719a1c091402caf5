use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;

use crate::Result;

/// A message to publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub topic: String,
    pub key: Option<Vec<u8>>,
    pub payload: Vec<u8>,
}

impl Record {
    /// Creates an unkeyed record for `topic`.
    pub fn new(topic: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            topic: topic.into(),
            key: None,
            payload,
        }
    }

    /// Sets the partitioning key.
    pub fn with_key(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.key = Some(key.into());
        self
    }
}

/// Where the transport placed an acknowledged message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    pub partition: i32,
    pub offset: i64,
}

/// A message pulled from a subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub key: Option<Vec<u8>>,
    pub payload: Vec<u8>,
}

/// Resolves once the transport has acknowledged (or given up on) a message.
pub type DeliveryFuture = Pin<Box<dyn Future<Output = Result<Delivery>> + Send>>;

/// The publishing side of a publish/subscribe transport.
///
/// Implementations must be thread-safe; a single transport is shared by every
/// in-flight publish of a producer.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Enqueues a record and returns a future for its acknowledgment.
    ///
    /// Enqueueing happens before this returns, so records sent one after the
    /// other keep their order within a partition.
    fn send(&self, record: Record) -> DeliveryFuture;

    /// Waits until messages buffered inside the transport are delivered,
    /// for at most `timeout`.
    async fn flush(&self, _timeout: Duration) -> Result<()> {
        Ok(())
    }
}

/// The receiving side of a publish/subscribe transport.
///
/// Messages of one partition are returned in publish order.
#[async_trait]
pub trait Subscriber: Send + Sync {
    /// Returns the next message, or `None` once the subscription has ended.
    async fn recv(&mut self) -> Option<Result<InboundMessage>>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn send(&self, record: Record) -> DeliveryFuture {
        (**self).send(record)
    }

    async fn flush(&self, timeout: Duration) -> Result<()> {
        (**self).flush(timeout).await
    }
}
