use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::{
    BusError, Result,
    transport::{Delivery, DeliveryFuture, InboundMessage, Record, Subscriber, Transport},
};

#[derive(Default)]
struct TopicState {
    next_offset: i64,
    subscribers: Vec<mpsc::UnboundedSender<InboundMessage>>,
}

#[derive(Default)]
struct BrokerState {
    topics: HashMap<String, TopicState>,
    fail_on_publish: bool,
}

/// In-process broker for tests and single-process deployments.
///
/// Each topic has a single partition with monotonically increasing offsets.
/// Every subscriber registered for a topic receives every message published
/// after it subscribed, in publish order.
#[derive(Clone, Default)]
pub struct InMemoryBroker {
    state: Arc<Mutex<BrokerState>>,
}

impl InMemoryBroker {
    /// Creates a broker with no topics.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, BrokerState> {
        // The state stays consistent even if a holder panicked mid-publish.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a subscriber for `topic`.
    pub fn subscribe(&self, topic: &str) -> InMemorySubscriber {
        let (tx, rx) = mpsc::unbounded_channel();
        self.state()
            .topics
            .entry(topic.to_string())
            .or_default()
            .subscribers
            .push(tx);
        InMemorySubscriber { rx }
    }

    /// Makes every subsequent publish fail until reset.
    pub fn set_fail_on_publish(&self, fail: bool) {
        self.state().fail_on_publish = fail;
    }

    /// Returns how many messages have been accepted on `topic`.
    pub fn published_count(&self, topic: &str) -> usize {
        self.state()
            .topics
            .get(topic)
            .map_or(0, |t| t.next_offset as usize)
    }

    fn append(&self, record: Record) -> Result<Delivery> {
        let mut state = self.state();

        if state.fail_on_publish {
            return Err(BusError::Delivery("broker unavailable".to_string()));
        }

        let topic = state.topics.entry(record.topic.clone()).or_default();
        let offset = topic.next_offset;
        topic.next_offset += 1;

        let message = InboundMessage {
            topic: record.topic,
            partition: 0,
            offset,
            key: record.key,
            payload: record.payload,
        };

        // Drop subscribers whose receiving half is gone.
        topic
            .subscribers
            .retain(|subscriber| subscriber.send(message.clone()).is_ok());

        Ok(Delivery {
            partition: 0,
            offset,
        })
    }
}

#[async_trait]
impl Transport for InMemoryBroker {
    fn send(&self, record: Record) -> DeliveryFuture {
        let outcome = self.append(record);
        Box::pin(std::future::ready(outcome))
    }
}

/// Subscription handle returned by [`InMemoryBroker::subscribe`].
pub struct InMemorySubscriber {
    rx: mpsc::UnboundedReceiver<InboundMessage>,
}

#[async_trait]
impl Subscriber for InMemorySubscriber {
    async fn recv(&mut self) -> Option<Result<InboundMessage>> {
        self.rx.recv().await.map(Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_in_publish_order() {
        let broker = InMemoryBroker::new();
        let mut subscriber = broker.subscribe("products");

        for i in 0..3u8 {
            broker
                .send(Record::new("products", vec![i]))
                .await
                .unwrap();
        }

        for i in 0..3u8 {
            let message = subscriber.recv().await.unwrap().unwrap();
            assert_eq!(message.payload, vec![i]);
            assert_eq!(message.offset, i as i64);
            assert_eq!(message.partition, 0);
        }
    }

    #[tokio::test]
    async fn enqueue_happens_before_the_future_is_polled() {
        let broker = InMemoryBroker::new();
        let mut subscriber = broker.subscribe("products");

        let first = broker.send(Record::new("products", vec![1]));
        let second = broker.send(Record::new("products", vec![2]));
        assert_eq!(broker.published_count("products"), 2);

        assert_eq!(second.await.unwrap().offset, 1);
        assert_eq!(first.await.unwrap().offset, 0);
        assert_eq!(subscriber.recv().await.unwrap().unwrap().payload, vec![1]);
    }

    #[tokio::test]
    async fn offsets_are_per_topic() {
        let broker = InMemoryBroker::new();
        let a = broker.send(Record::new("a", vec![])).await.unwrap();
        let b = broker.send(Record::new("b", vec![])).await.unwrap();
        let a2 = broker.send(Record::new("a", vec![])).await.unwrap();

        assert_eq!(a.offset, 0);
        assert_eq!(b.offset, 0);
        assert_eq!(a2.offset, 1);
        assert_eq!(broker.published_count("a"), 2);
        assert_eq!(broker.published_count("missing"), 0);
    }

    #[tokio::test]
    async fn every_subscriber_gets_a_copy() {
        let broker = InMemoryBroker::new();
        let mut first = broker.subscribe("products");
        let mut second = broker.subscribe("products");

        broker
            .send(Record::new("products", b"x".to_vec()).with_key("k"))
            .await
            .unwrap();

        let one = first.recv().await.unwrap().unwrap();
        let two = second.recv().await.unwrap().unwrap();
        assert_eq!(one, two);
        assert_eq!(one.key.as_deref(), Some(b"k".as_slice()));
    }

    #[tokio::test]
    async fn other_topics_are_not_delivered() {
        let broker = InMemoryBroker::new();
        let mut subscriber = broker.subscribe("products");

        broker.send(Record::new("orders", vec![1])).await.unwrap();
        broker.send(Record::new("products", vec![2])).await.unwrap();

        let message = subscriber.recv().await.unwrap().unwrap();
        assert_eq!(message.topic, "products");
        assert_eq!(message.payload, vec![2]);
    }

    #[tokio::test]
    async fn fail_on_publish_rejects_without_consuming_offsets() {
        let broker = InMemoryBroker::new();
        broker.set_fail_on_publish(true);

        let result = broker.send(Record::new("products", vec![])).await;
        assert!(matches!(result, Err(BusError::Delivery(_))));
        assert_eq!(broker.published_count("products"), 0);

        broker.set_fail_on_publish(false);
        assert!(broker.send(Record::new("products", vec![])).await.is_ok());
    }

    #[tokio::test]
    async fn dropped_subscriber_does_not_break_publishing() {
        let broker = InMemoryBroker::new();
        let subscriber = broker.subscribe("products");
        drop(subscriber);

        assert!(broker.send(Record::new("products", vec![])).await.is_ok());
    }
}
