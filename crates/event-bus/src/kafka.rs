//! Kafka transport backed by librdkafka.

use std::time::Duration;

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::Message;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;

use crate::config::{ConsumerConfig, ProducerConfig};
use crate::transport::{Delivery, DeliveryFuture, InboundMessage, Record, Subscriber, Transport};
use crate::{BusError, Result};

/// Publishes through a librdkafka `FutureProducer`.
#[derive(Clone)]
pub struct KafkaTransport {
    producer: FutureProducer,
}

impl KafkaTransport {
    /// Creates the underlying producer handle.
    pub fn new(config: &ProducerConfig) -> Result<Self> {
        config.validate()?;

        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.bootstrap_servers)
            .set("acks", config.acks.as_str())
            .create()
            .map_err(|e| BusError::ProducerInit(e.to_string()))?;

        Ok(Self { producer })
    }
}

#[async_trait]
impl Transport for KafkaTransport {
    fn send(&self, record: Record) -> DeliveryFuture {
        let mut future_record =
            FutureRecord::<[u8], [u8]>::to(&record.topic).payload(&record.payload);
        if let Some(key) = record.key.as_deref() {
            future_record = future_record.key(key);
        }

        // send_result enqueues synchronously, which keeps publish order.
        let error = match self.producer.send_result(future_record) {
            Ok(delivery) => {
                return Box::pin(async move {
                    match delivery.await {
                        Ok(Ok((partition, offset))) => Ok(Delivery { partition, offset }),
                        Ok(Err((error, _message))) => Err(BusError::Delivery(error.to_string())),
                        Err(_canceled) => Err(BusError::Delivery(
                            "producer dropped before acknowledging".to_string(),
                        )),
                    }
                });
            }
            Err((error, _record)) => BusError::Delivery(error.to_string()),
        };
        Box::pin(std::future::ready(Err(error)))
    }

    async fn flush(&self, timeout: Duration) -> Result<()> {
        let producer = self.producer.clone();
        tokio::task::spawn_blocking(move || producer.flush(Timeout::After(timeout)))
            .await
            .map_err(|e| BusError::Delivery(e.to_string()))?
            .map_err(|e| BusError::Delivery(e.to_string()))
    }
}

/// Receives through a librdkafka `StreamConsumer` subscribed to one topic.
pub struct KafkaSubscriber {
    consumer: StreamConsumer,
}

impl KafkaSubscriber {
    /// Creates the consumer and subscribes it to the configured topic.
    pub fn new(config: &ConsumerConfig) -> Result<Self> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("group.id", &config.group_id)
            .set("bootstrap.servers", &config.bootstrap_servers)
            .set("auto.offset.reset", &config.auto_offset_reset)
            .create()
            .map_err(|e| BusError::Receive(e.to_string()))?;

        consumer
            .subscribe(&[config.topic.as_str()])
            .map_err(|e| BusError::Receive(e.to_string()))?;

        Ok(Self { consumer })
    }
}

#[async_trait]
impl Subscriber for KafkaSubscriber {
    async fn recv(&mut self) -> Option<Result<InboundMessage>> {
        let message = match self.consumer.recv().await {
            Ok(message) => message,
            Err(error) => return Some(Err(BusError::Receive(error.to_string()))),
        };

        Some(Ok(InboundMessage {
            topic: message.topic().to_string(),
            partition: message.partition(),
            offset: message.offset(),
            key: message.key().map(<[u8]>::to_vec),
            payload: message.payload().map(<[u8]>::to_vec).unwrap_or_default(),
        }))
    }
}
