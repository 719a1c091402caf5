//! Event producer with an asynchronous delivery report side channel.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, mpsc};
use tokio::task::{JoinHandle, JoinSet};

use crate::config::ProducerConfig;
use crate::transport::{Delivery, Record, Transport};
use crate::{BusError, Result};

/// Outcome of one published message, as observed by the listener task.
#[derive(Debug, Clone)]
pub struct DeliveryReport {
    pub topic: String,
    pub key: Option<Vec<u8>>,
    pub payload: Vec<u8>,
    pub outcome: std::result::Result<Delivery, String>,
    pub reported_at: DateTime<Utc>,
}

impl DeliveryReport {
    /// True when the transport acknowledged the message.
    pub fn is_delivered(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Totals gathered by the listener over the producer's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryStats {
    pub delivered: u64,
    pub failed: u64,
}

/// Publishes serialized events to a single topic.
///
/// [`publish`](Self::publish) returns as soon as the message is handed to the
/// transport. Acknowledgments are drained by a dedicated listener task which
/// logs every outcome; they are never returned to the caller. Call
/// [`close`](Self::close) before shutdown to flush outstanding messages and
/// join the listener.
pub struct EventProducer<T: Transport> {
    transport: Arc<T>,
    config: ProducerConfig,
    reports: mpsc::Sender<DeliveryReport>,
    in_flight: Mutex<JoinSet<()>>,
    listener: JoinHandle<DeliveryStats>,
}

impl<T: Transport + 'static> EventProducer<T> {
    /// Creates a producer and starts its delivery report listener.
    ///
    /// Fails with [`BusError::ProducerInit`] when the configuration is unusable;
    /// no listener is started in that case.
    pub fn new(transport: T, config: ProducerConfig) -> Result<Self> {
        Self::with_observer(transport, config, |_| {})
    }

    /// Like [`new`](Self::new), additionally handing every report to `observer`
    /// after it has been logged.
    pub fn with_observer<F>(transport: T, config: ProducerConfig, observer: F) -> Result<Self>
    where
        F: Fn(&DeliveryReport) + Send + 'static,
    {
        config.validate()?;

        let (reports, rx) = mpsc::channel(config.report_buffer);
        let listener = tokio::spawn(drain_reports(rx, observer));

        tracing::info!(topic = %config.topic, acks = config.acks.as_str(), "event producer started");

        Ok(Self {
            transport: Arc::new(transport),
            config,
            reports,
            in_flight: Mutex::new(JoinSet::new()),
            listener,
        })
    }

    /// The topic every message is published to.
    pub fn topic(&self) -> &str {
        &self.config.topic
    }

    /// Serializes `event` and hands it to the transport without waiting for
    /// the acknowledgment.
    ///
    /// A serialization failure aborts only this publish attempt.
    pub async fn publish<E: Serialize + ?Sized>(&self, event: &E) -> Result<()> {
        let payload = serde_json::to_vec(event).inspect_err(|error| {
            tracing::error!(%error, topic = %self.config.topic, "failed to serialize event");
        })?;
        self.publish_record(Record::new(self.config.topic.clone(), payload))
            .await;
        Ok(())
    }

    /// Hands an already encoded record to the transport.
    ///
    /// The record is enqueued before this returns; only the wait for its
    /// acknowledgment runs in the background.
    pub async fn publish_record(&self, record: Record) {
        let topic = record.topic.clone();
        let key = record.key.clone();
        let payload = record.payload.clone();
        let delivery = self.transport.send(record);
        let reports = self.reports.clone();

        let mut in_flight = self.in_flight.lock().await;
        // Reap completed sends so the set does not grow without bound.
        while in_flight.try_join_next().is_some() {}

        in_flight.spawn(async move {
            let outcome = delivery.await.map_err(|e| e.to_string());
            let report = DeliveryReport {
                topic,
                key,
                payload,
                outcome,
                reported_at: Utc::now(),
            };
            // The listener only goes away after close(), which flushes first.
            let _ = reports.send(report).await;
        });

        metrics::counter!("producer_events_published").increment(1);
    }

    /// Number of publishes whose acknowledgment has not arrived yet.
    pub async fn in_flight(&self) -> usize {
        let mut in_flight = self.in_flight.lock().await;
        while in_flight.try_join_next().is_some() {}
        in_flight.len()
    }

    /// Waits for every outstanding publish to be acknowledged, for at most
    /// `timeout`. Messages still pending at the deadline are abandoned.
    pub async fn flush(&self, timeout: Duration) -> Result<()> {
        let mut pending = std::mem::take(&mut *self.in_flight.lock().await);

        let drained = tokio::time::timeout(timeout, async {
            while pending.join_next().await.is_some() {}
        })
        .await;

        if drained.is_err() {
            let remaining = pending.len();
            pending.abort_all();
            tracing::warn!(remaining, ?timeout, "flush deadline reached");
            return Err(BusError::FlushTimeout { remaining });
        }

        self.transport.flush(timeout).await
    }

    /// Flushes with the configured deadline, stops the listener and returns
    /// the delivery totals.
    pub async fn close(self) -> Result<DeliveryStats> {
        let flushed = self.flush(self.config.flush_timeout).await;

        drop(self.reports);
        drop(self.in_flight);
        let stats = self
            .listener
            .await
            .map_err(|e| BusError::Listener(e.to_string()))?;

        tracing::info!(
            delivered = stats.delivered,
            failed = stats.failed,
            "event producer closed"
        );
        flushed.map(|()| stats)
    }
}

async fn drain_reports<F>(mut rx: mpsc::Receiver<DeliveryReport>, observer: F) -> DeliveryStats
where
    F: Fn(&DeliveryReport),
{
    let mut stats = DeliveryStats::default();

    while let Some(report) = rx.recv().await {
        let key = report
            .key
            .as_deref()
            .map(String::from_utf8_lossy)
            .unwrap_or_default();
        let value = String::from_utf8_lossy(&report.payload);

        match &report.outcome {
            Ok(delivery) => {
                stats.delivered += 1;
                metrics::counter!("producer_deliveries_succeeded").increment(1);
                tracing::info!(
                    topic = %report.topic,
                    %key,
                    %value,
                    partition = delivery.partition,
                    offset = delivery.offset,
                    "produced event"
                );
            }
            Err(error) => {
                stats.failed += 1;
                metrics::counter!("producer_deliveries_failed").increment(1);
                tracing::error!(topic = %report.topic, %error, "failed to deliver message");
            }
        }

        observer(&report);
    }

    stats
}
