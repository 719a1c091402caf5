//! Subscription loop feeding transport messages to the dispatcher.

use std::future::Future;

use common::ProductEvent;
use event_bus::{InboundMessage, Subscriber};

use crate::dispatcher::{Applied, EventDispatcher};
use crate::{CatalogError, Result};

/// Outcome counts of a consumer run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerStats {
    /// Events that mutated the catalog or were recognised as replays.
    pub applied: u64,
    /// Decoded events the dispatcher refused.
    pub rejected: u64,
    /// Payloads that could not be decoded.
    pub malformed: u64,
    /// Errors reported by the subscriber itself.
    pub receive_errors: u64,
}

/// Pulls messages from a subscription and applies them one at a time.
///
/// Messages are handled strictly in the order the subscriber yields them, so
/// the per-partition publish order is preserved for every product ID.
pub struct CatalogConsumer<S: Subscriber> {
    subscriber: S,
    dispatcher: EventDispatcher,
}

impl<S: Subscriber> CatalogConsumer<S> {
    /// Creates a consumer applying events from `subscriber` through `dispatcher`.
    pub fn new(subscriber: S, dispatcher: EventDispatcher) -> Self {
        Self {
            subscriber,
            dispatcher,
        }
    }

    /// Decodes and applies one message.
    pub async fn handle_message(&self, message: &InboundMessage) -> Result<Applied> {
        let event: ProductEvent = serde_json::from_slice(&message.payload)?;
        tracing::info!(
            id = %event.product.id,
            kind = %event.event,
            offset = message.offset,
            "received product event"
        );
        self.dispatcher.dispatch(&event).await
    }

    /// Consumes until the subscription ends or `shutdown` resolves.
    ///
    /// An event that is being applied when `shutdown` resolves is finished
    /// first; no new message is pulled afterwards.
    #[tracing::instrument(skip_all)]
    pub async fn run(mut self, shutdown: impl Future<Output = ()>) -> ConsumerStats {
        let mut stats = ConsumerStats::default();
        tokio::pin!(shutdown);

        loop {
            let next = tokio::select! {
                biased;
                () = &mut shutdown => {
                    tracing::info!("consumer received shutdown signal");
                    break;
                }
                next = self.subscriber.recv() => next,
            };

            let message = match next {
                Some(Ok(message)) => message,
                Some(Err(error)) => {
                    stats.receive_errors += 1;
                    tracing::error!(%error, "failed to receive message");
                    continue;
                }
                None => {
                    tracing::info!("subscription ended");
                    break;
                }
            };

            match self.handle_message(&message).await {
                Ok(applied) => {
                    stats.applied += 1;
                    metrics::counter!("catalog_events_applied").increment(1);
                    tracing::debug!(?applied, offset = message.offset, "event applied");
                }
                Err(CatalogError::Serialization(error)) => {
                    stats.malformed += 1;
                    metrics::counter!("catalog_events_malformed").increment(1);
                    tracing::warn!(%error, offset = message.offset, "skipping undecodable message");
                }
                Err(error) => {
                    stats.rejected += 1;
                    metrics::counter!("catalog_events_rejected").increment(1);
                    tracing::warn!(%error, offset = message.offset, "event rejected");
                }
            }
        }

        tracing::info!(
            applied = stats.applied,
            rejected = stats.rejected,
            malformed = stats.malformed,
            "consumer stopped"
        );
        stats
    }

    /// Consumes until the subscription ends.
    pub async fn run_until_closed(self) -> ConsumerStats {
        self.run(std::future::pending()).await
    }
}
