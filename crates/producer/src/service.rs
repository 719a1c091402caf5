//! Product service providing the mutation API of the producer side.

use catalog::CatalogRepository;
use common::{EventKind, Product, ProductEvent, create_event};
use event_bus::{DeliveryStats, EventProducer, Transport};
use tokio::sync::Mutex;

use crate::Result;

/// Turns catalog mutation intents into published lifecycle events.
///
/// The service keeps its own registry of announced products. It is separate
/// from any consumer-side replica and only used to answer "does this product
/// exist" and "what was its last version". Mutations are serialized so that
/// events are published in the same order the registry saw them.
pub struct ProductService<T: Transport> {
    registry: CatalogRepository,
    producer: EventProducer<T>,
    write_lock: Mutex<()>,
}

impl<T: Transport + 'static> ProductService<T> {
    /// Creates a service with an empty registry.
    pub fn new(producer: EventProducer<T>) -> Self {
        Self::with_registry(producer, CatalogRepository::new())
    }

    /// Creates a service on top of an existing registry.
    pub fn with_registry(producer: EventProducer<T>, registry: CatalogRepository) -> Self {
        Self {
            registry,
            producer,
            write_lock: Mutex::new(()),
        }
    }

    /// Announces a new product.
    ///
    /// A missing ID is generated and the version advanced from whatever the
    /// request carried (`v1` when empty).
    #[tracing::instrument(skip(self, product), fields(id = %product.id))]
    pub async fn create(&self, product: Product) -> Result<Product> {
        let _guard = self.write_lock.lock().await;

        let event = create_event(product, EventKind::Created);
        self.registry.insert(event.product.clone()).await?;

        if let Err(error) = self.producer.publish(&event).await {
            self.registry.delete(event.product_id()).await?;
            return Err(error.into());
        }

        tracing::info!(id = %event.product.id, version = %event.product.version, "product created");
        Ok(event.product)
    }

    /// Replaces an existing product.
    ///
    /// The path ID takes precedence over any ID in the body, and the version
    /// is advanced from the last announced one.
    #[tracing::instrument(skip(self, product))]
    pub async fn update(&self, id: &str, product: Product) -> Result<Product> {
        let _guard = self.write_lock.lock().await;

        let current = self.registry.by_id(id).await?;
        let event = create_event(
            product.with_id(id).with_version(current.version.clone()),
            EventKind::Updated,
        );
        self.registry.insert_or_replace(event.product.clone()).await?;

        if let Err(error) = self.producer.publish(&event).await {
            self.registry.insert_or_replace(current).await?;
            return Err(error.into());
        }

        tracing::info!(version = %event.product.version, "product updated");
        Ok(event.product)
    }

    /// Removes a product and announces its deletion.
    ///
    /// Returns the snapshot carried by the `DELETED` event.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<Product> {
        let _guard = self.write_lock.lock().await;

        let removed = self.registry.delete(id).await?;
        let event: ProductEvent = create_event(removed.clone(), EventKind::Deleted);

        if let Err(error) = self.producer.publish(&event).await {
            self.registry.insert(removed).await?;
            return Err(error.into());
        }

        tracing::info!("product deleted");
        Ok(event.product)
    }

    /// Looks up an announced product.
    pub async fn get(&self, id: &str) -> Result<Product> {
        Ok(self.registry.by_id(id).await?)
    }

    /// Returns every announced product, ordered by ID.
    pub async fn list(&self) -> Vec<Product> {
        self.registry.list().await
    }

    /// The topic events are published to.
    pub fn topic(&self) -> &str {
        self.producer.topic()
    }

    /// Flushes outstanding events and releases the producer.
    pub async fn shutdown(self) -> Result<DeliveryStats> {
        Ok(self.producer.close().await?)
    }
}
