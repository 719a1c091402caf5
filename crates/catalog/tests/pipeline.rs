//! Integration tests: EventProducer → InMemoryBroker → CatalogConsumer → CatalogRepository.

use std::time::Duration;

use catalog::{CatalogConsumer, CatalogError, CatalogRepository, ConsumerStats, EventDispatcher};
use common::{EventKind, Product, ProductEvent, create_event};
use event_bus::{EventProducer, InMemoryBroker, ProducerConfig};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Wires a producer and a running consumer through one in-memory broker.
async fn setup() -> (
    EventProducer<InMemoryBroker>,
    CatalogRepository,
    oneshot::Sender<()>,
    JoinHandle<ConsumerStats>,
) {
    let broker = InMemoryBroker::new();
    let subscriber = broker.subscribe("products");

    let repo = CatalogRepository::new();
    let consumer = CatalogConsumer::new(subscriber, EventDispatcher::new(repo.clone()));

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(consumer.run(async {
        let _ = stop_rx.await;
    }));

    let producer = EventProducer::new(broker, ProducerConfig::default()).unwrap();
    (producer, repo, stop_tx, handle)
}

/// Polls the replica until `predicate` holds or a second has passed.
async fn wait_until<F>(repo: &CatalogRepository, predicate: F) -> bool
where
    F: Fn(&[Product]) -> bool,
{
    for _ in 0..100 {
        if predicate(&repo.list().await) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

fn has(products: &[Product], id: &str) -> bool {
    products.iter().any(|p| p.id == id)
}

#[tokio::test]
async fn test_created_event_reaches_replica() {
    let (producer, repo, stop, handle) = setup().await;
    let pizza = Product::new("10", "Pizza", "food", "v1");

    producer
        .publish(&ProductEvent::new(pizza.clone(), EventKind::Created))
        .await
        .unwrap();

    assert!(wait_until(&repo, |p| has(p, "10")).await);
    assert_eq!(repo.by_id("10").await.unwrap(), pizza);

    producer.close().await.unwrap();
    stop.send(()).unwrap();
    let stats = handle.await.unwrap();
    assert_eq!(stats.applied, 1);
}

#[tokio::test]
async fn test_delete_after_create_removes_entry() {
    let (producer, repo, stop, handle) = setup().await;
    let pizza = Product::new("10", "Pizza", "food", "v1");

    producer
        .publish(&ProductEvent::new(pizza.clone(), EventKind::Created))
        .await
        .unwrap();
    assert!(wait_until(&repo, |p| has(p, "10")).await);

    producer
        .publish(&ProductEvent::new(pizza, EventKind::Deleted))
        .await
        .unwrap();
    producer.close().await.unwrap();

    assert!(wait_until(&repo, |p| p.is_empty()).await);
    assert!(matches!(
        repo.by_id("10").await,
        Err(CatalogError::NotFound(_))
    ));

    stop.send(()).unwrap();
    let stats = handle.await.unwrap();
    assert_eq!(stats.applied, 2);
}

#[tokio::test]
async fn test_lifecycle_with_version_bumps() {
    let (producer, repo, stop, handle) = setup().await;

    let created = create_event(Product::new("", "Soup", "food", ""), EventKind::Created);
    let id = created.product.id.clone();
    producer.publish(&created).await.unwrap();
    producer.flush(Duration::from_secs(1)).await.unwrap();

    assert_eq!(created.product.version, "v1");
    let updated = create_event(created.product.clone(), EventKind::Updated);
    producer.publish(&updated).await.unwrap();
    producer.close().await.unwrap();

    let bumped = |products: &[Product]| products.iter().any(|p| p.id == id && p.version == "v2");
    assert!(wait_until(&repo, bumped).await);

    stop.send(()).unwrap();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_rejected_events_do_not_stop_the_consumer() {
    let (producer, repo, stop, handle) = setup().await;

    producer
        .publish(&ProductEvent::new(
            Product::new("missing", "Ghost", "none", "v1"),
            EventKind::Deleted,
        ))
        .await
        .unwrap();
    producer
        .publish(&ProductEvent::new(
            Product::new("7", "Tea", "drink", "v1"),
            "ARCHIVED",
        ))
        .await
        .unwrap();
    producer
        .publish(&ProductEvent::new(
            Product::new("8", "Cake", "food", "v1"),
            EventKind::Created,
        ))
        .await
        .unwrap();
    producer.close().await.unwrap();

    assert!(wait_until(&repo, |p| has(p, "8")).await);
    assert_eq!(repo.len().await, 1);

    stop.send(()).unwrap();
    let stats = handle.await.unwrap();
    assert_eq!(stats.rejected, 2);
    assert_eq!(stats.applied, 1);
}
