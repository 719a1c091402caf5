//! Catalog services entry point.

use std::sync::Arc;

use api::config::{Config, TransportKind};
use axum::Router;
use catalog::{CatalogConsumer, CatalogRepository, EventDispatcher};
use event_bus::{EventProducer, InMemoryBroker, Subscriber, Transport};
use metrics_exporter_prometheus::PrometheusHandle;
use producer::ProductService;
use tokio::signal;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

/// Resolves once the shutdown flag is raised.
async fn stopped(mut rx: watch::Receiver<bool>) {
    let _ = rx.wait_for(|stop| *stop).await;
}

#[tokio::main]
async fn main() {
    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Resolve configuration
    let config = Config::from_env();
    tracing::info!(
        role = ?config.role,
        transport = ?config.transport,
        topic = %config.topic,
        "starting catalog services"
    );

    // 4. Connect the transport and run the selected roles
    match config.transport {
        TransportKind::Memory => {
            let broker = InMemoryBroker::new();
            let subscriber = broker.subscribe(&config.topic);
            run(&config, Some(broker), Some(subscriber), metrics_handle).await;
        }
        TransportKind::Kafka => run_kafka(&config, metrics_handle).await,
    }

    tracing::info!("server shut down gracefully");
}

#[cfg(feature = "kafka")]
async fn run_kafka(config: &Config, metrics_handle: PrometheusHandle) {
    use event_bus::{KafkaSubscriber, KafkaTransport};

    let transport = config.role.runs_producer().then(|| {
        KafkaTransport::new(&config.producer_config()).expect("failed to create Kafka producer")
    });
    let subscriber = config.role.runs_consumer().then(|| {
        KafkaSubscriber::new(&config.consumer_config()).expect("failed to create Kafka consumer")
    });

    run(config, transport, subscriber, metrics_handle).await;
}

#[cfg(not(feature = "kafka"))]
async fn run_kafka(_config: &Config, _metrics_handle: PrometheusHandle) {
    tracing::error!("TRANSPORT=kafka requires a build with the `kafka` feature");
    std::process::exit(1);
}

/// Serves the producer and/or consumer side until a shutdown signal, then
/// flushes the producer and stops the consumer loop.
async fn run<T, S>(
    config: &Config,
    transport: Option<T>,
    subscriber: Option<S>,
    metrics_handle: PrometheusHandle,
) where
    T: Transport + 'static,
    S: Subscriber + 'static,
{
    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = stop_tx.send(true);
    });

    let mut servers = JoinSet::new();

    let consumer_task = subscriber.map(|subscriber| {
        let repository = CatalogRepository::new();
        let consumer = CatalogConsumer::new(subscriber, EventDispatcher::new(repository.clone()));
        let app = api::consumer_app(repository, metrics_handle.clone());
        servers.spawn(serve("consumer", config.consumer_addr(), app, stop_rx.clone()));
        tokio::spawn(consumer.run(stopped(stop_rx.clone())))
    });

    let service = transport.map(|transport| {
        let producer = EventProducer::new(transport, config.producer_config())
            .expect("failed to start event producer");
        let service = Arc::new(ProductService::new(producer));
        let app = api::producer_app(service.clone(), metrics_handle.clone());
        servers.spawn(serve("producer", config.producer_addr(), app, stop_rx.clone()));
        service
    });

    while let Some(result) = servers.join_next().await {
        if let Err(error) = result {
            tracing::error!(%error, "server task failed");
        }
    }

    if let Some(service) = service {
        match Arc::try_unwrap(service) {
            Ok(service) => match service.shutdown().await {
                Ok(stats) => tracing::info!(
                    delivered = stats.delivered,
                    failed = stats.failed,
                    "producer flushed"
                ),
                Err(error) => tracing::warn!(%error, "producer shutdown incomplete"),
            },
            Err(_) => tracing::warn!("producer still referenced at shutdown, skipping flush"),
        }
    }

    if let Some(task) = consumer_task {
        match task.await {
            Ok(stats) => tracing::info!(
                applied = stats.applied,
                rejected = stats.rejected,
                malformed = stats.malformed,
                "consumer stopped"
            ),
            Err(error) => tracing::error!(%error, "consumer task failed"),
        }
    }
}

async fn serve(name: &'static str, addr: String, app: Router, stop: watch::Receiver<bool>) {
    tracing::info!(service = name, %addr, "starting HTTP server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(stopped(stop))
        .await
        .expect("server error");
}
