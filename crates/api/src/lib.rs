//! HTTP front ends for the product catalog.
//!
//! The producer router accepts mutations and publishes lifecycle events; the
//! consumer router exposes the replica kept in sync by those events. Both
//! carry health and Prometheus metrics endpoints.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use catalog::CatalogRepository;
use event_bus::Transport;
use metrics_exporter_prometheus::PrometheusHandle;
use producer::ProductService;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Creates the mutation API router.
pub fn producer_app<T: Transport + 'static>(
    service: Arc<ProductService<T>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let router = Router::new()
        .route(
            "/products",
            get(routes::products::list::<T>).post(routes::products::create::<T>),
        )
        .route(
            "/products/{id}",
            get(routes::products::get::<T>)
                .put(routes::products::update::<T>)
                .delete(routes::products::delete::<T>),
        )
        .with_state(service);

    with_observability(router, metrics_handle)
}

/// Creates the read API router over the replica.
pub fn consumer_app(repository: CatalogRepository, metrics_handle: PrometheusHandle) -> Router {
    let router = Router::new()
        .route("/product/{id}", get(routes::catalog::get))
        .route("/products", get(routes::catalog::list))
        .with_state(repository);

    with_observability(router, metrics_handle)
}

fn with_observability(router: Router, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    router
        .route("/health", get(routes::health::check))
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
