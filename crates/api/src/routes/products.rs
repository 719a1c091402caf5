//! Mutation API: every successful request publishes one lifecycle event.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::Product;
use event_bus::Transport;
use producer::ProductService;
use serde::Serialize;

use crate::error::ApiError;

#[derive(Serialize)]
pub struct DeletedResponse {
    pub status: &'static str,
    pub product: Product,
}

/// POST /products: announce a new product.
#[tracing::instrument(skip(service, body))]
pub async fn create<T: Transport + 'static>(
    State(service): State<Arc<ProductService<T>>>,
    body: Result<Json<Product>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let Json(product) = body?;
    let created = service.create(product).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /products/{id}: replace an announced product.
#[tracing::instrument(skip(service, body))]
pub async fn update<T: Transport + 'static>(
    State(service): State<Arc<ProductService<T>>>,
    Path(id): Path<String>,
    body: Result<Json<Product>, JsonRejection>,
) -> Result<Json<Product>, ApiError> {
    let Json(product) = body?;
    let updated = service.update(&id, product).await?;
    Ok(Json(updated))
}

/// DELETE /products/{id}: withdraw an announced product.
#[tracing::instrument(skip(service))]
pub async fn delete<T: Transport + 'static>(
    State(service): State<Arc<ProductService<T>>>,
    Path(id): Path<String>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let product = service.delete(&id).await?;
    Ok(Json(DeletedResponse {
        status: "deleted",
        product,
    }))
}

/// GET /products/{id}: last announced state of a product.
pub async fn get<T: Transport + 'static>(
    State(service): State<Arc<ProductService<T>>>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    Ok(Json(service.get(&id).await?))
}

/// GET /products: every announced product.
pub async fn list<T: Transport + 'static>(
    State(service): State<Arc<ProductService<T>>>,
) -> Json<Vec<Product>> {
    Json(service.list().await)
}
