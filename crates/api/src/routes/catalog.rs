//! Read API over the consumer-side replica.

use axum::Json;
use axum::extract::{Path, State};
use catalog::CatalogRepository;
use common::Product;

use crate::error::ApiError;

/// GET /product/{id}: current state of one product.
#[tracing::instrument(skip(repository))]
pub async fn get(
    State(repository): State<CatalogRepository>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let product = repository.by_id(&id).await?;
    Ok(Json(product))
}

/// GET /products: every replicated product, ordered by ID.
pub async fn list(State(repository): State<CatalogRepository>) -> Json<Vec<Product>> {
    Json(repository.list().await)
}
