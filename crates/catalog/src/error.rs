//! Catalog error types.

use thiserror::Error;

/// Errors that can occur when querying or mutating the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No product is stored under the identifier.
    #[error("Product not found: {0}")]
    NotFound(String),

    /// The operation was given a blank identifier.
    #[error("Product identifier must not be empty")]
    EmptyIdentifier,

    /// A product with this identifier is already stored.
    #[error("Product already exists: {0}")]
    AlreadyExists(String),

    /// The event kind is not one the catalog can apply.
    #[error("Unrecognized event: {0}")]
    UnrecognizedEvent(String),

    /// An event payload could not be decoded.
    #[error("Event deserialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;
