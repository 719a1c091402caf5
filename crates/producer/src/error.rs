//! Product service error types.

use catalog::CatalogError;
use event_bus::BusError;
use thiserror::Error;

/// Errors that can occur while handling a product mutation.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The producer-side registry rejected the mutation.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// The event could not be handed to the transport.
    #[error(transparent)]
    Bus(#[from] BusError),
}

impl ServiceError {
    /// True when the target product does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::Catalog(CatalogError::NotFound(_)))
    }
}

/// Result type for product service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;
