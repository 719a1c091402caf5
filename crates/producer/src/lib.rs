//! Producer side of the product catalog.
//!
//! [`ProductService`] accepts create/update/delete intents, assigns versions,
//! and publishes the matching lifecycle event through an
//! [`EventProducer`](event_bus::EventProducer).

pub mod error;
pub mod service;

pub use error::{Result, ServiceError};
pub use service::ProductService;
