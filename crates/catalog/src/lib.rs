//! Consumer-side product catalog.
//!
//! - [`CatalogRepository`]: the in-memory, key-unique replica of current product state
//! - [`EventDispatcher`]: applies a lifecycle event to the repository
//! - [`CatalogConsumer`]: drains a transport subscription into the dispatcher

pub mod consumer;
pub mod dispatcher;
pub mod error;
pub mod repository;

pub use consumer::{CatalogConsumer, ConsumerStats};
pub use dispatcher::{Applied, EventDispatcher};
pub use error::{CatalogError, Result};
pub use repository::CatalogRepository;
