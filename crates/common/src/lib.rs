//! Shared types for the product catalog pipeline.
//!
//! - [`Product`]: a catalog entry as seen on the wire and in the replica
//! - [`ProductEvent`] and [`EventKind`]: lifecycle events carrying a product snapshot
//! - [`ProductVersion`] and [`next_version`]: the `v<N>` version scheme
//! - [`create_event`]: builds an event ready to publish

pub mod error;
pub mod event;
pub mod types;
pub mod version;

pub use error::VersionError;
pub use event::{EventKind, ProductEvent, create_event};
pub use types::Product;
pub use version::{ProductVersion, next_version};
