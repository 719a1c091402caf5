use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Product, next_version};

/// The lifecycle transition an event announces.
///
/// Unknown kinds are preserved in [`EventKind::Other`] rather than failing
/// deserialization, so that the consumer can reject them explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    Created,
    Updated,
    Deleted,
    Other(String),
}

impl EventKind {
    /// Returns the wire representation.
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::Created => "CREATED",
            EventKind::Updated => "UPDATED",
            EventKind::Deleted => "DELETED",
            EventKind::Other(kind) => kind,
        }
    }

    /// True for the three kinds the catalog understands.
    pub fn is_known(&self) -> bool {
        !matches!(self, EventKind::Other(_))
    }
}

impl From<String> for EventKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "CREATED" => EventKind::Created,
            "UPDATED" => EventKind::Updated,
            "DELETED" => EventKind::Deleted,
            _ => EventKind::Other(value),
        }
    }
}

impl From<&str> for EventKind {
    fn from(value: &str) -> Self {
        EventKind::from(value.to_string())
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::Other(kind) => kind,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A product snapshot tagged with the lifecycle transition it announces.
///
/// Serializes to the flat envelope
/// `{"id", "name", "type", "version", "event"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductEvent {
    #[serde(flatten)]
    pub product: Product,

    pub event: EventKind,
}

impl ProductEvent {
    /// Wraps a product snapshot with an event kind, as-is.
    pub fn new(product: Product, event: impl Into<EventKind>) -> Self {
        Self {
            product,
            event: event.into(),
        }
    }

    /// The identifier of the product this event is about.
    pub fn product_id(&self) -> &str {
        &self.product.id
    }
}

/// Builds the event announcing `kind` for `product`.
///
/// An empty identifier is replaced with a fresh UUID and the version is
/// advanced with [`next_version`]. Nothing is stored or published here.
pub fn create_event(mut product: Product, kind: EventKind) -> ProductEvent {
    if product.has_empty_id() {
        product.id = Uuid::new_v4().to_string();
    }
    product.version = next_version(&product.version);

    ProductEvent {
        product,
        event: kind,
    }
}
