//! Applies lifecycle events to the catalog.

use common::{EventKind, ProductEvent};

use crate::repository::CatalogRepository;
use crate::{CatalogError, Result};

/// The mutation a successfully dispatched event caused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// A new entry was stored.
    Inserted,
    /// An existing entry was replaced.
    Replaced,
    /// An entry was removed.
    Deleted,
    /// The event was a replay of state already stored; nothing changed.
    Unchanged,
}

/// Routes events by kind to the matching repository operation.
///
/// Policy:
/// - `CREATED` inserts. If the ID is already stored, an identical snapshot is a
///   no-op (replay); a different one fails with [`CatalogError::AlreadyExists`]
///   and the stored entry is kept.
/// - `UPDATED` upserts: replaces the entry if present, inserts it otherwise.
/// - `DELETED` removes the entry; fails with [`CatalogError::NotFound`] if absent.
/// - Anything else fails with [`CatalogError::UnrecognizedEvent`].
///
/// A failed dispatch never modifies the repository.
#[derive(Clone)]
pub struct EventDispatcher {
    repository: CatalogRepository,
}

impl EventDispatcher {
    /// Creates a dispatcher writing into `repository`.
    pub fn new(repository: CatalogRepository) -> Self {
        Self { repository }
    }

    /// The repository this dispatcher writes into.
    pub fn repository(&self) -> &CatalogRepository {
        &self.repository
    }

    /// Applies a single event.
    #[tracing::instrument(
        skip(self, event),
        fields(id = %event.product.id, kind = %event.event)
    )]
    pub async fn dispatch(&self, event: &ProductEvent) -> Result<Applied> {
        let product = &event.product;

        match &event.event {
            EventKind::Created => match self.repository.insert(product.clone()).await {
                Ok(()) => Ok(Applied::Inserted),
                Err(CatalogError::AlreadyExists(id)) => {
                    // Compare against the stored entry to tell a replay from a conflict.
                    match self.repository.by_id(&id).await {
                        Ok(existing) if existing == *product => {
                            tracing::debug!("duplicate CREATED ignored");
                            Ok(Applied::Unchanged)
                        }
                        _ => Err(CatalogError::AlreadyExists(id)),
                    }
                }
                Err(other) => Err(other),
            },
            EventKind::Updated => {
                let previous = self.repository.insert_or_replace(product.clone()).await?;
                Ok(if previous.is_some() {
                    Applied::Replaced
                } else {
                    Applied::Inserted
                })
            }
            EventKind::Deleted => {
                self.repository.delete(&product.id).await?;
                Ok(Applied::Deleted)
            }
            EventKind::Other(kind) => Err(CatalogError::UnrecognizedEvent(kind.clone())),
        }
    }

    /// Decodes a wire envelope and applies it.
    pub async fn dispatch_payload(&self, payload: &[u8]) -> Result<Applied> {
        let event: ProductEvent = serde_json::from_slice(payload)?;
        self.dispatch(&event).await
    }
}
