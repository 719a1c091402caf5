//! Keyed in-memory product store.

use std::collections::HashMap;
use std::sync::Arc;

use common::Product;
use tokio::sync::RwLock;

use crate::{CatalogError, Result};

/// In-memory store of current product state, keyed by product ID.
///
/// Cloning yields another handle to the same store. Every operation takes the
/// lock once, so each call is atomic with respect to the others.
#[derive(Clone, Default)]
pub struct CatalogRepository {
    products: Arc<RwLock<HashMap<String, Product>>>,
}

impl CatalogRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository seeded with `products`.
    ///
    /// Entries with an empty ID are skipped; later duplicates replace earlier ones.
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let products = products
            .into_iter()
            .filter(|p| !p.id.is_empty())
            .map(|p| (p.id.clone(), p))
            .collect();
        Self {
            products: Arc::new(RwLock::new(products)),
        }
    }

    /// Looks up a product by ID.
    pub async fn by_id(&self, id: &str) -> Result<Product> {
        self.products
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))
    }

    /// Stores a product that is not present yet.
    pub async fn insert(&self, product: Product) -> Result<()> {
        if product.id.is_empty() {
            return Err(CatalogError::EmptyIdentifier);
        }

        let mut products = self.products.write().await;
        if products.contains_key(&product.id) {
            return Err(CatalogError::AlreadyExists(product.id));
        }
        products.insert(product.id.clone(), product);
        Ok(())
    }

    /// Stores a product, replacing any entry with the same ID.
    ///
    /// Returns the replaced entry, if there was one.
    pub async fn insert_or_replace(&self, product: Product) -> Result<Option<Product>> {
        if product.id.is_empty() {
            return Err(CatalogError::EmptyIdentifier);
        }

        Ok(self
            .products
            .write()
            .await
            .insert(product.id.clone(), product))
    }

    /// Removes a product by ID, returning the removed entry.
    pub async fn delete(&self, id: &str) -> Result<Product> {
        if id.is_empty() {
            return Err(CatalogError::EmptyIdentifier);
        }

        self.products
            .write()
            .await
            .remove(id)
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))
    }

    /// Returns every stored product, ordered by ID.
    pub async fn list(&self) -> Vec<Product> {
        let mut products: Vec<_> = self.products.read().await.values().cloned().collect();
        products.sort_by(|a, b| a.id.cmp(&b.id));
        products
    }

    /// Returns the number of stored products.
    pub async fn len(&self) -> usize {
        self.products.read().await.len()
    }

    /// True when nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.products.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pizza() -> Product {
        Product::new("10", "Pizza", "food", "v1")
    }

    #[tokio::test]
    async fn insert_then_lookup_returns_equal_value() {
        let repo = CatalogRepository::new();
        repo.insert(pizza()).await.unwrap();

        assert_eq!(repo.by_id("10").await.unwrap(), pizza());
    }

    #[tokio::test]
    async fn lookup_missing_is_not_found() {
        let repo = CatalogRepository::new();
        assert!(matches!(
            repo.by_id("nope").await,
            Err(CatalogError::NotFound(id)) if id == "nope"
        ));
    }

    #[tokio::test]
    async fn delete_after_insert_then_lookup_is_not_found() {
        let repo = CatalogRepository::new();
        repo.insert(pizza()).await.unwrap();

        let removed = repo.delete("10").await.unwrap();
        assert_eq!(removed, pizza());
        assert!(matches!(
            repo.by_id("10").await,
            Err(CatalogError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn insert_with_empty_id_is_rejected_regardless_of_contents() {
        let empty = CatalogRepository::new();
        let seeded = CatalogRepository::with_products([pizza()]);

        for repo in [empty, seeded] {
            let before = repo.len().await;
            let result = repo.insert(pizza().with_id("")).await;
            assert!(matches!(result, Err(CatalogError::EmptyIdentifier)));
            assert_eq!(repo.len().await, before);
        }
    }

    #[tokio::test]
    async fn duplicate_insert_leaves_existing_entry_unchanged() {
        let repo = CatalogRepository::new();
        repo.insert(pizza()).await.unwrap();

        let impostor = Product::new("10", "Pasta", "food", "v9");
        let result = repo.insert(impostor).await;

        assert!(matches!(result, Err(CatalogError::AlreadyExists(id)) if id == "10"));
        assert_eq!(repo.by_id("10").await.unwrap(), pizza());
    }

    #[tokio::test]
    async fn delete_with_empty_id_is_rejected() {
        let repo = CatalogRepository::new();
        assert!(matches!(
            repo.delete("").await,
            Err(CatalogError::EmptyIdentifier)
        ));
    }

    #[tokio::test]
    async fn delete_missing_is_not_found() {
        let repo = CatalogRepository::new();
        assert!(matches!(
            repo.delete("10").await,
            Err(CatalogError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn insert_or_replace_returns_previous_entry() {
        let repo = CatalogRepository::new();
        assert_eq!(repo.insert_or_replace(pizza()).await.unwrap(), None);

        let renamed = pizza().with_version("v2");
        let previous = repo.insert_or_replace(renamed.clone()).await.unwrap();

        assert_eq!(previous, Some(pizza()));
        assert_eq!(repo.by_id("10").await.unwrap(), renamed);
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn seed_skips_blank_ids() {
        let repo = CatalogRepository::with_products([pizza(), pizza().with_id("")]);
        assert_eq!(repo.len().await, 1);
        assert_eq!(repo.list().await, vec![pizza()]);
    }

    #[tokio::test]
    async fn list_is_sorted_by_id() {
        let repo = CatalogRepository::new();
        repo.insert(Product::new("b", "B", "t", "v1")).await.unwrap();
        repo.insert(Product::new("a", "A", "t", "v1")).await.unwrap();

        let ids: Vec<_> = repo.list().await.into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_inserts_keep_keys_unique() {
        let repo = CatalogRepository::new();

        let mut handles = Vec::new();
        for worker in 0..8 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                let mut inserted = 0;
                for i in 0..50 {
                    let product = Product::new(format!("p-{i}"), format!("w{worker}"), "t", "v1");
                    if repo.insert(product).await.is_ok() {
                        inserted += 1;
                    }
                }
                inserted
            }));
        }

        let mut total = 0;
        for handle in handles {
            total += handle.await.unwrap();
        }

        // Each of the 50 keys is won by exactly one worker.
        assert_eq!(total, 50);
        assert_eq!(repo.len().await, 50);
    }
}
