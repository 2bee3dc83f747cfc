//! Stale-inventory reaper
//!
//! Selects published products that have been out of stock for longer than the
//! staleness policy allows and force-deletes them one at a time. A failed
//! delete is logged and skipped; the item still matches on the next run.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::catalog::{CatalogStore, DeletionResult, ItemId, StaleItemFilter, StalenessPolicy};
use crate::Result;

pub struct Reaper {
    store: Arc<dyn CatalogStore>,
    policy: StalenessPolicy,
}

impl Reaper {
    pub fn new(store: Arc<dyn CatalogStore>, policy: StalenessPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> StalenessPolicy {
        self.policy
    }

    /// Same reaper and store, different threshold (for one-off manual runs)
    pub fn with_policy(&self, policy: StalenessPolicy) -> Self {
        Self {
            store: Arc::clone(&self.store),
            policy,
        }
    }

    pub async fn reap(&self) -> Result<DeletionResult> {
        self.reap_at(Utc::now()).await
    }

    /// Items that a run at `now` would delete
    pub async fn preview_at(&self, now: DateTime<Utc>) -> Result<Vec<ItemId>> {
        let filter = StaleItemFilter::out_of_stock_products(&self.policy, now);
        self.store.find_stale(&filter).await
    }

    pub async fn preview(&self) -> Result<Vec<ItemId>> {
        self.preview_at(Utc::now()).await
    }

    /// Run one scan-and-delete pass as of `now`
    pub async fn reap_at(&self, now: DateTime<Utc>) -> Result<DeletionResult> {
        let threshold_days = self.policy.threshold_days().get();
        let candidates = self.preview_at(now).await?;

        if candidates.is_empty() {
            debug!(threshold_days, "No stale out-of-stock products");
            return Ok(DeletionResult::default());
        }

        debug!(threshold_days, candidates = candidates.len(), "Deleting stale out-of-stock products");

        let mut result = DeletionResult::default();
        for id in candidates {
            match self.store.force_delete(id).await {
                Ok(true) => {
                    debug!(product_id = id, "Deleted out-of-stock product");
                    result.deleted.push(id);
                }
                Ok(false) => {
                    warn!(product_id = id, "Product vanished before it could be deleted");
                    result.failed.push(id);
                }
                Err(e) => {
                    warn!(product_id = id, error = %e, "Failed to delete out-of-stock product");
                    result.failed.push(id);
                }
            }
        }

        info!(
            threshold_days,
            deleted = result.deleted.len(),
            failed = result.failed.len(),
            "Reaped stale out-of-stock products"
        );

        Ok(result)
    }
}

impl std::fmt::Debug for Reaper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reaper").field("policy", &self.policy).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::num::NonZeroU32;

    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};

    use crate::catalog::{
        CatalogItem, ListQuery, MemoryCatalog, NewCatalogItem, PublishStatus, StockStatus,
    };
    use crate::Error;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn policy(days: u32) -> StalenessPolicy {
        StalenessPolicy::new(NonZeroU32::new(days).unwrap())
    }

    fn product(title: &str, stock: StockStatus, days_ago: i64) -> NewCatalogItem {
        NewCatalogItem::product(title, stock, now() - Duration::days(days_ago))
    }

    /// Scenario catalog: A stale, B recently out of stock, C in stock
    async fn abc_catalog() -> (Arc<MemoryCatalog>, ItemId, ItemId, ItemId) {
        let catalog = Arc::new(MemoryCatalog::new());
        let a = catalog.insert(product("A", StockStatus::OutOfStock, 130)).await;
        let b = catalog.insert(product("B", StockStatus::OutOfStock, 10)).await;
        let c = catalog.insert(product("C", StockStatus::InStock, 200)).await;
        (catalog, a, b, c)
    }

    #[tokio::test]
    async fn test_reap_selects_only_stale_item() {
        let (catalog, a, b, c) = abc_catalog().await;
        let reaper = Reaper::new(catalog.clone(), policy(120));

        let result = reaper.reap_at(now()).await.unwrap();

        assert_eq!(result.deleted, vec![a]);
        assert!(result.failed.is_empty());
        assert!(catalog.find_by_id(a).await.unwrap().is_none());
        assert!(catalog.find_by_id(b).await.unwrap().is_some());
        assert!(catalog.find_by_id(c).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_second_run_is_empty() {
        let (catalog, _, _, _) = abc_catalog().await;
        let reaper = Reaper::new(catalog.clone(), policy(120));

        reaper.reap_at(now()).await.unwrap();
        let second = reaper.reap_at(now()).await.unwrap();

        assert!(second.is_empty());
        assert!(second.failed.is_empty());
        assert_eq!(catalog.len().await, 2);
    }

    #[tokio::test]
    async fn test_unpublished_and_unmodified_edges_are_kept() {
        let catalog = Arc::new(MemoryCatalog::new());
        let draft = catalog
            .insert(product("Draft", StockStatus::OutOfStock, 300).with_status(PublishStatus::Draft))
            .await;
        let trashed = catalog.insert(product("Trashed", StockStatus::OutOfStock, 300)).await;
        catalog.trash(trashed).await.unwrap();
        let backorder = catalog.insert(product("Backorder", StockStatus::OnBackorder, 300)).await;
        let unknown = catalog
            .insert(product("Unknown", StockStatus::OutOfStock, 300).with_raw_last_modified("n/a"))
            .await;
        // Exactly at the cutoff is not older than the threshold
        let boundary = catalog.insert(product("Boundary", StockStatus::OutOfStock, 120)).await;

        let result = Reaper::new(catalog.clone(), policy(120)).reap_at(now()).await.unwrap();

        assert!(result.is_empty());
        for id in [draft, trashed, backorder, unknown, boundary] {
            assert!(catalog.find_by_id(id).await.unwrap().is_some());
        }
    }

    #[tokio::test]
    async fn test_every_stale_item_is_selected() {
        let catalog = Arc::new(MemoryCatalog::new());
        let mut expected = HashSet::new();
        for days in [121, 150, 365, 1000] {
            expected.insert(catalog.insert(product("old", StockStatus::OutOfStock, days)).await);
        }
        for days in [0, 1, 60, 119] {
            catalog.insert(product("fresh", StockStatus::OutOfStock, days)).await;
        }

        let reaper = Reaper::new(catalog.clone(), policy(120));
        let selected: HashSet<ItemId> = reaper.preview_at(now()).await.unwrap().into_iter().collect();
        assert_eq!(selected, expected);

        // Preview is a pure read
        assert_eq!(catalog.len().await, 8);

        let deleted: HashSet<ItemId> = reaper.reap_at(now()).await.unwrap().deleted.into_iter().collect();
        assert_eq!(deleted, expected);
    }

    #[tokio::test]
    async fn test_threshold_change_applies_to_next_run() {
        let (catalog, a, b, _) = abc_catalog().await;
        let reaper = Reaper::new(catalog.clone(), policy(120));

        assert_eq!(reaper.reap_at(now()).await.unwrap().deleted, vec![a]);
        let stricter = reaper.with_policy(policy(7));
        assert_eq!(stricter.reap_at(now()).await.unwrap().deleted, vec![b]);
    }

    /// Store whose delete fails for selected IDs and whose query can be broken
    struct FlakyStore {
        inner: MemoryCatalog,
        failing: HashSet<ItemId>,
        query_broken: bool,
    }

    #[async_trait]
    impl CatalogStore for FlakyStore {
        async fn find_stale(&self, filter: &StaleItemFilter) -> Result<Vec<ItemId>> {
            if self.query_broken {
                return Err(Error::Other("catalog unreachable".to_string()));
            }
            self.inner.find_stale(filter).await
        }

        async fn force_delete(&self, id: ItemId) -> Result<bool> {
            if self.failing.contains(&id) {
                return Err(Error::Other("storage unavailable".to_string()));
            }
            self.inner.force_delete(id).await
        }

        async fn find_by_id(&self, id: ItemId) -> Result<Option<CatalogItem>> {
            self.inner.find_by_id(id).await
        }

        async fn list_items(&self, query: &ListQuery) -> Result<Vec<CatalogItem>> {
            self.inner.list_items(query).await
        }
    }

    #[tokio::test]
    async fn test_delete_failure_does_not_abort_batch() {
        let inner = MemoryCatalog::new();
        let first = inner.insert(product("1", StockStatus::OutOfStock, 200)).await;
        let second = inner.insert(product("2", StockStatus::OutOfStock, 200)).await;
        let third = inner.insert(product("3", StockStatus::OutOfStock, 200)).await;

        let store = Arc::new(FlakyStore {
            inner,
            failing: HashSet::from([second]),
            query_broken: false,
        });
        let reaper = Reaper::new(store.clone(), policy(120));

        let result = reaper.reap_at(now()).await.unwrap();
        assert_eq!(result.deleted, vec![first, third]);
        assert_eq!(result.failed, vec![second]);

        // Still stale, so the next run picks it up again
        assert_eq!(reaper.preview_at(now()).await.unwrap(), vec![second]);
    }

    #[tokio::test]
    async fn test_query_failure_is_surfaced_without_deleting() {
        let inner = MemoryCatalog::new();
        let id = inner.insert(product("1", StockStatus::OutOfStock, 200)).await;
        let store = Arc::new(FlakyStore {
            inner,
            failing: HashSet::new(),
            query_broken: true,
        });

        let result = Reaper::new(store.clone(), policy(120)).reap_at(now()).await;
        assert!(result.is_err());
        assert!(store.find_by_id(id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_reap_against_sqlite_catalog() {
        use crate::storage::{Database, ItemRepository};

        let db = Arc::new(Database::new_in_memory().await.unwrap());
        let repo = ItemRepository::new(&db);
        let now = Utc::now();
        let a = repo
            .create(&NewCatalogItem::product("A", StockStatus::OutOfStock, now - Duration::days(130)))
            .await
            .unwrap();
        let b = repo
            .create(&NewCatalogItem::product("B", StockStatus::OutOfStock, now - Duration::days(10)))
            .await
            .unwrap();
        let c = repo
            .create(&NewCatalogItem::product("C", StockStatus::InStock, now - Duration::days(200)))
            .await
            .unwrap();

        let reaper = Reaper::new(db.clone(), policy(120));
        assert_eq!(reaper.reap().await.unwrap().deleted, vec![a]);
        assert!(reaper.reap().await.unwrap().is_empty());

        assert!(repo.find_by_id(a).await.unwrap().is_none());
        assert!(repo.find_by_id(b).await.unwrap().is_some());
        assert!(repo.find_by_id(c).await.unwrap().is_some());
    }
}
