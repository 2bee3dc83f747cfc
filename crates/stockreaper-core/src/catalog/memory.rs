use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::models::{parse_timestamp, CatalogItem, ItemId, NewCatalogItem, PublishStatus, StaleItemFilter};
use super::query::ListQuery;
use super::store::CatalogStore;
use crate::{Error, Result};

/// In-memory catalog, used in tests and for dry experiments
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: ItemId,
    items: BTreeMap<ItemId, CatalogItem>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, new_item: NewCatalogItem) -> ItemId {
        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let id = inner.next_id;

        inner.items.insert(
            id,
            CatalogItem {
                id,
                title: new_item.title,
                item_type: new_item.item_type,
                status: new_item.status,
                stock_status: new_item.stock_status,
                last_modified: parse_timestamp(&new_item.last_modified),
            },
        );

        id
    }

    /// Soft delete: the item stays readable with status `trash`
    pub async fn trash(&self, id: ItemId) -> Result<()> {
        let mut inner = self.inner.write().await;
        let item = inner.items.get_mut(&id).ok_or(Error::ItemNotFound(id))?;
        item.status = PublishStatus::Trash;
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.items.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.items.is_empty()
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn find_stale(&self, filter: &StaleItemFilter) -> Result<Vec<ItemId>> {
        let inner = self.inner.read().await;
        Ok(inner
            .items
            .values()
            .filter(|item| filter.matches(item))
            .map(|item| item.id)
            .collect())
    }

    async fn force_delete(&self, id: ItemId) -> Result<bool> {
        Ok(self.inner.write().await.items.remove(&id).is_some())
    }

    async fn find_by_id(&self, id: ItemId) -> Result<Option<CatalogItem>> {
        Ok(self.inner.read().await.items.get(&id).cloned())
    }

    async fn list_items(&self, query: &ListQuery) -> Result<Vec<CatalogItem>> {
        let inner = self.inner.read().await;
        let mut items: Vec<CatalogItem> = inner
            .items
            .values()
            .filter(|item| item.status != PublishStatus::Trash && query.matches(item))
            .cloned()
            .collect();
        query.sort(&mut items);
        Ok(items)
    }
}
