use async_trait::async_trait;

use super::models::{CatalogItem, ItemId, StaleItemFilter};
use super::query::ListQuery;
use crate::Result;

/// Read/write port onto the host catalog
///
/// The reaper only depends on this trait, so the SQLite catalog and the
/// in-memory fake are interchangeable.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Identifiers of items matching the filter. Must not touch `last_modified`.
    async fn find_stale(&self, filter: &StaleItemFilter) -> Result<Vec<ItemId>>;

    /// Remove an item and its metadata outright, bypassing trash.
    /// Returns `false` when the item no longer exists.
    async fn force_delete(&self, id: ItemId) -> Result<bool>;

    async fn find_by_id(&self, id: ItemId) -> Result<Option<CatalogItem>>;

    async fn list_items(&self, query: &ListQuery) -> Result<Vec<CatalogItem>>;
}
