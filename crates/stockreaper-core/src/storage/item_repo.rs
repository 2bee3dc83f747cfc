use async_trait::async_trait;
use chrono::Utc;
use sqlx::FromRow;

use super::Database;
use crate::catalog::{
    format_timestamp, parse_timestamp, CatalogItem, CatalogStore, ItemId, ItemType, ListOrder,
    ListQuery, NewCatalogItem, PublishStatus, StaleItemFilter, StockStatus, STOCK_STATUS_META_KEY,
};
use crate::{Error, Result};

/// Repository for catalog items and their metadata
pub struct ItemRepository<'a> {
    db: &'a Database,
}

#[derive(FromRow)]
struct ItemRow {
    id: i64,
    title: String,
    item_type: String,
    status: String,
    last_modified: String,
    stock_status: Option<String>,
}

impl TryFrom<ItemRow> for CatalogItem {
    type Error = Error;

    fn try_from(row: ItemRow) -> Result<Self> {
        Ok(CatalogItem {
            id: row.id,
            title: row.title,
            item_type: ItemType::from(row.item_type),
            status: row.status.parse()?,
            stock_status: row.stock_status.as_deref().and_then(StockStatus::from_meta),
            last_modified: parse_timestamp(&row.last_modified),
        })
    }
}

const SELECT_ITEMS: &str = r#"
    SELECT i.id, i.title, i.item_type, i.status, i.last_modified, m.meta_value AS stock_status
    FROM items i
    LEFT JOIN item_meta m ON m.item_id = i.id AND m.meta_key = ?
"#;

impl<'a> ItemRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Insert an item together with its stock status metadata
    pub async fn create(&self, new_item: &NewCatalogItem) -> Result<ItemId> {
        let mut tx = self.db.pool().begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO items (title, item_type, status, last_modified)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&new_item.title)
        .bind(new_item.item_type.as_str())
        .bind(new_item.status.as_str())
        .bind(&new_item.last_modified)
        .execute(&mut *tx)
        .await?;

        let id = result.last_insert_rowid();

        if let Some(stock_status) = new_item.stock_status {
            sqlx::query("INSERT INTO item_meta (item_id, meta_key, meta_value) VALUES (?, ?, ?)")
                .bind(id)
                .bind(STOCK_STATUS_META_KEY)
                .bind(stock_status.as_str())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(id)
    }

    /// Change the stock status; like any write to the item this bumps `last_modified`
    pub async fn set_stock_status(&self, id: ItemId, stock_status: StockStatus) -> Result<()> {
        let mut tx = self.db.pool().begin().await?;

        let result = sqlx::query("UPDATE items SET last_modified = ? WHERE id = ?")
            .bind(format_timestamp(Utc::now()))
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::ItemNotFound(id));
        }

        sqlx::query(
            r#"
            INSERT INTO item_meta (item_id, meta_key, meta_value) VALUES (?, ?, ?)
            ON CONFLICT(item_id, meta_key) DO UPDATE SET meta_value = excluded.meta_value
            "#,
        )
        .bind(id)
        .bind(STOCK_STATUS_META_KEY)
        .bind(stock_status.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Move an item to the trash (recoverable soft delete)
    pub async fn trash(&self, id: ItemId) -> Result<bool> {
        let result = sqlx::query("UPDATE items SET status = ? WHERE id = ?")
            .bind(PublishStatus::Trash.as_str())
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Find an item by ID, trashed items included
    pub async fn find_by_id(&self, id: ItemId) -> Result<Option<CatalogItem>> {
        let query = format!("{SELECT_ITEMS} WHERE i.id = ?");
        let row: Option<ItemRow> = sqlx::query_as(&query)
            .bind(STOCK_STATUS_META_KEY)
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        row.map(CatalogItem::try_from).transpose()
    }

    /// IDs of items matching the stale filter
    ///
    /// `last_modified` may be stored in host format or RFC 3339, so the cutoff
    /// is applied to the parsed value rather than the raw text. Unreadable
    /// values never qualify.
    pub async fn find_stale(&self, filter: &StaleItemFilter) -> Result<Vec<ItemId>> {
        let rows: Vec<(i64, String)> = sqlx::query_as(
            r#"
            SELECT i.id, i.last_modified
            FROM items i
            JOIN item_meta m ON m.item_id = i.id
            WHERE i.item_type = ?
              AND i.status = ?
              AND m.meta_key = ?
              AND m.meta_value = ?
            ORDER BY i.id ASC
            "#,
        )
        .bind(filter.item_type.as_str())
        .bind(filter.status.as_str())
        .bind(STOCK_STATUS_META_KEY)
        .bind(filter.stock_status.as_str())
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows
            .into_iter()
            .filter(|(_, raw)| {
                parse_timestamp(raw).is_some_and(|modified| modified < filter.modified_before)
            })
            .map(|(id, _)| id)
            .collect())
    }

    /// Delete an item and its metadata permanently
    pub async fn force_delete(&self, id: ItemId) -> Result<bool> {
        let mut tx = self.db.pool().begin().await?;

        sqlx::query("DELETE FROM item_meta WHERE item_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM items WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    /// Admin listing; trashed items are hidden
    ///
    /// Raw `last_modified` text does not sort chronologically across formats,
    /// so that order is applied after parsing, the same way `MemoryCatalog` does.
    pub async fn list(&self, query: &ListQuery) -> Result<Vec<CatalogItem>> {
        let order_column = match query.order_by {
            ListOrder::Id | ListOrder::LastModified => "i.id",
            ListOrder::Title => "i.title",
        };
        let direction = query.direction.as_sql();

        let mut sql = format!("{SELECT_ITEMS} WHERE i.item_type = ? AND i.status != ?");
        if query.stock_status.is_some() {
            sql.push_str(" AND m.meta_value = ?");
        }
        sql.push_str(&format!(" ORDER BY {order_column} {direction}, i.id {direction}"));

        let mut q = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(STOCK_STATUS_META_KEY)
            .bind(query.item_type.as_str())
            .bind(PublishStatus::Trash.as_str());
        if let Some(stock_status) = query.stock_status {
            q = q.bind(stock_status.as_str());
        }

        let rows = q.fetch_all(self.db.pool()).await?;
        let mut items = rows
            .into_iter()
            .map(CatalogItem::try_from)
            .collect::<Result<Vec<_>>>()?;

        if query.order_by == ListOrder::LastModified {
            query.sort(&mut items);
        }
        Ok(items)
    }

    /// Get total item count
    pub async fn count(&self) -> Result<u64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM items")
            .fetch_one(self.db.pool())
            .await?;

        u64::try_from(count.0).map_err(|_| Error::Other(format!("Invalid item count: {}", count.0)))
    }
}

#[async_trait]
impl CatalogStore for Database {
    async fn find_stale(&self, filter: &StaleItemFilter) -> Result<Vec<ItemId>> {
        ItemRepository::new(self).find_stale(filter).await
    }

    async fn force_delete(&self, id: ItemId) -> Result<bool> {
        ItemRepository::new(self).force_delete(id).await
    }

    async fn find_by_id(&self, id: ItemId) -> Result<Option<CatalogItem>> {
        ItemRepository::new(self).find_by_id(id).await
    }

    async fn list_items(&self, query: &ListQuery) -> Result<Vec<CatalogItem>> {
        ItemRepository::new(self).list(query).await
    }
}
