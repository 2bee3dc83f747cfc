//! One-time wiring of the reaper, the admin column and the job registry
//!
//! Everything the add-on contributes to the host is registered here, at
//! startup, against an explicitly injected catalog store.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::admin::{self, ColumnSet, DaysOutOfStockColumn, ListRequest, SortableColumns};
use crate::catalog::{CatalogItem, CatalogStore, ListQuery};
use crate::config::AppConfig;
use crate::reaper::Reaper;
use crate::scheduler::SchedulerService;
use crate::storage::{Database, JobRepository, ScheduledJob};
use crate::Result;

/// One rendered row of the admin product listing
#[derive(Debug, Clone, PartialEq)]
pub struct ListingRow {
    pub item: CatalogItem,
    /// Cell text per column key, in column order
    pub cells: Vec<(String, String)>,
}

/// Admin listing after the sort rewrite
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub query: ListQuery,
    pub columns: ColumnSet,
    pub rows: Vec<ListingRow>,
}

pub struct Extension {
    db: Arc<Database>,
    store: Arc<dyn CatalogStore>,
    config: Arc<AppConfig>,
    reaper: Reaper,
    column: DaysOutOfStockColumn,
}

impl Extension {
    /// Wire the extension against the SQLite catalog
    pub fn new(db: Arc<Database>, config: Arc<AppConfig>) -> Result<Self> {
        let store: Arc<dyn CatalogStore> = db.clone();
        Self::with_store(db, store, config)
    }

    /// Wire the extension against any catalog store; the database only keeps the job registry
    pub fn with_store(
        db: Arc<Database>,
        store: Arc<dyn CatalogStore>,
        config: Arc<AppConfig>,
    ) -> Result<Self> {
        let reaper = Reaper::new(Arc::clone(&store), config.reaper.policy()?);
        let column = DaysOutOfStockColumn::new(&config.admin);

        Ok(Self {
            db,
            store,
            config,
            reaper,
            column,
        })
    }

    pub fn reaper(&self) -> &Reaper {
        &self.reaper
    }

    pub fn column(&self) -> &DaysOutOfStockColumn {
        &self.column
    }

    pub fn job_name(&self) -> &str {
        &self.config.reaper.job_name
    }

    /// Activation hook: schedule the daily reaper job unless it already is
    pub async fn activate(&self) -> Result<bool> {
        self.activate_at(Utc::now()).await
    }

    pub async fn activate_at(&self, now: DateTime<Utc>) -> Result<bool> {
        let scheduled = JobRepository::new(&self.db)
            .schedule(self.job_name(), self.config.reaper.interval(), now)
            .await?;

        if scheduled {
            tracing::info!("Scheduled job '{}'", self.job_name());
        }
        Ok(scheduled)
    }

    /// Deactivation hook: drop the scheduled job
    pub async fn deactivate(&self) -> Result<bool> {
        let cleared = JobRepository::new(&self.db).clear(self.job_name()).await?;

        if cleared {
            tracing::info!("Unscheduled job '{}'", self.job_name());
        }
        Ok(cleared)
    }

    pub async fn scheduled_job(&self) -> Result<Option<ScheduledJob>> {
        JobRepository::new(&self.db).find(self.job_name()).await
    }

    /// Background scheduler sharing this extension's store and config
    pub fn scheduler(&self) -> Result<SchedulerService> {
        SchedulerService::new(
            Arc::clone(&self.db),
            Arc::clone(&self.store),
            Arc::clone(&self.config),
        )
    }

    pub fn admin_columns(&self) -> ColumnSet {
        let mut columns = ColumnSet::product_defaults();
        self.column.register_columns(&mut columns);
        columns
    }

    pub fn sortable_columns(&self) -> SortableColumns {
        let mut sortable = SortableColumns::new();
        sortable.insert("name".to_string(), "title".to_string());
        sortable.insert("modified".to_string(), "modified".to_string());
        self.column.register_sortable(&mut sortable);
        sortable
    }

    pub async fn list(&self, request: &ListRequest) -> Result<Listing> {
        self.list_at(request, Utc::now()).await
    }

    /// Run the rewritten listing query and render every cell
    pub async fn list_at(&self, request: &ListRequest, now: DateTime<Utc>) -> Result<Listing> {
        let query = admin::rewrite(request);
        let columns = self.admin_columns();
        let items = self.store.list_items(&query).await?;

        let rows = items
            .into_iter()
            .map(|item| {
                let cells = columns
                    .iter()
                    .map(|(key, _)| (key.to_string(), self.cell(key, &item, now)))
                    .collect();
                ListingRow { item, cells }
            })
            .collect();

        Ok(Listing {
            query,
            columns,
            rows,
        })
    }

    fn cell(&self, key: &str, item: &CatalogItem, now: DateTime<Utc>) -> String {
        if let Some(rendered) = self.column.render_cell(key, item, now) {
            return rendered;
        }

        match key {
            "id" => item.id.to_string(),
            "name" => item.title.clone(),
            "stock" => item
                .stock_status
                .map(|s| s.to_string())
                .unwrap_or_else(|| admin::NEUTRAL_PLACEHOLDER.to_string()),
            "modified" => item
                .last_modified
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| admin::UNRESOLVED_PLACEHOLDER.to_string()),
            _ => String::new(),
        }
    }
}

impl std::fmt::Debug for Extension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extension")
            .field("job", &self.config.reaper.job_name)
            .field("reaper", &self.reaper)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::DAYS_OUT_OF_STOCK;
    use crate::catalog::{ItemId, MemoryCatalog, NewCatalogItem, StockStatus};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    async fn extension() -> (Extension, Arc<MemoryCatalog>) {
        let db = Arc::new(Database::new_in_memory().await.unwrap());
        let catalog = Arc::new(MemoryCatalog::new());
        let ext = Extension::with_store(db, catalog.clone(), Arc::new(AppConfig::default())).unwrap();
        (ext, catalog)
    }

    #[tokio::test]
    async fn test_activate_and_deactivate() {
        let (ext, _) = extension().await;

        assert!(ext.activate_at(now()).await.unwrap());
        assert!(!ext.activate_at(now() + Duration::hours(1)).await.unwrap());

        let job = ext.scheduled_job().await.unwrap().unwrap();
        assert_eq!(job.name, "delete_old_oos_products");
        assert_eq!(job.interval_secs, 86400);
        assert_eq!(job.next_run_at, now());

        assert!(ext.deactivate().await.unwrap());
        assert!(ext.scheduled_job().await.unwrap().is_none());
        assert!(!ext.deactivate().await.unwrap());
    }

    #[tokio::test]
    async fn test_zero_threshold_fails_wiring() {
        let db = Arc::new(Database::new_in_memory().await.unwrap());
        let mut config = AppConfig::default();
        config.reaper.threshold_days = 0;

        assert!(Extension::new(db, Arc::new(config)).is_err());
    }

    #[tokio::test]
    async fn test_columns_and_sortables_are_registered() {
        let (ext, _) = extension().await;

        assert_eq!(ext.admin_columns().label(DAYS_OUT_OF_STOCK), Some("Days out of stock"));
        assert_eq!(
            ext.sortable_columns().get(DAYS_OUT_OF_STOCK).map(String::as_str),
            Some(DAYS_OUT_OF_STOCK)
        );
    }

    #[tokio::test]
    async fn test_listing_sorted_by_days_out_of_stock() {
        let (ext, catalog) = extension().await;
        let insert = |title: &'static str, stock, days| {
            let catalog = catalog.clone();
            async move {
                catalog
                    .insert(NewCatalogItem::product(title, stock, now() - Duration::days(days)))
                    .await
            }
        };

        let a = insert("A", StockStatus::OutOfStock, 130).await;
        let b = insert("B", StockStatus::OutOfStock, 10).await;
        insert("C", StockStatus::InStock, 200).await;

        let listing = ext
            .list_at(
                &ListRequest::admin(Some(DAYS_OUT_OF_STOCK.to_string()), Some("desc".to_string())),
                now(),
            )
            .await
            .unwrap();

        let ids: Vec<ItemId> = listing.rows.iter().map(|r| r.item.id).collect();
        assert_eq!(ids, vec![a, b]);

        let days: Vec<&str> = listing
            .rows
            .iter()
            .map(|r| {
                r.cells
                    .iter()
                    .find(|(k, _)| k == DAYS_OUT_OF_STOCK)
                    .map(|(_, v)| v.as_str())
                    .unwrap()
            })
            .collect();
        assert_eq!(days, vec!["130 days", "10 days"]);
    }

    #[tokio::test]
    async fn test_default_listing_shows_placeholders() {
        let (ext, catalog) = extension().await;
        catalog
            .insert(NewCatalogItem::product("In", StockStatus::InStock, now()))
            .await;
        catalog
            .insert(
                NewCatalogItem::product("Broken", StockStatus::OutOfStock, now())
                    .with_raw_last_modified("garbage"),
            )
            .await;

        let listing = ext.list_at(&ListRequest::admin(None, None), now()).await.unwrap();
        assert_eq!(listing.rows.len(), 2);

        let by_title = |title: &str| {
            listing
                .rows
                .iter()
                .find(|r| r.item.title == title)
                .and_then(|r| r.cells.iter().find(|(k, _)| k == DAYS_OUT_OF_STOCK))
                .map(|(_, v)| v.clone())
        };
        assert_eq!(by_title("In").as_deref(), Some("-"));
        assert_eq!(by_title("Broken").as_deref(), Some("N/A"));
    }

    #[tokio::test]
    async fn test_manual_reap_through_extension() {
        let (ext, catalog) = extension().await;
        let a = catalog
            .insert(NewCatalogItem::product("A", StockStatus::OutOfStock, now() - Duration::days(130)))
            .await;

        assert_eq!(ext.reaper().reap_at(now()).await.unwrap().deleted, vec![a]);
        assert!(ext.reaper().reap_at(now()).await.unwrap().is_empty());
    }
}
