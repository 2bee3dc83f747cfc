mod memory;
mod models;
mod query;
mod store;

pub use memory::MemoryCatalog;
pub use models::{
    format_timestamp, parse_timestamp, CatalogItem, DeletionResult, ItemId, ItemType,
    NewCatalogItem, PublishStatus, StaleItemFilter, StalenessPolicy, StockStatus,
    STOCK_STATUS_META_KEY, TIMESTAMP_FORMAT,
};
pub use query::{ListOrder, ListQuery, SortDirection};
pub use store::CatalogStore;
