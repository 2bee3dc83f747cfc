use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::catalog::CatalogItem;
use crate::config::AdminConfig;

/// Internal key of the days-out-of-stock column
pub const DAYS_OUT_OF_STOCK: &str = "days_out_of_stock";

/// Shown for out-of-stock items whose modification time is unknown
pub const UNRESOLVED_PLACEHOLDER: &str = "N/A";

/// Shown for items that are not out of stock
pub const NEUTRAL_PLACEHOLDER: &str = "-";

/// Ordered display columns of the product listing: key and header label
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSet {
    columns: Vec<(String, String)>,
}

impl ColumnSet {
    /// The host's built-in product columns
    pub fn product_defaults() -> Self {
        let mut set = Self::default();
        set.insert("id", "ID");
        set.insert("name", "Name");
        set.insert("stock", "Stock");
        set.insert("modified", "Last modified");
        set
    }

    /// Add or relabel a column; new columns go last
    pub fn insert(&mut self, key: impl Into<String>, label: impl Into<String>) {
        let key = key.into();
        let label = label.into();
        match self.columns.iter_mut().find(|(k, _)| *k == key) {
            Some(existing) => existing.1 = label,
            None => self.columns.push((key, label)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns.iter().map(|(k, l)| (k.as_str(), l.as_str()))
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, l)| l.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Column key -> `orderby` value the listing accepts
pub type SortableColumns = BTreeMap<String, String>;

/// Renders the "days out of stock" admin column
#[derive(Debug, Clone)]
pub struct DaysOutOfStockColumn {
    label: String,
    day_singular: String,
    day_plural: String,
}

impl DaysOutOfStockColumn {
    pub fn new(config: &AdminConfig) -> Self {
        Self {
            label: config.column_label.clone(),
            day_singular: config.day_singular.clone(),
            day_plural: config.day_plural.clone(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn register_columns(&self, columns: &mut ColumnSet) {
        columns.insert(DAYS_OUT_OF_STOCK, self.label.clone());
    }

    pub fn register_sortable(&self, sortable: &mut SortableColumns) {
        sortable.insert(DAYS_OUT_OF_STOCK.to_string(), DAYS_OUT_OF_STOCK.to_string());
    }

    /// Per-row callback; `None` for columns this renderer does not own
    pub fn render_cell(&self, column: &str, item: &CatalogItem, now: DateTime<Utc>) -> Option<String> {
        (column == DAYS_OUT_OF_STOCK).then(|| self.render(item, now))
    }

    pub fn render(&self, item: &CatalogItem, now: DateTime<Utc>) -> String {
        if !item.is_out_of_stock() {
            return NEUTRAL_PLACEHOLDER.to_string();
        }

        match item.days_since_modified(now) {
            Some(days) => {
                let unit = if days == 1 { &self.day_singular } else { &self.day_plural };
                format!("{} {}", days, unit)
            }
            None => UNRESOLVED_PLACEHOLDER.to_string(),
        }
    }
}
