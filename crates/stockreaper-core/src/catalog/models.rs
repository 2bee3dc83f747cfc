use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Host post ID of a catalog item
pub type ItemId = i64;

/// Metadata key holding the stock status of an item
pub const STOCK_STATUS_META_KEY: &str = "_stock_status";

/// Storage format of `last_modified`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Host post type of a catalog item
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum ItemType {
    Product,
    Variation,
    Other(String),
}

impl ItemType {
    pub fn as_str(&self) -> &str {
        match self {
            ItemType::Product => "product",
            ItemType::Variation => "product_variation",
            ItemType::Other(s) => s.as_str(),
        }
    }
}

impl From<String> for ItemType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "product" => ItemType::Product,
            "product_variation" => ItemType::Variation,
            _ => ItemType::Other(s),
        }
    }
}

impl From<ItemType> for String {
    fn from(t: ItemType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Publication status of a catalog item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishStatus {
    Publish,
    Draft,
    Pending,
    Private,
    Trash,
}

impl PublishStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublishStatus::Publish => "publish",
            PublishStatus::Draft => "draft",
            PublishStatus::Pending => "pending",
            PublishStatus::Private => "private",
            PublishStatus::Trash => "trash",
        }
    }
}

impl FromStr for PublishStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "publish" => Ok(PublishStatus::Publish),
            "draft" => Ok(PublishStatus::Draft),
            "pending" => Ok(PublishStatus::Pending),
            "private" => Ok(PublishStatus::Private),
            "trash" => Ok(PublishStatus::Trash),
            other => Err(crate::Error::Other(format!("Unknown publish status: {}", other))),
        }
    }
}

impl fmt::Display for PublishStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stock status stored under [`STOCK_STATUS_META_KEY`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StockStatus {
    #[serde(rename = "instock")]
    InStock,
    #[serde(rename = "outofstock")]
    OutOfStock,
    #[serde(rename = "onbackorder")]
    OnBackorder,
}

impl StockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::InStock => "instock",
            StockStatus::OutOfStock => "outofstock",
            StockStatus::OnBackorder => "onbackorder",
        }
    }

    /// Resolve a raw metadata value; unknown values yield `None`
    pub fn from_meta(value: &str) -> Option<Self> {
        match value.trim() {
            "instock" => Some(StockStatus::InStock),
            "outofstock" => Some(StockStatus::OutOfStock),
            "onbackorder" => Some(StockStatus::OnBackorder),
            _ => None,
        }
    }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A product (or other post) in the host catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: ItemId,
    pub title: String,
    pub item_type: ItemType,
    pub status: PublishStatus,
    /// `None` when the item carries no recognised stock status
    pub stock_status: Option<StockStatus>,
    /// `None` when the stored timestamp could not be parsed
    pub last_modified: Option<DateTime<Utc>>,
}

impl CatalogItem {
    pub fn is_out_of_stock(&self) -> bool {
        self.stock_status == Some(StockStatus::OutOfStock)
    }

    /// Whole days elapsed since `last_modified`, clamped at zero
    pub fn days_since_modified(&self, now: DateTime<Utc>) -> Option<i64> {
        self.last_modified
            .map(|modified| (now - modified).num_seconds().div_euclid(86_400).max(0))
    }
}

/// Data required to insert a catalog item
#[derive(Debug, Clone)]
pub struct NewCatalogItem {
    pub title: String,
    pub item_type: ItemType,
    pub status: PublishStatus,
    pub stock_status: Option<StockStatus>,
    /// Raw stored value, so callers can persist unparseable timestamps
    pub last_modified: String,
}

impl NewCatalogItem {
    pub fn product(title: impl Into<String>, stock_status: StockStatus, last_modified: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            item_type: ItemType::Product,
            status: PublishStatus::Publish,
            stock_status: Some(stock_status),
            last_modified: format_timestamp(last_modified),
        }
    }

    pub fn with_status(mut self, status: PublishStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_raw_last_modified(mut self, raw: impl Into<String>) -> Self {
        self.last_modified = raw.into();
        self
    }
}

/// How long an item may stay out of stock; fixed for one reaper run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StalenessPolicy {
    threshold_days: NonZeroU32,
}

impl StalenessPolicy {
    pub fn new(threshold_days: NonZeroU32) -> Self {
        Self { threshold_days }
    }

    pub fn threshold_days(&self) -> NonZeroU32 {
        self.threshold_days
    }

    /// Items modified strictly before this instant are stale
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(i64::from(self.threshold_days.get()))
    }
}

/// Structured read filter for stale candidates
#[derive(Debug, Clone, PartialEq)]
pub struct StaleItemFilter {
    pub item_type: ItemType,
    pub status: PublishStatus,
    pub stock_status: StockStatus,
    pub modified_before: DateTime<Utc>,
}

impl StaleItemFilter {
    /// Published products that are out of stock and older than the policy allows
    pub fn out_of_stock_products(policy: &StalenessPolicy, now: DateTime<Utc>) -> Self {
        Self {
            item_type: ItemType::Product,
            status: PublishStatus::Publish,
            stock_status: StockStatus::OutOfStock,
            modified_before: policy.cutoff(now),
        }
    }

    pub fn matches(&self, item: &CatalogItem) -> bool {
        item.item_type == self.item_type
            && item.status == self.status
            && item.stock_status == Some(self.stock_status)
            && item
                .last_modified
                .is_some_and(|modified| modified < self.modified_before)
    }
}

/// Outcome of one reaper run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionResult {
    /// Items removed, in deletion order
    pub deleted: Vec<ItemId>,
    /// Items that were selected but could not be removed
    pub failed: Vec<ItemId>,
}

impl DeletionResult {
    pub fn is_empty(&self) -> bool {
        self.deleted.is_empty()
    }

    pub fn deleted_count(&self) -> usize {
        self.deleted.len()
    }
}

pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a stored timestamp (host format or RFC 3339)
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
        })
}
