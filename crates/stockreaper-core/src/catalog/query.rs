use std::cmp::Ordering;

use super::models::{CatalogItem, ItemType, StockStatus};

/// Sort key of an admin listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListOrder {
    #[default]
    Id,
    Title,
    LastModified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Query behind the admin product listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub item_type: ItemType,
    /// Restrict to items carrying this stock status
    pub stock_status: Option<StockStatus>,
    pub order_by: ListOrder,
    pub direction: SortDirection,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            item_type: ItemType::Product,
            stock_status: None,
            order_by: ListOrder::default(),
            direction: SortDirection::default(),
        }
    }
}

impl ListQuery {
    pub fn matches(&self, item: &CatalogItem) -> bool {
        item.item_type == self.item_type
            && self
                .stock_status
                .map_or(true, |status| item.stock_status == Some(status))
    }

    /// Sort items in place; both catalog stores order listings through this.
    ///
    /// Items whose `last_modified` could not be resolved always come last when
    /// ordering by modification time, whatever the direction.
    pub fn sort(&self, items: &mut [CatalogItem]) {
        let direction = self.direction;
        let directed = move |ordering: Ordering| match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        };

        items.sort_by(|a, b| match self.order_by {
            ListOrder::Id => directed(a.id.cmp(&b.id)),
            ListOrder::Title => directed(a.title.cmp(&b.title).then(a.id.cmp(&b.id))),
            ListOrder::LastModified => match (a.last_modified, b.last_modified) {
                (Some(x), Some(y)) => directed(x.cmp(&y).then(a.id.cmp(&b.id))),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => directed(a.id.cmp(&b.id)),
            },
        });
    }
}
