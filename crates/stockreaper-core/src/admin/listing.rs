use crate::catalog::{ListOrder, ListQuery, SortDirection, StockStatus};

use super::column::DAYS_OUT_OF_STOCK;

/// Raw listing request as the admin screen sends it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListRequest {
    pub orderby: Option<String>,
    pub order: Option<String>,
    pub is_admin: bool,
    pub is_main_query: bool,
}

impl ListRequest {
    /// A request coming from the main admin product screen
    pub fn admin(orderby: Option<String>, order: Option<String>) -> Self {
        Self {
            orderby,
            order,
            is_admin: true,
            is_main_query: true,
        }
    }
}

/// Translate a listing request into a store query.
///
/// Ordering by days out of stock sorts by `last_modified` and only lists
/// out-of-stock products. More days out of stock means an older modification
/// time, so the requested direction is inverted. The rewrite only applies to
/// the main admin query; anything else gets the plain mapping.
pub fn rewrite(request: &ListRequest) -> ListQuery {
    let direction = request
        .order
        .as_deref()
        .and_then(SortDirection::parse)
        .unwrap_or_default();

    let mut query = ListQuery {
        direction,
        ..ListQuery::default()
    };

    match request.orderby.as_deref() {
        Some(DAYS_OUT_OF_STOCK) if request.is_admin && request.is_main_query => {
            query.order_by = ListOrder::LastModified;
            query.stock_status = Some(StockStatus::OutOfStock);
            query.direction = direction.reversed();
        }
        Some("title") | Some("name") => query.order_by = ListOrder::Title,
        Some("modified") | Some("last_modified") => query.order_by = ListOrder::LastModified,
        _ => query.order_by = ListOrder::Id,
    }

    query
}
