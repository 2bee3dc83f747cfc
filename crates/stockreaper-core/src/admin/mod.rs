//! Admin product listing: the days-out-of-stock column and its sort rewrite

mod column;
mod listing;

pub use column::{
    ColumnSet, DaysOutOfStockColumn, SortableColumns, DAYS_OUT_OF_STOCK, NEUTRAL_PLACEHOLDER,
    UNRESOLVED_PLACEHOLDER,
};
pub use listing::{rewrite, ListRequest};
