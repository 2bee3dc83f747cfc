pub mod admin;
pub mod catalog;
pub mod config;
pub mod error;
pub mod extension;
pub mod reaper;
pub mod scheduler;
pub mod storage;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use extension::{Extension, Listing, ListingRow};
pub use reaper::Reaper;
