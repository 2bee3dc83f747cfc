mod database;
mod item_repo;
mod job_repo;

pub use database::Database;
pub use item_repo::ItemRepository;
pub use job_repo::{JobRepository, ScheduledJob};
