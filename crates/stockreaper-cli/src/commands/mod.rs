pub mod daemon;
pub mod list;
pub mod reap;
pub mod schedule;
