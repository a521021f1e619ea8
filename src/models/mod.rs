//! Data models for jobharvest.

mod job;
mod search;

pub use job::{now_local, stable_id, Enrichment, JobRecord, SCRAPED_AT_FORMAT};
pub use search::SearchConfig;
