//! jobharvest - job listing acquisition from job-board search pages.
//!
//! Fetches search result pages from configured job boards, finds listing
//! containers with loose tag/selector matching, projects them into
//! [`models::JobRecord`]s (optionally enriched from each listing's detail
//! page), removes duplicates and hands the result to the output sinks.

pub mod cli;
pub mod config;
pub mod dedupe;
pub mod html;
pub mod models;
pub mod output;
pub mod scrapers;
