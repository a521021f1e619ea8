//! Scraping core: site table, fetch engine, adapters and the cycle driver.

pub mod adapter;
pub mod config;
pub mod driver;
pub mod http_client;
pub mod pacing;
pub mod pipeline;
pub mod rate_limiter;
pub mod skills;

pub use adapter::{adapter_for, AdapterContext, SiteAdapter};
pub use config::{AdapterKind, FieldSelector, SiteConfig, SiteTable};
pub use driver::{CycleReport, Driver, DriverOptions, SiteSummary};
pub use http_client::{FetchError, FetchProfile, Fetcher, ReqwestTransport, Transport};
pub use pacing::{Cancelled, Jitter};
pub use rate_limiter::{RateLimitConfig, RateLimiter};

use thiserror::Error;

/// Failure of one listing page. Only that page is affected.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("failed to parse {url}: {reason}")]
    Parse { url: String, reason: String },

    #[error("cancelled")]
    Cancelled,
}

impl From<Cancelled> for ScrapeError {
    fn from(_: Cancelled) -> Self {
        ScrapeError::Cancelled
    }
}
