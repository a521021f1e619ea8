//! Rate limiter configuration and types.

use std::collections::HashMap;
use std::time::Duration;

use crate::scrapers::config::SiteConfig;

/// Configuration for rate limiting behavior.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Base delay for sites without their own entry.
    pub default_base_delay: Duration,
    /// Base delay per site name.
    pub site_base_delays: HashMap<String, Duration>,
    /// Multiplier applied to the base delay while a site is in backoff.
    pub backoff_factor: f64,
    /// Multiplier applied to `current_delay` on each block or rate limit.
    pub failure_multiplier: f64,
    /// Ceiling for `current_delay`.
    pub max_delay: Duration,
    /// Upper bound of the random jitter added to every gate.
    pub max_jitter: Duration,
    /// Consecutive successes needed to leave backoff.
    pub recovery_threshold: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            default_base_delay: Duration::from_secs(5),
            site_base_delays: HashMap::new(),
            backoff_factor: 1.2,
            failure_multiplier: 2.0,
            max_delay: Duration::from_secs(600),
            max_jitter: Duration::from_secs(5),
            recovery_threshold: 4,
        }
    }
}

impl RateLimitConfig {
    /// Default config with each site's `rate_limit_secs` as its base delay.
    pub fn for_sites<'a>(sites: impl IntoIterator<Item = &'a SiteConfig>) -> Self {
        let site_base_delays = sites
            .into_iter()
            .map(|s| (s.name.clone(), Duration::from_secs(s.rate_limit_secs)))
            .collect();
        Self {
            site_base_delays,
            ..Default::default()
        }
    }

    pub fn base_delay(&self, site: &str) -> Duration {
        self.site_base_delays
            .get(site)
            .copied()
            .unwrap_or(self.default_base_delay)
    }
}

/// Why a request counted as a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// HTTP 429.
    RateLimited,
    /// HTTP 403 or a site-specific block code.
    Blocked,
    /// Any other non-2xx status or a transport error.
    Other,
}

impl FailureKind {
    /// Whether this failure pushes the site into backoff.
    pub fn enters_backoff(&self) -> bool {
        matches!(self, FailureKind::RateLimited | FailureKind::Blocked)
    }
}

/// Snapshot of one site's rate limit state.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteStats {
    pub current_delay: Duration,
    pub in_backoff: bool,
    pub consecutive_successes: u32,
    pub consecutive_failures: u32,
    pub total_requests: u64,
    pub block_hits: u64,
}
