//! Adaptive per-site rate limiter.
//!
//! Every request to a site passes through [`RateLimiter::acquire`], which
//! waits until the site's required delay has elapsed since its last request.
//! Blocks and rate limits push a site into backoff (a slower gate); a short
//! run of consecutive successes brings it back out.

mod config;
mod site_state;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub use config::{FailureKind, RateLimitConfig, SiteStats};
use site_state::SiteState;

use super::pacing::{pause, Cancelled, Jitter};

/// Adaptive rate limiter keyed by site name.
///
/// Clones share state, so one limiter can be handed to every adapter.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: Arc<RateLimitConfig>,
    sites: Arc<RwLock<HashMap<String, SiteState>>>,
    jitter: Jitter,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig, jitter: Jitter) -> Self {
        Self {
            config: Arc::new(config),
            sites: Arc::new(RwLock::new(HashMap::new())),
            jitter,
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Base delay for `site`, scaled while it is in backoff. Excludes jitter.
    pub async fn required_delay(&self, site: &str) -> Duration {
        let base = self.config.base_delay(site);
        let in_backoff = self
            .sites
            .read()
            .await
            .get(site)
            .is_some_and(|s| s.in_backoff);
        if in_backoff {
            let millis = base.as_millis() as f64 * self.config.backoff_factor;
            Duration::from_millis(millis.round() as u64)
        } else {
            base
        }
    }

    /// Wait until `site` may be requested again, then record the request.
    pub async fn acquire(&self, site: &str, cancel: &CancellationToken) -> Result<(), Cancelled> {
        let required = self.required_delay(site).await + self.jitter.up_to(self.config.max_jitter);

        let wait = {
            let sites = self.sites.read().await;
            sites
                .get(site)
                .map(|s| s.remaining(required))
                .unwrap_or(Duration::ZERO)
        };

        if !wait.is_zero() {
            debug!("Rate limiting {}: waiting {:?}", site, wait);
            pause(wait, cancel).await?;
        }

        self.mark_request(site).await;
        Ok(())
    }

    /// Record a request to `site` without waiting. Retries inside one fetch
    /// go through here so the next gate is measured from the last attempt.
    pub async fn mark_request(&self, site: &str) {
        let mut sites = self.sites.write().await;
        let state = self.state_mut(&mut sites, site);
        state.last_request = Some(Instant::now());
        state.total_requests += 1;
    }

    fn state_mut<'a>(
        &self,
        sites: &'a mut HashMap<String, SiteState>,
        site: &str,
    ) -> &'a mut SiteState {
        sites
            .entry(site.to_string())
            .or_insert_with(|| SiteState::new(self.config.base_delay(site)))
    }

    /// Record a 2xx response.
    pub async fn report_success(&self, site: &str) {
        let mut sites = self.sites.write().await;
        let state = self.state_mut(&mut sites, site);
        state.consecutive_successes += 1;
        state.consecutive_failures = 0;

        if state.in_backoff && state.consecutive_successes >= self.config.recovery_threshold {
            state.in_backoff = false;
            state.current_delay = self.config.base_delay(site);
            info!("Site {} recovered from backoff", site);
        }
    }

    /// Record a failed request.
    pub async fn report_failure(&self, site: &str, kind: FailureKind) {
        let mut sites = self.sites.write().await;
        let state = self.state_mut(&mut sites, site);
        state.consecutive_failures += 1;
        state.consecutive_successes = 0;

        if !kind.enters_backoff() {
            return;
        }

        state.block_hits += 1;
        if !state.in_backoff {
            state.in_backoff = true;
            warn!("Site {} entering backoff after {:?}", site, kind);
        }
        state.current_delay = state
            .current_delay
            .mul_f64(self.config.failure_multiplier)
            .min(self.config.max_delay);
        debug!(
            "Site {} delay budget now {:?} ({} consecutive failures)",
            site, state.current_delay, state.consecutive_failures
        );
    }

    pub async fn is_in_backoff(&self, site: &str) -> bool {
        self.sites
            .read()
            .await
            .get(site)
            .is_some_and(|s| s.in_backoff)
    }

    pub async fn stats(&self, site: &str) -> Option<SiteStats> {
        self.sites.read().await.get(site).map(|s| SiteStats {
            current_delay: s.current_delay,
            in_backoff: s.in_backoff,
            consecutive_successes: s.consecutive_successes,
            consecutive_failures: s.consecutive_failures,
            total_requests: s.total_requests,
            block_hits: s.block_hits,
        })
    }

    /// Snapshot of every site seen so far.
    pub async fn all_stats(&self) -> HashMap<String, SiteStats> {
        let names: Vec<String> = self.sites.read().await.keys().cloned().collect();
        let mut out = HashMap::with_capacity(names.len());
        for name in names {
            if let Some(stats) = self.stats(&name).await {
                out.insert(name, stats);
            }
        }
        out
    }
}
