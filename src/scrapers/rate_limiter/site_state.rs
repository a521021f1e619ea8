//! Per-site rate limiting state.

use std::time::Duration;

use tokio::time::Instant;

/// State for a single site. Lives for the whole process, across cycles.
#[derive(Debug, Clone)]
pub struct SiteState {
    /// Delay budget; doubled on every block or rate limit, reset on recovery.
    pub current_delay: Duration,
    pub consecutive_successes: u32,
    pub consecutive_failures: u32,
    /// When the last request through the gate fired.
    pub last_request: Option<Instant>,
    pub in_backoff: bool,
    pub total_requests: u64,
    /// Blocks and rate limits seen.
    pub block_hits: u64,
}

impl SiteState {
    pub fn new(base_delay: Duration) -> Self {
        Self {
            current_delay: base_delay,
            consecutive_successes: 0,
            consecutive_failures: 0,
            last_request: None,
            in_backoff: false,
            total_requests: 0,
            block_hits: 0,
        }
    }

    /// Time left before `required` has elapsed since the last request.
    pub fn remaining(&self, required: Duration) -> Duration {
        match self.last_request {
            Some(last) => required.saturating_sub(last.elapsed()),
            None => Duration::ZERO,
        }
    }
}
