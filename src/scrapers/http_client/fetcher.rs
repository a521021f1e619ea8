//! Retrying fetch loop.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::identity::FetchProfile;
use super::response::{FailureCause, FetchError};
use super::Transport;
use crate::scrapers::pacing::{pause, Jitter};
use crate::scrapers::rate_limiter::{FailureKind, RateLimiter};

/// Cooldowns between attempts. `attempt` is 1-based.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Standard backoff grows by this much per attempt.
    pub backoff_step: Duration,
    /// Random extra added to standard backoff.
    pub backoff_jitter: Duration,
    /// 429 cooldown grows by this much per attempt.
    pub rate_limited_step: Duration,
    /// Fixed part of the blocked cooldown.
    pub blocked_base: Duration,
    /// Blocked cooldown grows by this much per attempt after the first.
    pub blocked_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            backoff_step: Duration::from_secs(3),
            backoff_jitter: Duration::from_secs(4),
            rate_limited_step: Duration::from_secs(60),
            blocked_base: Duration::from_secs(120),
            blocked_step: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    pub fn standard_wait(&self, attempt: u32, jitter: &Jitter) -> Duration {
        self.backoff_step * attempt + jitter.up_to(self.backoff_jitter)
    }

    pub fn rate_limited_wait(&self, attempt: u32) -> Duration {
        self.rate_limited_step * attempt
    }

    pub fn blocked_wait(&self, attempt: u32) -> Duration {
        self.blocked_base + self.blocked_step * attempt.saturating_sub(1)
    }
}

/// Fetches pages through the rate limiter, retrying with status-aware cooldowns.
///
/// Clones share the transport, rate limiter state, randomness and
/// cancellation token.
#[derive(Clone)]
pub struct Fetcher {
    transport: Arc<dyn Transport>,
    limiter: RateLimiter,
    jitter: Jitter,
    policy: RetryPolicy,
    debug_dir: Option<PathBuf>,
    cancel: CancellationToken,
}

impl Fetcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        limiter: RateLimiter,
        jitter: Jitter,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            transport,
            limiter,
            jitter,
            policy: RetryPolicy::default(),
            debug_dir: None,
            cancel,
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Write blocked and empty responses under `dir`.
    pub fn with_debug_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.debug_dir = dir;
        self
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn jitter(&self) -> &Jitter {
        &self.jitter
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// GET `url` as `profile`, making at most `max_retries` attempts.
    ///
    /// The rate limit gate runs once, before the first attempt. Every retry
    /// is still recorded with the limiter, so the next fetch to the same site
    /// waits from the last attempt. No cooldown follows the final attempt.
    pub async fn fetch(
        &self,
        url: &str,
        profile: &FetchProfile,
        max_retries: u32,
    ) -> Result<String, FetchError> {
        let cancelled = || FetchError::Cancelled {
            url: url.to_string(),
        };

        self.limiter
            .acquire(&profile.site, &self.cancel)
            .await
            .map_err(|_| cancelled())?;

        let attempts = max_retries.max(1);
        let mut agents = profile.user_agent_pool(&self.jitter);
        let mut last = FailureCause::Transport("no attempt made".to_string());

        for attempt in 1..=attempts {
            if self.cancel.is_cancelled() {
                return Err(cancelled());
            }
            let headers = profile.headers(url, agents.current(), &self.jitter);
            debug!("GET {} ({} attempt {}/{})", url, profile.site, attempt, attempts);
            if attempt > 1 {
                self.limiter.mark_request(&profile.site).await;
            }

            let outcome = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(cancelled()),
                outcome = self.transport.get(url, &headers) => outcome,
            };

            let wait = match outcome {
                Ok(response) if response.is_success() => {
                    self.limiter.report_success(&profile.site).await;
                    return Ok(response.body);
                }
                Ok(response) => {
                    let status = response.status;
                    last = FailureCause::Status(status);

                    if status == 429 {
                        warn!(
                            "{}: rate limited (429) on {} attempt {}/{}",
                            profile.site, url, attempt, attempts
                        );
                        self.limiter
                            .report_failure(&profile.site, FailureKind::RateLimited)
                            .await;
                        self.policy.rate_limited_wait(attempt)
                    } else if profile.is_blocked(status) {
                        warn!(
                            "{}: blocked ({}) on {} attempt {}/{}",
                            profile.site, status, url, attempt, attempts
                        );
                        self.limiter
                            .report_failure(&profile.site, FailureKind::Blocked)
                            .await;
                        self.snapshot(&status.to_string(), &profile.site, &response.body)
                            .await;
                        let next = agents.rotate();
                        debug!("{}: switching user agent to {}", profile.site, next);
                        self.policy.blocked_wait(attempt)
                    } else {
                        warn!(
                            "{}: HTTP {} on {} attempt {}/{}",
                            profile.site, status, url, attempt, attempts
                        );
                        self.limiter
                            .report_failure(&profile.site, FailureKind::Other)
                            .await;
                        self.policy.standard_wait(attempt, &self.jitter)
                    }
                }
                Err(e) => {
                    warn!(
                        "{}: transport failure on {} attempt {}/{}: {}",
                        profile.site, url, attempt, attempts, e
                    );
                    last = FailureCause::Transport(e.0);
                    self.policy.standard_wait(attempt, &self.jitter)
                }
            };

            if attempt < attempts {
                debug!("{}: retrying in {:?}", profile.site, wait);
                pause(wait, &self.cancel).await.map_err(|_| cancelled())?;
            }
        }

        Err(FetchError::Exhausted {
            url: url.to_string(),
            attempts,
            last,
        })
    }

    /// Save `body` as `debug_<label>_<site>_<unix-millis>.html` when a debug
    /// directory is configured. Failures are logged and ignored.
    pub async fn snapshot(&self, label: &str, site: &str, body: &str) {
        let Some(dir) = &self.debug_dir else {
            return;
        };
        let path = snapshot_path(dir, label, site);
        let result = async {
            tokio::fs::create_dir_all(dir).await?;
            tokio::fs::write(&path, body).await
        }
        .await;
        match result {
            Ok(()) => info!("Saved response snapshot to {}", path.display()),
            Err(e) => warn!("Failed to save snapshot {}: {}", path.display(), e),
        }
    }
}

fn snapshot_path(dir: &Path, label: &str, site: &str) -> PathBuf {
    let site: String = site
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    dir.join(format!(
        "debug_{}_{}_{}.html",
        label,
        site,
        chrono::Utc::now().timestamp_millis()
    ))
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tokio::time::Instant;

    use super::*;
    use crate::scrapers::http_client::{RawResponse, TransportError};
    use crate::scrapers::rate_limiter::RateLimitConfig;

    type Scripted = Result<RawResponse, TransportError>;

    /// Replays canned responses and records request headers.
    #[derive(Default)]
    struct ScriptedTransport {
        responses: Mutex<VecDeque<Scripted>>,
        seen: Mutex<Vec<Vec<(String, String)>>>,
        sent_at: Mutex<Vec<Instant>>,
    }

    impl ScriptedTransport {
        fn new(responses: Vec<Scripted>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                seen: Mutex::new(Vec::new()),
                sent_at: Mutex::new(Vec::new()),
            })
        }

        fn user_agents(&self) -> Vec<String> {
            self.seen
                .lock()
                .unwrap()
                .iter()
                .filter_map(|h| h.iter().find(|(k, _)| k == "User-Agent"))
                .map(|(_, v)| v.clone())
                .collect()
        }

        fn requests(&self) -> usize {
            self.seen.lock().unwrap().len()
        }

        fn sent_at(&self) -> Vec<Instant> {
            self.sent_at.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn get(
            &self,
            _url: &str,
            headers: &[(String, String)],
        ) -> Result<RawResponse, TransportError> {
            self.seen.lock().unwrap().push(headers.to_vec());
            self.sent_at.lock().unwrap().push(Instant::now());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError("script exhausted".to_string())))
        }
    }

    fn ok(body: &str) -> Scripted {
        Ok(RawResponse::new(200, body))
    }

    fn status(code: u16) -> Scripted {
        Ok(RawResponse::new(code, "<html>denied</html>"))
    }

    fn fetcher(transport: Arc<ScriptedTransport>) -> Fetcher {
        let config = RateLimitConfig {
            max_jitter: Duration::ZERO,
            default_base_delay: Duration::from_secs(1),
            ..Default::default()
        };
        let jitter = Jitter::seeded(11);
        Fetcher::new(
            transport,
            RateLimiter::new(config, jitter.clone()),
            jitter,
            CancellationToken::new(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_returns_body() {
        let transport = ScriptedTransport::new(vec![ok("<p>hi</p>")]);
        let fetcher = fetcher(transport.clone());
        let body = fetcher
            .fetch("https://s.example/a", &FetchProfile::named("S"), 3)
            .await
            .unwrap();
        assert_eq!(body, "<p>hi</p>");
        assert_eq!(transport.requests(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_then_ok_stays_in_backoff() {
        let transport = ScriptedTransport::new(vec![status(429), ok("body")]);
        let fetcher = fetcher(transport.clone());
        let start = Instant::now();
        let body = fetcher
            .fetch("https://s.example/a", &FetchProfile::named("S"), 3)
            .await
            .unwrap();
        assert_eq!(body, "body");
        assert!(start.elapsed() >= Duration::from_secs(60));
        assert!(fetcher.limiter().is_in_backoff("S").await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_block_rotates_agent_and_recovers_after_four_successes() {
        let transport = ScriptedTransport::new(vec![
            status(403),
            ok("1"),
            ok("2"),
            ok("3"),
            ok("4"),
        ]);
        let fetcher = fetcher(transport.clone());
        let mut profile = FetchProfile::named("S");
        profile.user_agents = vec!["agent-a".to_string(), "agent-b".to_string()];

        let start = Instant::now();
        fetcher.fetch("https://s.example/1", &profile, 3).await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(120));
        let agents = transport.user_agents();
        assert_ne!(agents[0], agents[1]);
        assert!(fetcher.limiter().is_in_backoff("S").await);

        for n in 2..=4 {
            let url = format!("https://s.example/{}", n);
            fetcher.fetch(&url, &profile, 3).await.unwrap();
        }
        assert!(!fetcher.limiter().is_in_backoff("S").await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_fetch_gated_from_last_blocked_attempt() {
        let transport = ScriptedTransport::new(vec![
            status(403),
            status(403),
            status(403),
            ok("after"),
        ]);
        let mut config = RateLimitConfig {
            max_jitter: Duration::ZERO,
            ..Default::default()
        };
        config
            .site_base_delays
            .insert("S".to_string(), Duration::from_secs(10));
        let jitter = Jitter::seeded(3);
        let policy = RetryPolicy {
            blocked_base: Duration::from_secs(1),
            blocked_step: Duration::from_secs(1),
            ..Default::default()
        };
        let fetcher = Fetcher::new(
            transport.clone(),
            RateLimiter::new(config, jitter.clone()),
            jitter,
            CancellationToken::new(),
        )
        .with_policy(policy);

        let profile = FetchProfile::named("S");
        assert!(fetcher.fetch("https://s.example/a", &profile, 3).await.is_err());
        let body = fetcher.fetch("https://s.example/b", &profile, 3).await.unwrap();
        assert_eq!(body, "after");

        let sent = transport.sent_at();
        assert_eq!(sent.len(), 4);
        // Short blocked cooldowns between attempts, well under the gate.
        assert_eq!(sent[1] - sent[0], Duration::from_secs(1));
        assert_eq!(sent[2] - sent[1], Duration::from_secs(2));

        let config = fetcher.limiter().config();
        let gate = config.base_delay("S").mul_f64(config.backoff_factor);
        assert!(sent[3] - sent[2] >= gate);
        assert_eq!(fetcher.limiter().stats("S").await.map(|s| s.total_requests), Some(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_errors_exhaust_retries() {
        let transport = ScriptedTransport::new(vec![]);
        let fetcher = fetcher(transport.clone());
        let err = fetcher
            .fetch("https://s.example/a", &FetchProfile::named("S"), 3)
            .await
            .unwrap_err();
        match err {
            FetchError::Exhausted { attempts, last, .. } => {
                assert_eq!(attempts, 3);
                assert!(matches!(last, FailureCause::Transport(_)));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(transport.requests(), 3);
        assert!(!fetcher.limiter().is_in_backoff("S").await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_cooldown_after_final_attempt() {
        let transport = ScriptedTransport::new(vec![status(500)]);
        let fetcher = fetcher(transport.clone());
        let start = Instant::now();
        let err = fetcher
            .fetch("https://s.example/a", &FetchProfile::named("S"), 1)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FetchError::Exhausted {
                last: FailureCause::Status(500),
                ..
            }
        ));
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_site_block_code_is_treated_as_blocked() {
        let dir = tempfile::tempdir().unwrap();
        let transport = ScriptedTransport::new(vec![status(999)]);
        let fetcher = fetcher(transport).with_debug_dir(Some(dir.path().to_path_buf()));
        let mut profile = FetchProfile::named("Linked In");
        profile.blocked_statuses = vec![999];

        assert!(fetcher.fetch("https://s.example/a", &profile, 1).await.is_err());
        assert!(fetcher.limiter().is_in_backoff("Linked In").await);

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(names[0].starts_with("debug_999_Linked_In_"));
        assert!(names[0].ends_with(".html"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_before_fetch() {
        let transport = ScriptedTransport::new(vec![ok("never")]);
        let fetcher = fetcher(transport.clone());
        fetcher.cancel_token().cancel();
        let err = fetcher
            .fetch("https://s.example/a", &FetchProfile::named("S"), 3)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(transport.requests(), 0);
    }

    #[test]
    fn test_policy_waits() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.rate_limited_wait(2), Duration::from_secs(120));
        assert_eq!(policy.blocked_wait(1), Duration::from_secs(120));
        assert_eq!(policy.blocked_wait(3), Duration::from_secs(240));
        let jitter = Jitter::seeded(5);
        let wait = policy.standard_wait(2, &jitter);
        assert!(wait >= Duration::from_secs(6) && wait <= Duration::from_secs(10));
    }
}
