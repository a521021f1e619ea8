//! Dice adapter.
//!
//! Dice reshuffles its card markup often, so containers are found through a
//! cascade ending in a structural heuristic. Detail pages look for the job id
//! in element ids/classes before falling back to the largest text block, and
//! a run of failed detail fetches triggers a session-reset cooldown.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use scraper::ElementRef;
use tracing::{debug, info, warn};

use super::{AdapterContext, SiteAdapter};
use crate::html::find_nodes;
use crate::models::{Enrichment, JobRecord, SearchConfig};
use crate::scrapers::http_client::FetchProfile;
use crate::scrapers::pacing::pause;
use crate::scrapers::pipeline::DetailHints;

/// Consecutive detail failures (with no success yet) that trigger a reset.
const SESSION_RESET_THRESHOLD: u32 = 3;
const SESSION_RESET_COOLDOWN: Duration = Duration::from_secs(120);
const DETAIL_PAUSE_MIN: Duration = Duration::from_secs(4);
const DETAIL_PAUSE_MAX: Duration = Duration::from_secs(7);

pub struct DiceAdapter {
    ctx: AdapterContext,
    detail_failures: AtomicU32,
    detail_successes: AtomicU32,
}

impl DiceAdapter {
    pub fn new(ctx: AdapterContext) -> Self {
        Self {
            ctx,
            detail_failures: AtomicU32::new(0),
            detail_successes: AtomicU32::new(0),
        }
    }

    /// Whether the next detail request should wait out a session reset.
    fn needs_session_reset(&self) -> bool {
        self.detail_failures.load(Ordering::Relaxed) > SESSION_RESET_THRESHOLD
            && self.detail_successes.load(Ordering::Relaxed) == 0
    }

    fn record_detail(&self, found: bool) {
        if found {
            self.detail_successes.fetch_add(1, Ordering::Relaxed);
            self.detail_failures.store(0, Ordering::Relaxed);
        } else {
            self.detail_failures.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Id segment of a `/job/detail/<id>/...` URL.
pub fn job_id_from_url(url: &str) -> Option<&str> {
    const MARKER: &str = "/job/detail/";
    let start = url.find(MARKER)? + MARKER.len();
    let id = url[start..]
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    (!id.is_empty()).then_some(id)
}

/// Divs that look like cards: class mentions `card` or `job`, or id mentions
/// `job`, and the class is not a layout `container`.
fn looks_like_card(el: ElementRef<'_>) -> bool {
    let el = el.value();
    let class = el.attr("class").unwrap_or_default();
    let id = el.id().unwrap_or_default();
    (class.contains("card") || class.contains("job") || id.contains("job"))
        && !class.contains("container")
}

#[async_trait]
impl SiteAdapter for DiceAdapter {
    fn context(&self) -> &AdapterContext {
        &self.ctx
    }

    fn find_containers<'a>(&self, root: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        let site = &self.ctx.site;
        let cascade = std::iter::once(&site.container).chain(site.container_fallbacks.iter());
        for selector in cascade {
            let found = find_nodes(root, &selector.tag, &selector.selector);
            if !found.is_empty() {
                debug!(
                    "Dice: {} containers via <{}> {:?}",
                    found.len(),
                    selector.tag,
                    selector.selector
                );
                return found;
            }
        }

        let heuristic: Vec<ElementRef<'a>> = find_nodes(root, "div", "")
            .into_iter()
            .filter(|el| looks_like_card(*el))
            .collect();
        if !heuristic.is_empty() {
            info!("Dice: {} containers via card heuristic", heuristic.len());
        }
        heuristic
    }

    async fn enrich(&self, job: &JobRecord, search: &SearchConfig) -> Option<Enrichment> {
        if self.ctx.site.enrichment.is_none() {
            return None;
        }
        let cancel = self.ctx.fetcher.cancel_token();

        if self.needs_session_reset() {
            warn!(
                "Dice: {} detail failures without a success, cooling down {:?}",
                self.detail_failures.load(Ordering::Relaxed),
                SESSION_RESET_COOLDOWN
            );
            pause(SESSION_RESET_COOLDOWN, cancel).await.ok()?;
            self.detail_failures.store(0, Ordering::Relaxed);
        }

        let delay = self
            .ctx
            .fetcher
            .jitter()
            .between(DETAIL_PAUSE_MIN, DETAIL_PAUSE_MAX);
        let hints = DetailHints {
            job_id: job.url.as_deref().and_then(job_id_from_url),
        };
        let profile = FetchProfile::for_site(&self.ctx.site);

        let enrichment = self
            .ctx
            .enrich_with(job, search, &profile, hints, delay)
            .await;
        self.record_detail(
            enrichment
                .as_ref()
                .is_some_and(|e| e.description.is_some()),
        );
        enrichment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_id_from_url() {
        assert_eq!(
            job_id_from_url("https://www.dice.com/job/detail/abc-123/x?q=1"),
            Some("abc-123")
        );
        assert_eq!(
            job_id_from_url("https://www.dice.com/job/detail/xyz?src=search"),
            Some("xyz")
        );
        assert_eq!(job_id_from_url("https://www.dice.com/jobs?q=rust"), None);
    }

    #[test]
    fn test_card_heuristic() {
        let html = scraper::Html::parse_document(
            r#"<div class="job-container"><div class="card">a</div><div id="job-9">b</div>
               <div class="other">c</div></div>"#,
        );
        let matches: Vec<String> = find_nodes(html.root_element(), "div", "")
            .into_iter()
            .filter(|el| looks_like_card(*el))
            .map(crate::html::extract_text)
            .collect();
        assert_eq!(matches, vec!["a", "b"]);
    }
}
