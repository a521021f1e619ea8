//! Site adapters.
//!
//! An adapter knows how to search one site, fetch its listing pages, find
//! the listing containers, and enrich a record from its detail page. The
//! generic adapter is entirely configuration-driven; the others override only
//! the steps where a site family behaves differently.

mod dice;
mod generic;
mod linkedin;

pub use dice::DiceAdapter;
pub use generic::GenericAdapter;
pub use linkedin::LinkedInAdapter;

use std::time::Duration;

use async_trait::async_trait;
use scraper::ElementRef;
use tracing::{debug, warn};

use super::config::{AdapterKind, SiteConfig};
use super::http_client::{FetchError, FetchProfile, Fetcher};
use super::pacing::pause;
use super::pipeline::{parse_detail, DetailHints};
use crate::html::{find_nodes, format_search_url};
use crate::models::{Enrichment, JobRecord, SearchConfig};

/// What every adapter needs to talk to its site.
#[derive(Clone)]
pub struct AdapterContext {
    pub site: SiteConfig,
    pub fetcher: Fetcher,
    pub max_retries: u32,
}

impl AdapterContext {
    pub fn new(site: SiteConfig, fetcher: Fetcher, max_retries: u32) -> Self {
        Self {
            site,
            fetcher,
            max_retries,
        }
    }

    /// Pause before a detail request, honoring cancellation.
    async fn detail_pause(&self, delay: Duration) -> Result<(), FetchError> {
        pause(delay, self.fetcher.cancel_token())
            .await
            .map_err(|_| FetchError::Cancelled {
                url: self.site.base_url.clone(),
            })
    }

    /// Shared detail enrichment: fetch `job.url` as `profile`, then run the
    /// configured cascade. `None` when the site has no enrichment block, the
    /// record has no URL, or the fetch fails.
    async fn enrich_with(
        &self,
        job: &JobRecord,
        search: &SearchConfig,
        profile: &FetchProfile,
        hints: DetailHints<'_>,
        min_delay: Duration,
    ) -> Option<Enrichment> {
        let config = self.site.enrichment.as_ref()?;
        let url = job.url.as_deref()?;

        let delay = Duration::from_millis(config.delay_ms).max(min_delay);
        if self.detail_pause(delay).await.is_err() {
            return None;
        }

        debug!("{}: fetching details from {}", self.site.name, url);
        let body = match self.fetcher.fetch(url, profile, self.max_retries).await {
            Ok(body) => body,
            Err(e) => {
                if !e.is_cancelled() {
                    warn!("{}: detail fetch failed: {}", self.site.name, e);
                }
                return None;
            }
        };

        let enrichment = parse_detail(&body, config, &hints, search.extract_skills);
        if enrichment.description.is_none() {
            debug!("{}: no description found at {}", self.site.name, url);
            self.fetcher.snapshot("detail", &self.site.name, &body).await;
        }
        Some(enrichment)
    }
}

/// Per-site behavior for the cycle driver.
#[async_trait]
pub trait SiteAdapter: Send + Sync {
    fn context(&self) -> &AdapterContext;

    fn site(&self) -> &SiteConfig {
        &self.context().site
    }

    /// Search URL for a 1-based page.
    fn search_url(&self, search: &SearchConfig, page: u32) -> String {
        let site = self.site();
        format_search_url(
            &site.search_url,
            &search.job_title,
            &search.location,
            site.pagination_param.as_deref(),
            page,
        )
    }

    /// Fetch one listing page with the site's full browser identity.
    async fn fetch_listing_page(&self, url: &str) -> Result<String, FetchError> {
        let ctx = self.context();
        ctx.fetcher
            .fetch(url, &FetchProfile::for_site(&ctx.site), ctx.max_retries)
            .await
    }

    /// Listing containers on a parsed search page.
    fn find_containers<'a>(&self, root: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        let container = &self.site().container;
        find_nodes(root, &container.tag, &container.selector)
    }

    /// Whether `enrich` may issue a detail request.
    fn enriches(&self) -> bool {
        self.site().enrichment.is_some()
    }

    /// Second fetch against the record's own page.
    async fn enrich(&self, job: &JobRecord, search: &SearchConfig) -> Option<Enrichment> {
        let ctx = self.context();
        ctx.enrich_with(
            job,
            search,
            &FetchProfile::for_site(&ctx.site),
            DetailHints::default(),
            Duration::ZERO,
        )
        .await
    }
}

/// Adapter for a site according to its configured kind.
pub fn adapter_for(ctx: AdapterContext) -> Box<dyn SiteAdapter> {
    match ctx.site.adapter {
        AdapterKind::Generic => Box::new(GenericAdapter::new(ctx)),
        AdapterKind::LinkedIn => Box::new(LinkedInAdapter::new(ctx)),
        AdapterKind::Dice => Box::new(DiceAdapter::new(ctx)),
    }
}
