//! Pagination and site rotation for one scrape cycle.

use std::time::Duration;

use scraper::Html;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::adapter::{adapter_for, AdapterContext, SiteAdapter};
use super::config::SiteConfig;
use super::http_client::Fetcher;
use super::pacing::{pause, Cancelled, Jitter};
use super::pipeline::extract;
use super::ScrapeError;
use crate::dedupe::dedupe;
use crate::models::{JobRecord, SearchConfig};

/// Lower bound of each site's share of `max_jobs`.
const MIN_PER_SITE: usize = 5;

/// Pacing and limits for a cycle.
#[derive(Debug, Clone)]
pub struct DriverOptions {
    /// Global cap on records collected per cycle.
    pub max_jobs: usize,
    /// Random extra added to every page and site pause.
    pub pause_jitter: Duration,
    /// Pause range between detail enrichments.
    pub between_jobs: (Duration, Duration),
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            max_jobs: 100,
            pause_jitter: Duration::from_secs(5),
            between_jobs: (Duration::from_millis(500), Duration::from_millis(1500)),
        }
    }
}

/// Per-site outcome of a cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteSummary {
    pub site: String,
    pub pages: u32,
    pub collected: usize,
    pub errors: u32,
}

/// Result of one cycle. `records` are already deduplicated.
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub records: Vec<JobRecord>,
    /// Records collected before deduplication.
    pub raw_count: usize,
    pub sites: Vec<SiteSummary>,
    /// The cycle stopped early on cancellation; `records` is partial.
    pub cancelled: bool,
}

/// Walks sites and their pages, collecting records.
pub struct Driver {
    adapters: Vec<Box<dyn SiteAdapter>>,
    jitter: Jitter,
    cancel: CancellationToken,
    options: DriverOptions,
}

impl Driver {
    pub fn new(
        adapters: Vec<Box<dyn SiteAdapter>>,
        jitter: Jitter,
        cancel: CancellationToken,
        options: DriverOptions,
    ) -> Self {
        Self {
            adapters,
            jitter,
            cancel,
            options,
        }
    }

    /// One adapter per site, all sharing `fetcher`'s limiter, jitter and token.
    pub fn from_sites(
        sites: Vec<SiteConfig>,
        fetcher: Fetcher,
        max_retries: u32,
        options: DriverOptions,
    ) -> Self {
        let jitter = fetcher.jitter().clone();
        let cancel = fetcher.cancel_token().clone();
        let adapters = sites
            .into_iter()
            .map(|site| adapter_for(AdapterContext::new(site, fetcher.clone(), max_retries)))
            .collect();
        Self::new(adapters, jitter, cancel, options)
    }

    /// Site names in configured order.
    pub fn sites(&self) -> Vec<&str> {
        self.adapters
            .iter()
            .map(|a| a.site().name.as_str())
            .collect()
    }

    /// Run one cycle. Always returns the records gathered so far, even when
    /// cancelled part-way.
    pub async fn run_cycle(&self, search: &SearchConfig) -> CycleReport {
        let mut order: Vec<&dyn SiteAdapter> = self
            .adapters
            .iter()
            .map(|a| a.as_ref())
            .filter(|a| search.includes_site(&a.site().name))
            .collect();
        if search.target_site.is_none() {
            self.jitter.shuffle(&mut order);
        }

        let max_jobs = self.options.max_jobs;
        let per_site_cap = (max_jobs / order.len().max(1)).max(MIN_PER_SITE);
        info!(
            "Cycle over {} sites: {:?} (max {} jobs, {} per site)",
            order.len(),
            order.iter().map(|a| a.site().name.as_str()).collect::<Vec<_>>(),
            max_jobs,
            per_site_cap
        );

        let mut report = CycleReport::default();
        let mut collected: Vec<JobRecord> = Vec::new();

        for (index, adapter) in order.iter().enumerate() {
            if collected.len() >= max_jobs {
                info!("Reached {} jobs, skipping remaining sites", max_jobs);
                break;
            }
            let cap = per_site_cap.min(max_jobs - collected.len());
            let (summary, outcome) = self.scrape_site(*adapter, search, cap, &mut collected).await;
            info!(
                "{}: collected {} jobs over {} pages ({} errors)",
                summary.site, summary.collected, summary.pages, summary.errors
            );
            report.sites.push(summary);

            let more_sites = index + 1 < order.len() && collected.len() < max_jobs;
            let outcome = match outcome {
                Ok(()) if more_sites => self.site_pause(adapter.site()).await,
                other => other,
            };
            if outcome.is_err() {
                warn!("Cycle cancelled; keeping {} jobs collected so far", collected.len());
                report.cancelled = true;
                break;
            }
        }

        report.raw_count = collected.len();
        report.records = dedupe(collected);
        info!(
            "Cycle finished: {} jobs collected, {} unique",
            report.raw_count,
            report.records.len()
        );
        report
    }

    async fn scrape_site(
        &self,
        adapter: &dyn SiteAdapter,
        search: &SearchConfig,
        cap: usize,
        out: &mut Vec<JobRecord>,
    ) -> (SiteSummary, Result<(), Cancelled>) {
        let site = adapter.site();
        let mut summary = SiteSummary {
            site: site.name.clone(),
            ..Default::default()
        };
        if site.requires_js {
            warn!("{} renders listings with JavaScript; results may be empty", site.name);
        }

        for page in 1..=site.max_pages {
            let url = adapter.search_url(search, page);
            info!("{} page {}/{}: {}", site.name, page, site.max_pages, url);
            summary.pages += 1;

            let body = match adapter.fetch_listing_page(&url).await {
                Ok(body) => body,
                Err(e) if e.is_cancelled() => return (summary, Err(Cancelled)),
                Err(e) => {
                    let e = ScrapeError::from(e);
                    error!("{} page {}: {}", site.name, page, e);
                    summary.errors += 1;
                    break;
                }
            };

            match parse_listing(adapter, &url, &body, search) {
                Ok(jobs) => {
                    for mut job in jobs {
                        if summary.collected >= cap {
                            debug!("{}: reached share of {} jobs", site.name, cap);
                            return (summary, Ok(()));
                        }
                        if adapter.enriches() {
                            if let Some(enrichment) = adapter.enrich(&job, search).await {
                                job.merge(enrichment);
                                job.assign_id();
                            }
                        }
                        out.push(job);
                        summary.collected += 1;

                        if self.cancel.is_cancelled() {
                            return (summary, Err(Cancelled));
                        }
                        if adapter.enriches() {
                            let (lo, hi) = self.options.between_jobs;
                            if let Err(c) = pause(self.jitter.between(lo, hi), &self.cancel).await {
                                return (summary, Err(c));
                            }
                        }
                    }
                }
                Err(e) => {
                    warn!("{} page {}: {}", site.name, page, e);
                    summary.errors += 1;
                }
            }

            if summary.collected >= cap {
                break;
            }
            if page < site.max_pages {
                let delay = Duration::from_secs(site.delay_secs)
                    + self.jitter.up_to(self.options.pause_jitter);
                debug!("{}: waiting {:?} before next page", site.name, delay);
                if let Err(c) = pause(delay, &self.cancel).await {
                    return (summary, Err(c));
                }
            }
        }

        (summary, Ok(()))
    }

    async fn site_pause(&self, site: &SiteConfig) -> Result<(), Cancelled> {
        let delay =
            Duration::from_secs(site.delay_secs) + self.jitter.up_to(self.options.pause_jitter);
        debug!("Waiting {:?} before next site", delay);
        pause(delay, &self.cancel).await
    }
}

/// Parse a listing page into titled records. The parsed document never
/// outlives this call.
fn parse_listing(
    adapter: &dyn SiteAdapter,
    url: &str,
    body: &str,
    search: &SearchConfig,
) -> Result<Vec<JobRecord>, ScrapeError> {
    if body.trim().is_empty() {
        return Err(ScrapeError::Parse {
            url: url.to_string(),
            reason: "empty response body".to_string(),
        });
    }

    let html = Html::parse_document(body);
    let site = adapter.site();
    let containers = adapter.find_containers(html.root_element());
    if containers.is_empty() {
        warn!(
            "{}: no containers matched <{}> {:?} at {}",
            site.name, site.container.tag, site.container.selector, url
        );
        return Ok(Vec::new());
    }

    let total = containers.len();
    let mut untitled = 0;
    let mut filtered = 0;
    let mut jobs = Vec::with_capacity(total);
    for container in containers {
        match extract(container, site, search) {
            Some(job) if job.is_valid() => jobs.push(job),
            Some(_) => untitled += 1,
            None => filtered += 1,
        }
    }
    info!(
        "{}: {} containers, {} jobs ({} without title, {} filtered by keywords)",
        site.name,
        total,
        jobs.len(),
        untitled,
        filtered
    );
    Ok(jobs)
}
