//! End-to-end scraping tests against canned pages.
//!
//! No network: a map-backed transport serves fixed bodies by URL, and the
//! tokio clock is paused so rate-limit gates and pauses resolve instantly.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use scraper::Html;
use tokio_util::sync::CancellationToken;

use jobharvest::dedupe::dedupe;
use jobharvest::html::find_nodes;
use jobharvest::models::{stable_id, SearchConfig};
use jobharvest::scrapers::config::{AdapterKind, EnrichmentConfig, FieldSelector};
use jobharvest::scrapers::http_client::{RawResponse, Transport, TransportError};
use jobharvest::scrapers::pipeline::extract;
use jobharvest::scrapers::{
    Driver, DriverOptions, Fetcher, Jitter, RateLimitConfig, RateLimiter, SiteConfig,
};

const LISTING: &str = r#"
<html><body>
  <ul class="results">
    <li class="job-result" data-testid="result">
      <h3 class="job-title">Senior Rust Engineer</h3>
      <span class="company-name">Acme</span>
      <span class="job-location">Berlin</span>
      <p class="snippet">Build services in Rust with PostgreSQL.</p>
      <a class="job-link" href="/jobs/view/1?trk=search">Apply</a>
    </li>
    <li class="job-result" data-testid="result">
      <h3 class="job-title">Platform Engineer</h3>
      <span class="company-name">Initech</span>
      <p class="snippet">Kubernetes and Docker all day.</p>
      <a class="job-link" href="https://jobs.example/jobs/view/2">Apply</a>
    </li>
  </ul>
</body></html>
"#;

/// Same listing rendered twice, as boards do when a promoted card repeats.
const REPEATED: &str = r#"
<html><body>
  <li class="job-result"><h3 class="job-title">Rust Engineer</h3><span class="company-name">Acme</span></li>
  <li class="job-result"><h3 class="job-title">RUST ENGINEER</h3><span class="company-name">acme</span></li>
</body></html>
"#;

fn board() -> SiteConfig {
    let mut site = SiteConfig::new(
        "Board",
        "https://jobs.example",
        "https://jobs.example/search?q={job_title}&l={location}",
    );
    site.container = FieldSelector::new("li", "data-testid=\"result\"");
    site.title = Some(FieldSelector::new("h3", "class=\"job-title\""));
    site.company = Some(FieldSelector::new("span", "company-name"));
    site.location = Some(FieldSelector::new("span", "job-location"));
    site.description = Some(FieldSelector::new("p", "snippet"));
    site.url = Some(FieldSelector::new("a", "job-link"));
    site
}

#[test]
fn listing_page_yields_one_record_per_container() {
    let site = board();
    let search = SearchConfig::default();
    let html = Html::parse_document(LISTING);

    let records: Vec<_> = find_nodes(html.root_element(), &site.container.tag, &site.container.selector)
        .into_iter()
        .filter_map(|c| extract(c, &site, &search))
        .filter(|job| job.is_valid())
        .collect();

    assert_eq!(records.len(), 2);

    let first = &records[0];
    assert_eq!(first.title, "Senior Rust Engineer");
    assert_eq!(first.company, "Acme");
    assert_eq!(first.location, "Berlin");
    assert_eq!(
        first.url.as_deref(),
        Some("https://jobs.example/jobs/view/1?trk=search")
    );
    assert_eq!(first.skills, vec!["Rust", "SQL", "PostgreSQL"]);

    let second = &records[1];
    assert_eq!(second.location, "Remote");
    assert_eq!(second.url.as_deref(), Some("https://jobs.example/jobs/view/2"));
    assert!(second.skills.contains(&"Kubernetes".to_string()));
    assert_ne!(first.id, second.id);
}

#[test]
fn keyword_filter_drops_non_matching_listings() {
    let site = board();
    let search = SearchConfig {
        keywords: vec!["kubernetes".to_string()],
        ..Default::default()
    };
    let html = Html::parse_document(LISTING);

    let titles: Vec<String> = find_nodes(html.root_element(), "li", "data-testid=\"result\"")
        .into_iter()
        .filter_map(|c| extract(c, &site, &search))
        .map(|job| job.title)
        .collect();
    assert_eq!(titles, vec!["Platform Engineer"]);
}

#[test]
fn repeated_containers_collapse_to_one_record() {
    let mut site = board();
    site.container = FieldSelector::new("li", "job-result");
    let search = SearchConfig::default();
    let html = Html::parse_document(REPEATED);

    let records: Vec<_> = find_nodes(html.root_element(), "li", "job-result")
        .into_iter()
        .filter_map(|c| extract(c, &site, &search))
        .collect();
    assert_eq!(records.len(), 2);

    let unique = dedupe(records);
    assert_eq!(unique.len(), 1);
    assert_eq!(unique[0].title, "Rust Engineer");
}

/// Serves fixed bodies by URL; unknown URLs get a 404.
#[derive(Default)]
struct CannedSite {
    pages: HashMap<String, String>,
    requested: Mutex<Vec<String>>,
}

impl CannedSite {
    fn page(mut self, url: &str, body: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), body.into());
        self
    }
}

#[async_trait]
impl Transport for CannedSite {
    async fn get(
        &self,
        url: &str,
        _headers: &[(String, String)],
    ) -> Result<RawResponse, TransportError> {
        self.requested.lock().unwrap().push(url.to_string());
        Ok(match self.pages.get(url) {
            Some(body) => RawResponse::new(200, body.as_str()),
            None => RawResponse::new(404, ""),
        })
    }
}

fn driver_for(site: SiteConfig, transport: Arc<CannedSite>) -> Driver {
    let jitter = Jitter::seeded(11);
    let limiter = RateLimiter::new(RateLimitConfig::for_sites([&site]), jitter.clone());
    let fetcher = Fetcher::new(transport, limiter, jitter, CancellationToken::new());
    Driver::from_sites(vec![site], fetcher, 2, DriverOptions::default())
}

#[tokio::test(start_paused = true)]
async fn detail_pages_enrich_records() {
    let mut site = board();
    site.enrichment = Some(EnrichmentConfig {
        description: vec![FieldSelector::new("section", "description")],
        company: Some(FieldSelector::new("a", "employer")),
        ..Default::default()
    });

    let detail = r#"<html><body>
        <a class="employer" href="/c/acme">Acme Corporation</a>
        <section class="job-description">
          We write Rust and run it on Kubernetes.
        </section>
    </body></html>"#;
    let transport = Arc::new(
        CannedSite::default()
            .page("https://jobs.example/search?q=Software%20Developer&l=Remote", LISTING)
            .page("https://jobs.example/jobs/view/1?trk=search", detail),
    );

    let driver = driver_for(site, transport.clone());
    let report = driver.run_cycle(&SearchConfig::default()).await;

    assert!(!report.cancelled);
    assert_eq!(report.records.len(), 2);

    let enriched = &report.records[0];
    assert_eq!(enriched.company, "Acme Corporation");
    assert_eq!(enriched.description, "We write Rust and run it on Kubernetes.");
    assert!(enriched.skills.contains(&"Rust".to_string()));
    assert!(enriched.skills.contains(&"Kubernetes".to_string()));
    assert_eq!(
        enriched.id.as_deref(),
        Some(stable_id("Board", "Senior Rust Engineer", "Acme Corporation").as_str())
    );

    // The second detail page 404s; the listing-page record is kept as is.
    let plain = &report.records[1];
    assert_eq!(plain.company, "Initech");
    assert_eq!(plain.description, "Kubernetes and Docker all day.");

    let requested = transport.requested.lock().unwrap();
    assert_eq!(requested[0], "https://jobs.example/search?q=Software%20Developer&l=Remote");
    assert!(requested.contains(&"https://jobs.example/jobs/view/2".to_string()));
}

#[tokio::test(start_paused = true)]
async fn dice_cards_found_by_heuristic_and_enriched_by_job_id() {
    let mut site = SiteConfig::new(
        "Dice",
        "https://www.dice.test",
        "https://www.dice.test/jobs?q={job_title}",
    );
    site.adapter = AdapterKind::Dice;
    site.container = FieldSelector::new("dhi-search-card", "");
    site.container_fallbacks = vec![FieldSelector::new("div", "data-testid=\"search-card\"")];
    site.title = Some(FieldSelector::new("h5", ""));
    site.company = Some(FieldSelector::new("span", "employer"));
    site.enrichment = Some(EnrichmentConfig {
        description: vec![FieldSelector::new("div", "data-testid=\"jobDescriptionHtml\"")],
        min_text_len: 200,
        ..Default::default()
    });

    let listing = r#"<html><body>
        <div class="search-card">
          <h5><a href="/job/detail/abc-123/rust-dev?searchlink=1">Rust Developer</a></h5>
          <span class="employer">Acme</span>
        </div>
    </body></html>"#;
    let wanted = "Rust services engineer. ".repeat(12);
    let sidebar = "Unrelated sidebar text. ".repeat(30);
    let detail = format!(
        r#"<html><body><div id="jobdetail-abc-123">{}</div><div class="sidebar">{}</div></body></html>"#,
        wanted, sidebar
    );
    let transport = Arc::new(
        CannedSite::default()
            .page("https://www.dice.test/jobs?q=Software%20Developer", listing)
            .page(
                "https://www.dice.test/job/detail/abc-123/rust-dev?searchlink=1",
                detail,
            ),
    );

    let driver = driver_for(site, transport);
    let report = driver.run_cycle(&SearchConfig::default()).await;

    assert_eq!(report.records.len(), 1);
    let job = &report.records[0];
    assert_eq!(job.title, "Rust Developer");
    assert_eq!(job.company, "Acme");
    assert_eq!(job.description, wanted.trim());
    assert!(job.skills.contains(&"Rust".to_string()));
}
