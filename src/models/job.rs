//! Job listing records.
//!
//! A `JobRecord` is built once per matched listing container and only
//! changes afterwards when a detail-page enrichment is merged into it.

use chrono::Local;
use serde::{Deserialize, Serialize};

/// Timestamp format for `scraped_at` (local time, second precision).
pub const SCRAPED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Number of hex characters kept from the blake3 digest for `job_id`.
const JOB_ID_LEN: usize = 16;

/// A normalized job listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    /// Stable identifier derived from (site, title, company).
    #[serde(rename = "job_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Name of the site the listing came from.
    pub site: String,
    /// Listing URL when one was resolved, otherwise the site name.
    pub source: String,
    /// Resolved listing URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub scraped_at: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posted_date: Option<String>,
}

impl JobRecord {
    /// Create an empty record for a site, stamped with the current local time.
    pub fn new(site: &str) -> Self {
        Self {
            site: site.to_string(),
            source: site.to_string(),
            scraped_at: now_local(),
            ..Default::default()
        }
    }

    /// Set the listing URL. Empty URLs are ignored so `source` keeps the site name.
    pub fn set_url(&mut self, url: String) {
        if url.is_empty() {
            return;
        }
        self.source = url.clone();
        self.url = Some(url);
    }

    /// A record without a title is discarded by the driver.
    pub fn is_valid(&self) -> bool {
        !self.title.trim().is_empty()
    }

    /// Recompute `id` from the current site, title and company.
    pub fn assign_id(&mut self) {
        self.id = Some(stable_id(&self.site, &self.title, &self.company));
    }

    /// Deduplication key: lower-cased title and company.
    pub fn fingerprint(&self) -> String {
        format!(
            "{}|{}",
            self.title.to_lowercase(),
            self.company.to_lowercase()
        )
    }

    /// True if any keyword occurs (case-insensitively) in the title or description.
    /// An empty keyword list accepts everything.
    pub fn matches_keywords(&self, keywords: &[String]) -> bool {
        if keywords.is_empty() {
            return true;
        }
        let title = self.title.to_lowercase();
        let description = self.description.to_lowercase();
        keywords.iter().any(|keyword| {
            let keyword = keyword.to_lowercase();
            title.contains(&keyword) || description.contains(&keyword)
        })
    }

    /// Merge fields found on a detail page, overwriting only what was found.
    pub fn merge(&mut self, enrichment: Enrichment) {
        if let Some(company) = enrichment.company.filter(|s| !s.is_empty()) {
            self.company = company;
        }
        if let Some(location) = enrichment.location.filter(|s| !s.is_empty()) {
            self.location = location;
        }
        if let Some(description) = enrichment.description.filter(|s| !s.is_empty()) {
            self.description = description;
        }
        if let Some(skills) = enrichment.skills.filter(|s| !s.is_empty()) {
            self.skills = skills;
        }
    }

    /// Skills joined the way the CSV sink writes them.
    pub fn skills_joined(&self, separator: &str) -> String {
        self.skills.join(separator)
    }
}

/// Fields recovered from a listing's own detail page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enrichment {
    pub company: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub skills: Option<Vec<String>>,
}

impl Enrichment {
    pub fn is_empty(&self) -> bool {
        self.company.is_none()
            && self.location.is_none()
            && self.description.is_none()
            && self.skills.is_none()
    }
}

/// Current local time formatted for `scraped_at`.
pub fn now_local() -> String {
    Local::now().format(SCRAPED_AT_FORMAT).to_string()
}

/// Identifier derived from (site, title, company).
pub fn stable_id(site: &str, title: &str, company: &str) -> String {
    let hash = blake3::hash(format!("{}:{}:{}", site, title, company).as_bytes());
    hash.to_hex()[..JOB_ID_LEN].to_string()
}
