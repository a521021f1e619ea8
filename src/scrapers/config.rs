//! Site table configuration.
//!
//! These structs define the TOML-configurable behavior for each job board:
//! where to search, how to paginate, how to look like a browser, and which
//! `(tag, selector)` pairs locate each field of a listing.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Site table shipped with the binary.
const BUILTIN_SITES: &str = include_str!("../../config/sites.toml");

/// Placeholder that every search template must contain.
const JOB_TITLE_PLACEHOLDER: &str = "{job_title}";

/// A `(tag, selector)` pair. Empty tag = any element, empty selector = any node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSelector {
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub selector: String,
}

impl FieldSelector {
    pub fn new(tag: &str, selector: &str) -> Self {
        Self {
            tag: tag.to_string(),
            selector: selector.to_string(),
        }
    }
}

/// Which adapter drives a site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterKind {
    /// Fully configuration-driven.
    #[default]
    Generic,
    /// Minimal identity on detail pages.
    #[serde(rename = "linkedin")]
    LinkedIn,
    /// Container cascade plus session-reset cooldown on detail pages.
    Dice,
}

impl AdapterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdapterKind::Generic => "generic",
            AdapterKind::LinkedIn => "linkedin",
            AdapterKind::Dice => "dice",
        }
    }
}

/// A cookie synthesized fresh for every request: `name=<prefix><random alnum>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieSpec {
    pub name: String,
    #[serde(default)]
    pub prefix: String,
    pub length: usize,
}

/// Detail-page enrichment settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    /// Ordered description cascade; first non-empty match wins.
    #[serde(default)]
    pub description: Vec<FieldSelector>,
    #[serde(default)]
    pub company: Option<FieldSelector>,
    #[serde(default)]
    pub location: Option<FieldSelector>,
    /// Minimum text length for the largest-text-block fallback.
    #[serde(default = "default_min_text_len")]
    pub min_text_len: usize,
    /// Pause before each detail request, in milliseconds.
    #[serde(default)]
    pub delay_ms: u64,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            description: Vec::new(),
            company: None,
            location: None,
            min_text_len: default_min_text_len(),
            delay_ms: 0,
        }
    }
}

fn default_min_text_len() -> usize {
    100
}

fn default_true() -> bool {
    true
}

fn default_max_pages() -> u32 {
    1
}

fn default_delay_secs() -> u64 {
    2
}

fn default_rate_limit_secs() -> u64 {
    5
}

/// One job board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfig {
    pub name: String,
    pub base_url: String,
    /// Search template with `{job_title}` and `{location}` placeholders.
    pub search_url: String,
    #[serde(default)]
    pub adapter: AdapterKind,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Informational only; script execution is not supported.
    #[serde(default)]
    pub requires_js: bool,
    #[serde(default)]
    pub pagination_param: Option<String>,
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    /// Pause between pages and after the site, in seconds (plus jitter).
    #[serde(default = "default_delay_secs")]
    pub delay_secs: u64,
    /// Base delay for the per-site rate-limit gate, in seconds.
    #[serde(default = "default_rate_limit_secs")]
    pub rate_limit_secs: u64,
    /// Referer header. Defaults to the request URL's origin.
    #[serde(default)]
    pub referer: Option<String>,
    /// Site-specific user agent pool. Empty = general pool.
    #[serde(default)]
    pub user_agents: Vec<String>,
    /// Status codes besides 403 that mean "blocked" (e.g. LinkedIn's 999).
    #[serde(default)]
    pub blocked_statuses: Vec<u16>,
    #[serde(default)]
    pub cookies: Vec<CookieSpec>,

    #[serde(default)]
    pub container: FieldSelector,
    #[serde(default)]
    pub container_fallbacks: Vec<FieldSelector>,
    #[serde(default)]
    pub title: Option<FieldSelector>,
    #[serde(default)]
    pub company: Option<FieldSelector>,
    #[serde(default)]
    pub location: Option<FieldSelector>,
    #[serde(default)]
    pub description: Option<FieldSelector>,
    #[serde(default)]
    pub url: Option<FieldSelector>,
    #[serde(default)]
    pub date: Option<FieldSelector>,
    #[serde(default)]
    pub skills: Option<FieldSelector>,
    /// Always scan the description against the skill vocabulary.
    #[serde(default)]
    pub skills_auto: bool,

    #[serde(default)]
    pub enrichment: Option<EnrichmentConfig>,
}

impl SiteConfig {
    /// Minimal config for a site; everything else takes its default.
    pub fn new(name: &str, base_url: &str, search_url: &str) -> Self {
        Self {
            name: name.to_string(),
            base_url: base_url.to_string(),
            search_url: search_url.to_string(),
            adapter: AdapterKind::Generic,
            enabled: true,
            requires_js: false,
            pagination_param: None,
            max_pages: default_max_pages(),
            delay_secs: default_delay_secs(),
            rate_limit_secs: default_rate_limit_secs(),
            referer: None,
            user_agents: Vec::new(),
            blocked_statuses: Vec::new(),
            cookies: Vec::new(),
            container: FieldSelector::default(),
            container_fallbacks: Vec::new(),
            title: None,
            company: None,
            location: None,
            description: None,
            url: None,
            date: None,
            skills: None,
            skills_auto: false,
            enrichment: None,
        }
    }

    /// Whether `status` means the site is blocking us.
    pub fn is_blocked_status(&self, status: u16) -> bool {
        status == 403 || self.blocked_statuses.contains(&status)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidSite {
            site: self.name.clone(),
            reason: reason.to_string(),
        };
        if self.name.trim().is_empty() {
            return Err(invalid("name is empty"));
        }
        if !self.search_url.contains(JOB_TITLE_PLACEHOLDER) {
            return Err(invalid("search_url has no {job_title} placeholder"));
        }
        if self.max_pages == 0 {
            return Err(invalid("max_pages must be at least 1"));
        }
        if url::Url::parse(&self.base_url).is_err() {
            return Err(invalid("base_url is not an absolute URL"));
        }
        Ok(())
    }
}

/// The full set of configured sites.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteTable {
    #[serde(default)]
    pub sites: Vec<SiteConfig>,
}

impl SiteTable {
    /// The table embedded at build time.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_toml_str(BUILTIN_SITES)
    }

    /// Parse and validate a TOML site table.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let table: SiteTable = toml::from_str(contents)?;
        table.validate()?;
        Ok(table)
    }

    /// Load a site table from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Load from `path` when given, else the builtin table.
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Self::builtin(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sites.iter().try_for_each(SiteConfig::validate)
    }

    /// Enabled sites, in table order.
    pub fn enabled(&self) -> Vec<&SiteConfig> {
        self.sites.iter().filter(|s| s.enabled).collect()
    }

    /// Look up a site by name (case-insensitive).
    pub fn find(&self, name: &str) -> Option<&SiteConfig> {
        self.sites
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }

    /// Sites taking part in a cycle. A named target may be a disabled site;
    /// naming it explicitly opts in.
    pub fn select(&self, target: Option<&str>) -> Result<Vec<SiteConfig>, ConfigError> {
        let selected: Vec<SiteConfig> = match target {
            Some(name) => vec![self
                .find(name)
                .cloned()
                .ok_or_else(|| ConfigError::UnknownSite(name.to_string()))?],
            None => self.enabled().into_iter().cloned().collect(),
        };
        if selected.is_empty() {
            return Err(ConfigError::NoSites);
        }
        Ok(selected)
    }
}
