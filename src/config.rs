//! Runtime settings for jobharvest.
//!
//! Settings are assembled from defaults, then `.env`/process environment,
//! then CLI flags (applied by the CLI layer). The site table lives in
//! `scrapers::config`.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Default directory for cycle output files.
pub const DEFAULT_OUTPUT_DIR: &str = "./output";

/// Errors raised while assembling configuration, before any network activity.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed site table: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("site {site}: {reason}")]
    InvalidSite { site: String, reason: String },

    #[error("unknown site: {0}")]
    UnknownSite(String),

    #[error("no enabled sites to scrape")]
    NoSites,

    #[error("invalid setting {name}: {reason}")]
    InvalidSetting { name: &'static str, reason: String },
}

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory for timestamped JSON/CSV output.
    pub output_dir: PathBuf,
    /// Global cap on records per cycle.
    pub max_jobs: usize,
    /// Attempts per fetch before giving up.
    pub max_retries: u32,
    /// Total request timeout.
    pub request_timeout: Duration,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Hours between cycles; 0 runs a single cycle.
    pub interval_hours: u64,
    pub write_json: bool,
    pub write_csv: bool,
    /// Optional SQLite database receiving every cycle's records.
    pub sqlite_path: Option<PathBuf>,
    /// Optional results API receiving each record as a JSON POST.
    pub api_endpoint: Option<String>,
    pub api_token: Option<String>,
    /// Where to write response snapshots for blocked/empty pages.
    pub debug_dir: Option<PathBuf>,
    /// Fixed seed for jitter and site order.
    pub seed: Option<u64>,
    /// Site table file; the embedded table is used when absent.
    pub sites_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            max_jobs: 100,
            max_retries: 3,
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            interval_hours: 0,
            write_json: true,
            write_csv: true,
            sqlite_path: None,
            api_endpoint: None,
            api_token: None,
            debug_dir: None,
            seed: None,
            sites_path: None,
        }
    }
}

impl Settings {
    /// Defaults with `JOBHARVEST_*` environment overrides applied.
    ///
    /// Call after `dotenvy::dotenv()` so `.env` values are visible.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut settings = Self::default();

        if let Some(dir) = env_var("JOBHARVEST_OUTPUT_DIR") {
            settings.output_dir = PathBuf::from(dir);
        }
        if let Some(max) = env_var("JOBHARVEST_MAX_JOBS") {
            settings.max_jobs = parse_number("JOBHARVEST_MAX_JOBS", &max)?;
        }
        if let Some(retries) = env_var("JOBHARVEST_MAX_RETRIES") {
            settings.max_retries = parse_number("JOBHARVEST_MAX_RETRIES", &retries)?;
        }
        if let Some(secs) = env_var("JOBHARVEST_TIMEOUT_SECS") {
            settings.request_timeout =
                Duration::from_secs(parse_number("JOBHARVEST_TIMEOUT_SECS", &secs)?);
        }
        settings.sqlite_path = env_var("JOBHARVEST_SQLITE").map(PathBuf::from);
        settings.api_endpoint = env_var("JOBHARVEST_API_ENDPOINT");
        settings.api_token = env_var("JOBHARVEST_API_TOKEN");
        settings.debug_dir = env_var("JOBHARVEST_DEBUG_DIR").map(PathBuf::from);
        settings.sites_path = env_var("JOBHARVEST_SITES").map(PathBuf::from);

        Ok(settings)
    }

    /// Reject settings that would make a cycle meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_jobs == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "max_jobs",
                reason: "must be positive".to_string(),
            });
        }
        if self.max_retries == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "max_retries",
                reason: "must be positive".to_string(),
            });
        }
        if self.api_token.is_some() && self.api_endpoint.is_none() {
            tracing::warn!("API token set without an endpoint; results will not be pushed");
        }
        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_number<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidSetting {
            name,
            reason: format!("expected a number, got {:?}", value),
        })
}
