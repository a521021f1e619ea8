//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod scrape;
mod sites;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::Settings;
use crate::models::SearchConfig;

#[derive(Parser)]
#[command(name = "jobharvest")]
#[command(about = "Job listing acquisition from job-board search pages")]
#[command(version)]
pub struct Cli {
    /// Site table file (overrides the built-in table)
    #[arg(long, global = true)]
    sites: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape job listings from the configured sites
    Scrape(ScrapeArgs),

    /// List the configured sites
    Sites,
}

#[derive(Args, Debug, Clone)]
struct ScrapeArgs {
    /// Job title to search for
    #[arg(short = 't', long, default_value = "Software Developer")]
    job_title: String,

    /// Location to search in
    #[arg(short, long, default_value = "Remote")]
    location: String,

    /// Only scrape this site (may name a disabled site)
    #[arg(short, long)]
    site: Option<String>,

    /// Keep only listings mentioning one of these keywords (repeatable)
    #[arg(short, long = "keyword")]
    keywords: Vec<String>,

    /// Maximum jobs per cycle
    #[arg(short, long)]
    max_jobs: Option<usize>,

    /// Attempts per request
    #[arg(long)]
    max_retries: Option<u32>,

    /// Directory for timestamped JSON/CSV output
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Also append records to this SQLite database
    #[arg(long)]
    sqlite: Option<PathBuf>,

    /// Hours between cycles (0 = run once)
    #[arg(short, long, default_value = "0")]
    interval: u64,

    /// Do not scan descriptions for skills
    #[arg(long)]
    no_skills: bool,

    /// Skip JSON output
    #[arg(long)]
    no_json: bool,

    /// Skip CSV output
    #[arg(long)]
    no_csv: bool,

    /// Seed for jitter and site order
    #[arg(long)]
    seed: Option<u64>,

    /// Save blocked and unparsable pages here
    #[arg(long)]
    debug_dir: Option<PathBuf>,

    /// POST every record to this results API
    #[arg(long)]
    api_endpoint: Option<String>,
}

impl ScrapeArgs {
    /// Layer flags over environment-derived settings.
    fn apply(&self, settings: &mut Settings) {
        if let Some(max) = self.max_jobs {
            settings.max_jobs = max;
        }
        if let Some(retries) = self.max_retries {
            settings.max_retries = retries;
        }
        if let Some(dir) = &self.output_dir {
            settings.output_dir = dir.clone();
        }
        if let Some(path) = &self.sqlite {
            settings.sqlite_path = Some(path.clone());
        }
        if let Some(dir) = &self.debug_dir {
            settings.debug_dir = Some(dir.clone());
        }
        if let Some(endpoint) = &self.api_endpoint {
            settings.api_endpoint = Some(endpoint.clone());
        }
        if self.seed.is_some() {
            settings.seed = self.seed;
        }
        settings.interval_hours = self.interval;
        settings.write_json &= !self.no_json;
        settings.write_csv &= !self.no_csv;
    }

    fn search(&self) -> SearchConfig {
        SearchConfig {
            job_title: self.job_title.clone(),
            location: self.location.clone(),
            keywords: self
                .keywords
                .iter()
                .filter(|k| !k.trim().is_empty())
                .cloned()
                .collect(),
            target_site: self.site.clone(),
            extract_skills: !self.no_skills,
        }
    }
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::from_env()?;
    if let Some(path) = cli.sites {
        settings.sites_path = Some(path);
    }

    match cli.command {
        Commands::Scrape(args) => {
            args.apply(&mut settings);
            scrape::cmd_scrape(settings, args.search()).await
        }
        Commands::Sites => sites::cmd_sites(&settings),
    }
}
