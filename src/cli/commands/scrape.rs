//! Scrape command: one cycle, or a daemon loop of cycles.

use std::sync::Arc;
use std::time::Duration;

use console::style;
use tokio_util::sync::CancellationToken;

use crate::config::Settings;
use crate::models::SearchConfig;
use crate::output::Sinks;
use crate::scrapers::pacing::pause;
use crate::scrapers::{
    CycleReport, Driver, DriverOptions, Fetcher, Jitter, RateLimitConfig, RateLimiter,
    ReqwestTransport, SiteTable,
};

/// Cancel `token` on Ctrl-C so sleeps and fetches stop promptly.
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, finishing current cycle with partial results");
            token.cancel();
        }
    });
}

pub async fn cmd_scrape(settings: Settings, search: SearchConfig) -> anyhow::Result<()> {
    settings.validate()?;
    let table = SiteTable::load_or_builtin(settings.sites_path.as_deref())?;
    let sites = table.select(search.target_site.as_deref())?;
    let sinks = Sinks::from_settings(&settings)?;

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    let jitter = Jitter::new(settings.seed);
    let limiter = RateLimiter::new(RateLimitConfig::for_sites(&sites), jitter.clone());
    let transport = Arc::new(ReqwestTransport::new(
        settings.request_timeout,
        settings.connect_timeout,
    )?);
    let fetcher = Fetcher::new(transport, limiter.clone(), jitter, cancel.clone())
        .with_debug_dir(settings.debug_dir.clone());
    let options = DriverOptions {
        max_jobs: settings.max_jobs,
        ..Default::default()
    };
    let driver = Driver::from_sites(sites, fetcher, settings.max_retries, options);

    println!(
        "{} Searching for {:?} in {:?} on {}",
        style("→").cyan(),
        search.job_title,
        search.location,
        driver.sites().join(", ")
    );
    if settings.interval_hours > 0 {
        println!(
            "{} Running every {}h (Ctrl-C to stop)",
            style("→").cyan(),
            settings.interval_hours
        );
    }

    let mut cycle = 0u64;
    loop {
        cycle += 1;
        let report = driver.run_cycle(&search).await;
        print_report(cycle, &report);

        let failures = sinks.write_all(&report.records).await;
        if failures > 0 {
            println!("{} {} output sink(s) failed", style("!").yellow(), failures);
        }

        for (site, stats) in limiter.all_stats().await {
            tracing::debug!(
                "{}: {} requests, {} blocks, backoff={}, delay={:?}",
                site,
                stats.total_requests,
                stats.block_hits,
                stats.in_backoff,
                stats.current_delay
            );
        }

        if report.cancelled || settings.interval_hours == 0 {
            break;
        }

        println!(
            "{} Sleeping for {}h before next cycle...",
            style("→").dim(),
            settings.interval_hours
        );
        let interval = Duration::from_secs(settings.interval_hours * 3600);
        if pause(interval, &cancel).await.is_err() {
            break;
        }
    }

    Ok(())
}

fn print_report(cycle: u64, report: &CycleReport) {
    println!("\n{} Cycle {}", style("●").cyan(), cycle);
    for site in &report.sites {
        let mark = if site.errors == 0 {
            style("✓").green()
        } else {
            style("!").yellow()
        };
        println!(
            "  {} {:<15} {:>4} jobs  {:>2} pages  {:>2} errors",
            mark, site.site, site.collected, site.pages, site.errors
        );
    }
    println!(
        "{} {} collected, {} unique{}",
        style("✓").green(),
        report.raw_count,
        report.records.len(),
        if report.cancelled {
            " (interrupted)"
        } else {
            ""
        }
    );
}
