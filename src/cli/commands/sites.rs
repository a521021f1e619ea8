//! Site table listing.

use console::style;

use crate::config::Settings;
use crate::scrapers::SiteTable;

pub fn cmd_sites(settings: &Settings) -> anyhow::Result<()> {
    let table = SiteTable::load_or_builtin(settings.sites_path.as_deref())?;

    let origin = settings
        .sites_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "built-in".to_string());
    println!("\n{} ({})", style("Job Sites").bold(), origin);
    println!("{}", "-".repeat(72));
    println!(
        "{:<16} {:<8} {:<9} {:>5} {:>6}  Notes",
        "Name", "Enabled", "Adapter", "Pages", "Delay"
    );
    println!("{}", "-".repeat(72));

    for site in &table.sites {
        let enabled = if site.enabled {
            style("yes").green()
        } else {
            style("no").dim()
        };
        let mut notes = Vec::new();
        if site.enrichment.is_some() {
            notes.push("details");
        }
        if site.requires_js {
            notes.push("needs JS");
        }
        println!(
            "{:<16} {:<8} {:<9} {:>5} {:>5}s  {}",
            site.name,
            enabled,
            site.adapter.as_str(),
            site.max_pages,
            site.delay_secs,
            notes.join(", ")
        );
    }

    Ok(())
}
