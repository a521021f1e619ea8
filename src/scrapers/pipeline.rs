//! Projection of listing containers and detail pages into job records.

use scraper::{ElementRef, Html};

use super::config::{EnrichmentConfig, FieldSelector, SiteConfig};
use super::skills::{scan_skills, split_skill_list};
use crate::html::{
    clean_text, extract_attr, extract_text, extract_url, find_cascade, find_first, find_nodes,
    largest_text_block,
};
use crate::models::{Enrichment, JobRecord, SearchConfig};

/// Cleaned text of the first match for `field` inside `root`, if non-empty.
pub fn field_text(root: ElementRef<'_>, field: Option<&FieldSelector>) -> Option<String> {
    let field = field?;
    let node = find_first(root, &field.tag, &field.selector)?;
    let text = clean_text(&extract_text(node));
    (!text.is_empty()).then_some(text)
}

/// Build a record from one listing container.
///
/// Returns `None` when the search has keywords and none of them occur in
/// the title or description. A record without a title is still returned;
/// callers discard it with [`JobRecord::is_valid`].
pub fn extract(
    container: ElementRef<'_>,
    site: &SiteConfig,
    search: &SearchConfig,
) -> Option<JobRecord> {
    let mut job = JobRecord::new(&site.name);

    job.title = field_text(container, site.title.as_ref()).unwrap_or_default();
    job.company = field_text(container, site.company.as_ref()).unwrap_or_default();
    job.location = field_text(container, site.location.as_ref())
        .unwrap_or_else(|| search.location.clone());
    job.description = field_text(container, site.description.as_ref()).unwrap_or_default();
    job.posted_date = posted_date(container, site.date.as_ref());
    job.set_url(listing_url(container, site));
    job.skills = listing_skills(container, site, search, &job.description);
    job.assign_id();

    job.matches_keywords(&search.keywords).then_some(job)
}

/// The configured URL field, falling back to any anchor in the container.
fn listing_url(container: ElementRef<'_>, site: &SiteConfig) -> String {
    let from_field = site
        .url
        .as_ref()
        .and_then(|field| find_first(container, &field.tag, &field.selector))
        .map(|node| extract_url(node, &site.base_url))
        .unwrap_or_default();
    if from_field.is_empty() {
        extract_url(container, &site.base_url)
    } else {
        from_field
    }
}

fn posted_date(container: ElementRef<'_>, field: Option<&FieldSelector>) -> Option<String> {
    let field = field?;
    let node = find_first(container, &field.tag, &field.selector)?;
    let text = clean_text(&extract_text(node));
    if !text.is_empty() {
        return Some(text);
    }
    let datetime = extract_attr(node, "datetime");
    (!datetime.is_empty()).then_some(datetime)
}

fn listing_skills(
    container: ElementRef<'_>,
    site: &SiteConfig,
    search: &SearchConfig,
    description: &str,
) -> Vec<String> {
    let mut skills = field_text(container, site.skills.as_ref())
        .map(|text| split_skill_list(&text))
        .unwrap_or_default();
    if (skills.is_empty() && search.extract_skills) || site.skills_auto {
        for skill in scan_skills(description) {
            if !skills.contains(&skill) {
                skills.push(skill);
            }
        }
    }
    skills
}

/// Extra detail-page hints some adapters can supply.
#[derive(Debug, Clone, Default)]
pub struct DetailHints<'a> {
    /// Identifier to look for in element ids/classes before the largest-text fallback.
    pub job_id: Option<&'a str>,
}

/// Parse a detail page and recover what the enrichment config asks for.
///
/// `Html` is created and dropped here so callers can hold the result across
/// awaits.
pub fn parse_detail(
    body: &str,
    config: &EnrichmentConfig,
    hints: &DetailHints<'_>,
    extract_skills: bool,
) -> Enrichment {
    let html = Html::parse_document(body);
    let root = html.root_element();

    let description = detail_description(root, config, hints);
    let skills = match &description {
        Some(text) if extract_skills => Some(scan_skills(text)).filter(|s| !s.is_empty()),
        _ => None,
    };

    Enrichment {
        company: field_text(root, config.company.as_ref()),
        location: field_text(root, config.location.as_ref()),
        description,
        skills,
    }
}

fn detail_description(
    root: ElementRef<'_>,
    config: &EnrichmentConfig,
    hints: &DetailHints<'_>,
) -> Option<String> {
    let cascade = config
        .description
        .iter()
        .map(|f| (f.tag.as_str(), f.selector.as_str()));
    if let Some(text) = find_cascade(root, cascade) {
        let text = clean_text(&text);
        if !text.is_empty() {
            return Some(text);
        }
    }

    if let Some(id) = hints.job_id.filter(|id| !id.is_empty()) {
        let by_id = find_nodes(root, "div", "")
            .into_iter()
            .filter(|el| {
                let el = el.value();
                el.id().is_some_and(|v| v.contains(id))
                    || el.attr("class").is_some_and(|v| v.contains(id))
            })
            .map(|el| clean_text(&extract_text(el)))
            .find(|text| text.chars().count() > config.min_text_len);
        if by_id.is_some() {
            return by_id;
        }
    }

    largest_text_block(root, "div", config.min_text_len).map(|text| clean_text(&text))
}
