//! Text, attribute and URL extraction from parsed HTML.

use scraper::node::Node;
use scraper::ElementRef;
use url::Url;

/// Elements whose content is never user-visible text.
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Space-joined text of the subtree. Whitespace-only text nodes count as
/// empty and are skipped, so joining never introduces doubled separators.
pub fn extract_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    for child in element.children() {
        let piece = match child.value() {
            Node::Text(text) => {
                let text: &str = text;
                if text.trim().is_empty() {
                    continue;
                }
                text.to_string()
            }
            Node::Element(el) if SKIPPED_ELEMENTS.contains(&el.name()) => continue,
            Node::Element(_) => match ElementRef::wrap(child) {
                Some(child) => extract_text(child),
                None => continue,
            },
            _ => continue,
        };
        if piece.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(&piece);
    }
    out
}

/// Attribute value, or an empty string when absent.
pub fn extract_attr(element: ElementRef<'_>, name: &str) -> String {
    element.value().attr(name).unwrap_or_default().to_string()
}

/// The element's own `href`, else the first descendant anchor's `href`,
/// normalized against `base`. Empty when neither exists.
pub fn extract_url(element: ElementRef<'_>, base: &str) -> String {
    let href = element.value().attr("href").or_else(|| {
        element
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|el| el.value().name() == "a")
            .find_map(|a| a.value().attr("href"))
    });
    match href {
        Some(href) => normalize_url(href.trim(), base),
        None => String::new(),
    }
}

/// Resolve `url` against `base`.
///
/// Absolute http(s) URLs pass through unchanged; `/path` joins the origin
/// of `base`; other relative paths join the directory of `base`.
/// Relative paths follow standard URL resolution (`Url::join`), so dot
/// segments collapse and the result is re-serialized with percent-encoding.
pub fn normalize_url(url: &str, base: &str) -> String {
    if url.is_empty() {
        return String::new();
    }
    if url.starts_with("http://") || url.starts_with("https://") {
        return url.to_string();
    }
    match Url::parse(base).and_then(|base| base.join(url)) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => join_by_hand(url, base),
    }
}

/// Fallback for bases `Url` refuses to parse.
fn join_by_hand(url: &str, base: &str) -> String {
    if let Some(path) = url.strip_prefix('/') {
        let origin_end = base
            .find("://")
            .map(|scheme| {
                let host_start = scheme + 3;
                base[host_start..]
                    .find('/')
                    .map_or(base.len(), |slash| host_start + slash)
            })
            .unwrap_or(base.len());
        return format!("{}/{}", &base[..origin_end], path);
    }
    let host_start = base.find("://").map_or(0, |scheme| scheme + 3);
    match base.rfind('/') {
        Some(slash) if slash >= host_start && host_start > 0 => {
            format!("{}{}", &base[..=slash], url)
        }
        _ => format!("{}/{}", base.trim_end_matches('/'), url),
    }
}

/// Collapse whitespace runs into single spaces with no leading or trailing space.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Fill `{job_title}`/`{location}` in a search template (percent-encoded) and
/// append the 1-based page parameter when one is configured.
pub fn format_search_url(
    template: &str,
    job_title: &str,
    location: &str,
    page_param: Option<&str>,
    page: u32,
) -> String {
    let mut url = template
        .replace("{job_title}", &urlencoding::encode(job_title))
        .replace("{location}", &urlencoding::encode(location));
    if let Some(param) = page_param.filter(|p| !p.is_empty()) {
        let separator = if url.contains('?') { '&' } else { '?' };
        url = format!("{}{}{}={}", url, separator, param, page);
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn first<'a>(html: &'a Html, tag: &str) -> ElementRef<'a> {
        html.root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == tag)
            .unwrap()
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(
            normalize_url("/a/b", "https://h.com/x"),
            "https://h.com/a/b"
        );
        assert_eq!(
            normalize_url("a/b", "https://h.com/x/y"),
            "https://h.com/x/a/b"
        );
        assert_eq!(
            normalize_url("https://other.com", "https://h.com"),
            "https://other.com"
        );
        assert_eq!(normalize_url("a", "https://h.com"), "https://h.com/a");
        assert_eq!(normalize_url("", "https://h.com"), "");
    }

    #[test]
    fn test_normalize_url_resolves_dot_segments() {
        assert_eq!(
            normalize_url("../jobs/1", "https://a.example/search/results"),
            "https://a.example/jobs/1"
        );
        assert_eq!(
            normalize_url("./x y", "https://h.com/d/p"),
            "https://h.com/d/x%20y"
        );
    }

    #[test]
    fn test_join_by_hand() {
        assert_eq!(join_by_hand("/a", "h://x/y"), "h://x/a");
        assert_eq!(join_by_hand("a", "h://x/y/z"), "h://x/y/a");
        assert_eq!(join_by_hand("a", "h://x"), "h://x/a");
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  a   b\n c "), "a b c");
        assert_eq!(clean_text("\t\n"), "");
    }

    #[test]
    fn test_extract_text_joins_children() {
        let html = Html::parse_document(
            "<div><h3> Senior <b>Rust</b></h3>\n  <span></span><p>Engineer</p><script>var x;</script></div>",
        );
        assert_eq!(extract_text(first(&html, "div")), " Senior  Rust Engineer");
        assert_eq!(clean_text(&extract_text(first(&html, "div"))), "Senior Rust Engineer");
    }

    #[test]
    fn test_extract_attr_and_url() {
        let html = Html::parse_document(
            r#"<div data-id="7"><span><a href="/job/7">Go</a></span></div><p>none</p>"#,
        );
        let div = first(&html, "div");
        assert_eq!(extract_attr(div, "data-id"), "7");
        assert_eq!(extract_attr(div, "missing"), "");
        assert_eq!(
            extract_url(div, "https://jobs.example/search"),
            "https://jobs.example/job/7"
        );
        assert_eq!(extract_url(first(&html, "p"), "https://jobs.example"), "");
    }

    #[test]
    fn test_format_search_url() {
        assert_eq!(
            format_search_url(
                "https://s.example/jobs?q={job_title}&l={location}",
                "Software Developer",
                "New York",
                Some("page"),
                2
            ),
            "https://s.example/jobs?q=Software%20Developer&l=New%20York&page=2"
        );
        assert_eq!(
            format_search_url("https://s.example/{job_title}", "rust", "", Some("p"), 1),
            "https://s.example/rust?p=1"
        );
        assert_eq!(
            format_search_url("https://s.example/{job_title}", "rust", "", None, 3),
            "https://s.example/rust"
        );
    }
}
