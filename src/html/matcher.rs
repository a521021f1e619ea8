//! Tag + selector node matching.
//!
//! Sites are described with loose `(tag, selector)` pairs rather than full CSS
//! selectors, so listings survive small markup changes. See [`NodeSelector`]
//! for how a selector string is interpreted.

use scraper::ElementRef;

use super::extract::extract_text;

const TESTID_MARKER: &str = "data-testid=";
const CLASS_MARKER: &str = "class=";
const CSS_MODULE_MARKER: &str = "css-";

/// A parsed selector string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeSelector {
    /// Empty selector: every node matches.
    Any,
    /// `data-testid="value"`: exact match on the `data-testid` attribute.
    TestId(String),
    /// `class="token"` or a CSS-module class list: substring of `class`.
    Class(String),
    /// Plain token: substring of `class`, else of any attribute value.
    Token(String),
}

impl NodeSelector {
    pub fn parse(selector: &str) -> Self {
        if selector.is_empty() {
            return NodeSelector::Any;
        }
        if selector.contains(TESTID_MARKER) {
            return NodeSelector::TestId(quoted_value(selector, TESTID_MARKER));
        }
        if selector.contains(CLASS_MARKER) {
            return NodeSelector::Class(quoted_value(selector, CLASS_MARKER));
        }
        if selector.contains(CSS_MODULE_MARKER) {
            return NodeSelector::Class(selector.to_string());
        }
        NodeSelector::Token(selector.to_string())
    }

    pub fn matches(&self, element: ElementRef<'_>) -> bool {
        let el = element.value();
        match self {
            NodeSelector::Any => true,
            NodeSelector::TestId(value) => el.attr("data-testid") == Some(value.as_str()),
            NodeSelector::Class(token) => el.attr("class").is_some_and(|c| c.contains(token)),
            NodeSelector::Token(token) => {
                el.attr("class").is_some_and(|c| c.contains(token))
                    || el.attrs().any(|(_, value)| value.contains(token))
            }
        }
    }
}

/// Value following `marker`: the text between the first pair of double
/// quotes, or up to the next whitespace/`]` when unquoted.
fn quoted_value(selector: &str, marker: &str) -> String {
    let Some(start) = selector.find(marker) else {
        return String::new();
    };
    let rest = &selector[start + marker.len()..];
    match rest.strip_prefix('"') {
        Some(quoted) => quoted.split('"').next().unwrap_or_default().to_string(),
        None => rest
            .split(|c: char| c.is_whitespace() || c == ']')
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}

fn tag_matches(element: ElementRef<'_>, tag: &str) -> bool {
    tag.is_empty() || element.value().name().eq_ignore_ascii_case(tag)
}

/// All elements under `root` (inclusive) matching `tag` and `selector`,
/// in document pre-order. Matched nodes are still searched for nested matches.
pub fn find_nodes<'a>(root: ElementRef<'a>, tag: &str, selector: &str) -> Vec<ElementRef<'a>> {
    let selector = NodeSelector::parse(selector);
    root.descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| tag_matches(*el, tag) && selector.matches(*el))
        .collect()
}

/// First match in document order.
pub fn find_first<'a>(root: ElementRef<'a>, tag: &str, selector: &str) -> Option<ElementRef<'a>> {
    let selector = NodeSelector::parse(selector);
    root.descendants()
        .filter_map(ElementRef::wrap)
        .find(|el| tag_matches(*el, tag) && selector.matches(*el))
}

/// Try each `(tag, selector)` pair in order; return the text of the first
/// match whose extracted text is non-empty.
pub fn find_cascade<'a, I>(root: ElementRef<'_>, candidates: I) -> Option<String>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    candidates.into_iter().find_map(|(tag, selector)| {
        find_nodes(root, tag, selector)
            .into_iter()
            .map(extract_text)
            .find(|text| !text.trim().is_empty())
    })
}

/// Text of the `tag` element carrying the most text, if it exceeds `min_len`
/// characters. Last-resort heuristic when no configured selector matches.
pub fn largest_text_block(root: ElementRef<'_>, tag: &str, min_len: usize) -> Option<String> {
    find_nodes(root, tag, "")
        .into_iter()
        .map(extract_text)
        .filter(|text| text.chars().count() > min_len)
        .max_by_key(|text| text.chars().count())
}
