//! User-level search query.

use serde::{Deserialize, Serialize};

/// What to search for during one scrape cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    pub job_title: String,
    pub location: String,
    /// Allow-list matched against title and description. Empty = accept all.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Restrict the cycle to one site (matched case-insensitively by name).
    #[serde(default)]
    pub target_site: Option<String>,
    /// Scan descriptions against the skill vocabulary when no skills field is found.
    #[serde(default = "default_extract_skills")]
    pub extract_skills: bool,
}

fn default_extract_skills() -> bool {
    true
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            job_title: "Software Developer".to_string(),
            location: "Remote".to_string(),
            keywords: Vec::new(),
            target_site: None,
            extract_skills: true,
        }
    }
}

impl SearchConfig {
    /// Whether a site with this name takes part in the cycle.
    pub fn includes_site(&self, name: &str) -> bool {
        self.target_site
            .as_deref()
            .is_none_or(|target| target.eq_ignore_ascii_case(name))
    }
}
