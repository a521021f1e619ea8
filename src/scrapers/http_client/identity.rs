//! Per-site request identity: headers, referer and synthesized cookies.

use url::Url;

use super::user_agent::{UserAgentPool, DETAIL_USER_AGENT};
use crate::scrapers::config::{CookieSpec, SiteConfig};
use crate::scrapers::pacing::Jitter;

const ACCEPT_FULL: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";
const ACCEPT_MINIMAL: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.5";

/// How one fetch presents itself to a site.
#[derive(Debug, Clone)]
pub struct FetchProfile {
    /// Site name, used as the rate limiter key.
    pub site: String,
    pub user_agents: Vec<String>,
    pub referer: Option<String>,
    pub cookies: Vec<CookieSpec>,
    pub blocked_statuses: Vec<u16>,
    /// Only `User-Agent`, `Accept` and `Accept-Language`, with a fixed agent.
    pub minimal: bool,
}

impl FetchProfile {
    /// Full browser identity for a site.
    pub fn for_site(site: &SiteConfig) -> Self {
        Self {
            site: site.name.clone(),
            user_agents: site.user_agents.clone(),
            referer: site.referer.clone(),
            cookies: site.cookies.clone(),
            blocked_statuses: site.blocked_statuses.clone(),
            minimal: false,
        }
    }

    /// Minimal identity: fixed desktop agent, no cookies, no fingerprint headers.
    pub fn minimal(site: &SiteConfig) -> Self {
        Self {
            site: site.name.clone(),
            user_agents: vec![DETAIL_USER_AGENT.to_string()],
            referer: None,
            cookies: Vec::new(),
            blocked_statuses: site.blocked_statuses.clone(),
            minimal: true,
        }
    }

    /// Bare profile for a site name with default behavior everywhere.
    pub fn named(site: &str) -> Self {
        Self {
            site: site.to_string(),
            user_agents: Vec::new(),
            referer: None,
            cookies: Vec::new(),
            blocked_statuses: Vec::new(),
            minimal: false,
        }
    }

    pub fn is_blocked(&self, status: u16) -> bool {
        status == 403 || self.blocked_statuses.contains(&status)
    }

    /// Agent pool for one fetch, starting at a random position.
    pub fn user_agent_pool(&self, jitter: &Jitter) -> UserAgentPool {
        if self.minimal {
            return UserAgentPool::fixed(DETAIL_USER_AGENT);
        }
        let len = if self.user_agents.is_empty() {
            super::user_agent::GENERAL_USER_AGENTS.len()
        } else {
            self.user_agents.len()
        };
        UserAgentPool::new(&self.user_agents, jitter.index(len))
    }

    /// Headers for one request.
    pub fn headers(&self, url: &str, user_agent: &str, jitter: &Jitter) -> Vec<(String, String)> {
        let mut headers = vec![header("User-Agent", user_agent)];

        if self.minimal {
            headers.push(header("Accept", ACCEPT_MINIMAL));
            headers.push(header("Accept-Language", ACCEPT_LANGUAGE));
            return headers;
        }

        headers.extend([
            header("Accept", ACCEPT_FULL),
            header("Accept-Language", ACCEPT_LANGUAGE),
            header("Upgrade-Insecure-Requests", "1"),
            header("Sec-Fetch-Dest", "document"),
            header("Sec-Fetch-Mode", "navigate"),
            header("Sec-Fetch-Site", "none"),
            header("Sec-Fetch-User", "?1"),
            header("Cache-Control", "max-age=0"),
            header("Viewport-Width", &jitter.range(1200, 1599).to_string()),
            header("DPR", &jitter.range(1, 2).to_string()),
            header("Sec-CH-UA", "\"Chromium\";v=\"110\""),
            header("Sec-CH-UA-Mobile", "?0"),
            header("Sec-CH-UA-Platform", "\"Windows\""),
        ]);

        let cookie = synthesize_cookies(&self.cookies, jitter);
        if !cookie.is_empty() {
            headers.push(header("Cookie", &cookie));
        }

        let referer = self.referer.clone().or_else(|| origin(url));
        if let Some(referer) = referer {
            headers.push(header("Referer", &referer));
        }

        headers
    }
}

fn header(name: &str, value: &str) -> (String, String) {
    (name.to_string(), value.to_string())
}

/// `name=<prefix><random>` pairs joined with `"; "`.
pub fn synthesize_cookies(specs: &[CookieSpec], jitter: &Jitter) -> String {
    specs
        .iter()
        .map(|spec| {
            format!(
                "{}={}{}",
                spec.name,
                spec.prefix,
                jitter.alphanumeric(spec.length)
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Scheme and host of `url`, e.g. `https://example.com`.
fn origin(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let origin = parsed.origin();
    origin.is_tuple().then(|| origin.ascii_serialization())
}
