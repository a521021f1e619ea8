//! Browser user agents for request impersonation.

/// Fixed desktop Chrome agent used for minimal (detail page) identities.
pub const DETAIL_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// General pool for sites without their own list.
pub const GENERAL_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:122.0) Gecko/20100101 Firefox/122.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (iPad; CPU OS 16_6 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.6 Mobile/15E148 Safari/604.1",
];

/// A user agent pool with a current position.
///
/// Rotation walks the pool in order so a blocked agent is never retried
/// immediately while others remain.
#[derive(Debug, Clone)]
pub struct UserAgentPool {
    agents: Vec<String>,
    current: usize,
}

impl UserAgentPool {
    /// Pool from a site list, or the general pool when the list is empty.
    pub fn new(site_agents: &[String], start: usize) -> Self {
        let agents: Vec<String> = if site_agents.is_empty() {
            GENERAL_USER_AGENTS.iter().map(|s| s.to_string()).collect()
        } else {
            site_agents.to_vec()
        };
        let current = start % agents.len();
        Self { agents, current }
    }

    /// Single fixed agent.
    pub fn fixed(agent: &str) -> Self {
        Self {
            agents: vec![agent.to_string()],
            current: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn current(&self) -> &str {
        &self.agents[self.current]
    }

    /// Move to the next agent and return it.
    pub fn rotate(&mut self) -> &str {
        self.current = (self.current + 1) % self.agents.len();
        self.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_site_list_uses_general_pool() {
        let pool = UserAgentPool::new(&[], 0);
        assert_eq!(pool.len(), GENERAL_USER_AGENTS.len());
        assert!(pool.current().contains("Mozilla"));
    }

    #[test]
    fn test_rotation_wraps() {
        let agents = vec!["A".to_string(), "B".to_string()];
        let mut pool = UserAgentPool::new(&agents, 3);
        assert_eq!(pool.current(), "B");
        assert_eq!(pool.rotate(), "A");
        assert_eq!(pool.rotate(), "B");
    }

    #[test]
    fn test_fixed_pool_never_changes() {
        let mut pool = UserAgentPool::fixed(DETAIL_USER_AGENT);
        assert_eq!(pool.rotate(), DETAIL_USER_AGENT);
    }
}
