//! HTTP fetching with browser impersonation, retries and adaptive pacing.

mod fetcher;
mod identity;
mod response;
mod user_agent;

pub use fetcher::{Fetcher, RetryPolicy};
pub use identity::{synthesize_cookies, FetchProfile};
pub use response::{FailureCause, FetchError, RawResponse, TransportError};
pub use user_agent::{UserAgentPool, DETAIL_USER_AGENT, GENERAL_USER_AGENTS};

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

/// Issues a single GET. The fetch loop owns retries, pacing and identity.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<RawResponse, TransportError>;
}

/// `reqwest`-backed transport with a process-wide cookie store.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration, connect_timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<RawResponse, TransportError> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(RawResponse { status, body })
    }
}
