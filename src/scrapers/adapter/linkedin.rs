//! LinkedIn adapter.
//!
//! Listing pages use the full browser identity. Detail pages are fetched
//! with a minimal one (fixed desktop agent, no synthesized cookies) after a
//! short fixed pause; the richer fingerprint draws 999 responses there.

use std::time::Duration;

use async_trait::async_trait;

use super::{AdapterContext, SiteAdapter};
use crate::models::{Enrichment, JobRecord, SearchConfig};
use crate::scrapers::http_client::FetchProfile;
use crate::scrapers::pipeline::DetailHints;

const DETAIL_PAUSE: Duration = Duration::from_secs(2);

pub struct LinkedInAdapter {
    ctx: AdapterContext,
}

impl LinkedInAdapter {
    pub fn new(ctx: AdapterContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl SiteAdapter for LinkedInAdapter {
    fn context(&self) -> &AdapterContext {
        &self.ctx
    }

    async fn enrich(&self, job: &JobRecord, search: &SearchConfig) -> Option<Enrichment> {
        let profile = FetchProfile::minimal(&self.ctx.site);
        self.ctx
            .enrich_with(job, search, &profile, DetailHints::default(), DETAIL_PAUSE)
            .await
    }
}
