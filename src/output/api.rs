//! Results API sink: one JSON POST per record.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

use super::OutputError;
use crate::models::JobRecord;

#[derive(Debug, Clone)]
pub struct ApiSink {
    client: Client,
    endpoint: String,
    token: Option<String>,
}

impl ApiSink {
    pub fn new(endpoint: &str, token: Option<String>, timeout: Duration) -> Result<Self, OutputError> {
        url::Url::parse(endpoint)
            .map_err(|e| OutputError::Api(format!("invalid endpoint {}: {}", endpoint, e)))?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST every record. Individual failures are logged; the push fails
    /// only when no record was accepted.
    pub async fn push(&self, records: &[JobRecord]) -> Result<usize, OutputError> {
        let mut sent = 0;
        let mut last_error = None;
        for job in records {
            match self.post(job).await {
                Ok(()) => sent += 1,
                Err(e) => {
                    warn!("Failed to push {:?}: {}", job.title, e);
                    last_error = Some(e);
                }
            }
        }
        match last_error {
            Some(e) if sent == 0 => Err(e),
            _ => Ok(sent),
        }
    }

    async fn post(&self, job: &JobRecord) -> Result<(), OutputError> {
        let mut request = self.client.post(&self.endpoint).json(job);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?.error_for_status()?;
        debug!("Pushed {:?}: HTTP {}", job.title, response.status());
        Ok(())
    }
}
