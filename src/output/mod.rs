//! Record sinks for a finished cycle.
//!
//! Each cycle's records go to timestamped JSON and CSV files, and optionally
//! to a SQLite `jobs` table and a results API. Sinks are independent: a
//! failing sink is logged and the others still run.

mod api;
mod csv;
mod json;
mod sqlite;

pub use self::api::ApiSink;
pub use self::csv::{write_csv, CSV_HEADER};
pub use self::json::write_json;
pub use self::sqlite::write_sqlite;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::Settings;
use crate::models::JobRecord;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("results API error: {0}")]
    Api(String),

    #[error("sink task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<reqwest::Error> for OutputError {
    fn from(e: reqwest::Error) -> Self {
        OutputError::Api(e.to_string())
    }
}

/// File stem for a cycle finishing at `now`: `jobs_YYYYMMDD_HHMMSS`.
pub fn timestamped_stem(now: DateTime<Local>) -> String {
    format!("jobs_{}", now.format("%Y%m%d_%H%M%S"))
}

fn ensure_dir(dir: &Path) -> Result<(), OutputError> {
    std::fs::create_dir_all(dir).map_err(|source| OutputError::Io {
        path: dir.to_path_buf(),
        source,
    })
}

/// Where a cycle's records end up.
#[derive(Debug, Clone)]
pub struct Sinks {
    output_dir: PathBuf,
    write_json: bool,
    write_csv: bool,
    sqlite_path: Option<PathBuf>,
    api: Option<ApiSink>,
}

impl Sinks {
    pub fn from_settings(settings: &Settings) -> Result<Self, OutputError> {
        let api = match &settings.api_endpoint {
            Some(endpoint) => Some(ApiSink::new(
                endpoint,
                settings.api_token.clone(),
                settings.request_timeout,
            )?),
            None => None,
        };
        Ok(Self {
            output_dir: settings.output_dir.clone(),
            write_json: settings.write_json,
            write_csv: settings.write_csv,
            sqlite_path: settings.sqlite_path.clone(),
            api,
        })
    }

    /// Write `records` to every configured sink. Returns the number of sinks
    /// that failed.
    pub async fn write_all(&self, records: &[JobRecord]) -> usize {
        if records.is_empty() {
            warn!("No jobs to save");
            return 0;
        }

        let stem = timestamped_stem(Local::now());
        let mut failures = 0;

        if self.write_json {
            let path = self.output_dir.join(format!("{}.json", stem));
            failures += report("JSON", &path, write_json(&path, records));
        }
        if self.write_csv {
            let path = self.output_dir.join(format!("{}.csv", stem));
            failures += report("CSV", &path, write_csv(&path, records));
        }
        if let Some(db_path) = &self.sqlite_path {
            let path = db_path.clone();
            let rows = records.to_vec();
            let result = tokio::task::spawn_blocking(move || write_sqlite(&path, &rows))
                .await
                .unwrap_or_else(|e| Err(OutputError::from(e)));
            failures += report("SQLite", db_path, result.map(|_| ()));
        }
        if let Some(api) = &self.api {
            match api.push(records).await {
                Ok(sent) => info!("Pushed {} jobs to {}", sent, api.endpoint()),
                Err(e) => {
                    error!("Results API push to {} failed: {}", api.endpoint(), e);
                    failures += 1;
                }
            }
        }
        failures
    }
}

fn report(sink: &str, path: &Path, result: Result<(), OutputError>) -> usize {
    match result {
        Ok(()) => {
            info!("Saved {} output to {}", sink, path.display());
            0
        }
        Err(e) => {
            error!("{} output to {} failed: {}", sink, path.display(), e);
            1
        }
    }
}
