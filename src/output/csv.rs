//! CSV sink.

use std::path::Path;

use super::{ensure_dir, OutputError};
use crate::models::JobRecord;

pub const CSV_HEADER: [&str; 8] = [
    "Title",
    "Company",
    "Location",
    "Description",
    "Source",
    "Source URL",
    "Scraped At",
    "Skills",
];

/// Separator between skills inside the `Skills` column.
const SKILL_SEPARATOR: &str = "; ";

/// Write `records` with a header row. Fields with commas, quotes or
/// newlines are quoted with inner quotes doubled.
pub fn write_csv(path: &Path, records: &[JobRecord]) -> Result<(), OutputError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }

    let mut writer = ::csv::Writer::from_path(path)?;
    writer.write_record(CSV_HEADER)?;
    for job in records {
        writer.write_record([
            job.title.as_str(),
            job.company.as_str(),
            job.location.as_str(),
            job.description.as_str(),
            job.site.as_str(),
            job.url.as_deref().unwrap_or_default(),
            job.scraped_at.as_str(),
            job.skills_joined(SKILL_SEPARATOR).as_str(),
        ])?;
    }
    writer.flush().map_err(|source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    })
}
