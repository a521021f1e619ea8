//! SQLite `jobs` table sink.

use std::path::Path;

use rusqlite::{params, Connection};

use super::{ensure_dir, OutputError};
use crate::models::JobRecord;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS jobs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        company TEXT,
        location TEXT,
        description TEXT,
        source TEXT,
        source_url TEXT,
        scraped_at TEXT,
        skills TEXT
    );
"#;

/// Append `records` to the `jobs` table in one transaction, creating the
/// table if needed. Returns the number of rows inserted.
pub fn write_sqlite(path: &Path, records: &[JobRecord]) -> Result<usize, OutputError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent)?;
    }

    let mut conn = Connection::open(path)?;
    conn.execute_batch(SCHEMA)?;

    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO jobs (title, company, location, description, source, source_url, scraped_at, skills)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;
        for job in records {
            stmt.execute(params![
                job.title,
                job.company,
                job.location,
                job.description,
                job.site,
                job.url.as_deref().unwrap_or_default(),
                job.scraped_at,
                job.skills_joined(", "),
            ])?;
        }
    }
    tx.commit()?;
    Ok(records.len())
}
