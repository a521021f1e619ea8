//! JSON array sink.

use std::path::Path;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use super::{ensure_dir, OutputError};
use crate::models::JobRecord;

/// Write `records` as a pretty-printed JSON array (4-space indent).
pub fn write_json(path: &Path, records: &[JobRecord]) -> Result<(), OutputError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }

    let mut buf = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    records.serialize(&mut serializer)?;
    buf.push(b'\n');

    std::fs::write(path, buf).map_err(|source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_array_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.json");

        let mut job = JobRecord::new("LinkedIn");
        job.title = "Rust Engineer".to_string();
        job.company = "Acme".to_string();
        job.skills = vec!["Rust".to_string(), "SQL".to_string()];
        job.set_url("https://www.linkedin.com/jobs/view/1".to_string());
        job.assign_id();
        let bare = JobRecord::new("Dice");

        write_json(&path, &[job, bare]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n    {\n        \""));

        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        let items = value.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["title"], "Rust Engineer");
        assert_eq!(items[0]["site"], "LinkedIn");
        assert_eq!(items[0]["source"], "https://www.linkedin.com/jobs/view/1");
        assert_eq!(items[0]["skills"], serde_json::json!(["Rust", "SQL"]));
        assert_eq!(items[0]["job_id"].as_str().unwrap().len(), 16);
        assert!(items[1].get("url").is_none());
        assert_eq!(items[1]["skills"], serde_json::json!([]));
    }
}
