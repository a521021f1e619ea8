//! Duplicate removal across a cycle's records.

use std::collections::HashSet;

use crate::models::JobRecord;

/// Keep the first record for each (title, company) fingerprint, preserving order.
pub fn dedupe(records: Vec<JobRecord>) -> Vec<JobRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|job| seen.insert(job.fingerprint()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(title: &str, company: &str, site: &str) -> JobRecord {
        JobRecord {
            title: title.to_string(),
            company: company.to_string(),
            ..JobRecord::new(site)
        }
    }

    #[test]
    fn test_case_insensitive_fingerprint() {
        let unique = dedupe(vec![job("A", "X", "one"), job("a", "x", "two")]);
        assert_eq!(unique.len(), 1);
        assert_eq!(unique[0].site, "one");
    }

    #[test]
    fn test_order_preserved_and_idempotent() {
        let records = vec![
            job("B", "Y", "s"),
            job("A", "X", "s"),
            job("b", "y", "s"),
            job("C", "Z", "s"),
        ];
        let once = dedupe(records);
        let titles: Vec<&str> = once.iter().map(|j| j.title.as_str()).collect();
        assert_eq!(titles, vec!["B", "A", "C"]);
        assert_eq!(dedupe(once.clone()), once);
    }

    #[test]
    fn test_same_title_different_company_kept() {
        assert_eq!(dedupe(vec![job("A", "X", "s"), job("A", "Y", "s")]).len(), 2);
    }
}
