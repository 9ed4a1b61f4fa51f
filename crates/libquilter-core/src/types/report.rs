use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::activity::ActivityEvent;
use crate::types::patch::PatchRecord;
use crate::types::reference::ExternalReference;

/// Rolled-up numbers for one repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverviewCounts {
    pub num_patches: usize,
    pub num_files: usize,
    pub num_lines: usize,
    pub num_reviews: usize,
}

/// The per-repository aggregate persisted to the cache.
///
/// Produced once per refresh cycle and consumed read-only by the
/// presentation process until the next refresh replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoReport {
    pub name: String,
    /// Current patch series, in series-listing order
    pub patches: Vec<PatchRecord>,
    /// Activity events within the lookback window, newest commit first
    pub activities: Vec<ActivityEvent>,
    pub refreshed_at: DateTime<Utc>,
}

impl RepoReport {
    pub fn overview_counts(&self) -> OverviewCounts {
        OverviewCounts {
            num_patches: self.patches.len(),
            num_files: self.patches.iter().map(|p| p.file_count()).sum(),
            num_lines: self.patches.iter().map(|p| p.line_count).sum(),
            num_reviews: self.patches.iter().map(|p| p.review_count()).sum(),
        }
    }

    /// Patch counts per author, most prolific first
    pub fn author_counts(&self) -> Vec<(String, usize)> {
        let mut counter: BTreeMap<&str, usize> = BTreeMap::new();
        for patch in &self.patches {
            let author = patch.author.as_deref().unwrap_or("(unknown)");
            *counter.entry(author).or_default() += 1;
        }
        let mut counts: Vec<(String, usize)> = counter
            .into_iter()
            .map(|(author, count)| (author.to_string(), count))
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        counts
    }

    /// Patch counts per subject-derived category; uncategorized patches are
    /// grouped under `None`
    pub fn category_counts(&self) -> Vec<(Option<String>, usize)> {
        let mut counter: BTreeMap<Option<String>, usize> = BTreeMap::new();
        for patch in &self.patches {
            let category = patch.category().map(|c| c.to_string());
            *counter.entry(category).or_default() += 1;
        }
        counter.into_iter().collect()
    }

    /// Every upstream review across the series, in series order
    pub fn all_reviews(&self) -> Vec<&ExternalReference> {
        self.patches.iter().flat_map(|p| p.reviews.iter()).collect()
    }

    /// Activity events at or after `since`
    pub fn activities_since(&self, since: DateTime<Utc>) -> Vec<&ActivityEvent> {
        self.activities.iter().filter(|a| a.when >= since).collect()
    }
}

/// Whether a cached aggregate is older than the configured staleness window.
///
/// A never-written entry (`None`) is always stale.
pub fn is_stale(last_updated_at: Option<DateTime<Utc>>, now: DateTime<Utc>, stale_secs: u64) -> bool {
    match last_updated_at {
        None => true,
        Some(at) => (now - at).num_seconds() > stale_secs as i64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(author: &str, subject: &str, lines: usize) -> PatchRecord {
        PatchRecord {
            filename: format!("{}.patch", subject.replace([' ', ':'], "-")),
            idx: None,
            rev: None,
            author: Some(author.to_string()),
            author_email: None,
            date: None,
            commit_message: subject.to_string(),
            files: vec!["a".to_string(), "b".to_string()],
            line_count: lines,
            issues: vec![],
            reviews: vec![],
        }
    }

    fn report(patches: Vec<PatchRecord>) -> RepoReport {
        RepoReport {
            name: "nova".to_string(),
            patches,
            activities: vec![],
            refreshed_at: Utc::now(),
        }
    }

    #[test]
    fn test_overview_counts() {
        let r = report(vec![record("a", "x", 10), record("b", "y", 5)]);
        let counts = r.overview_counts();
        assert_eq!(counts.num_patches, 2);
        assert_eq!(counts.num_files, 4);
        assert_eq!(counts.num_lines, 15);
        assert_eq!(counts.num_reviews, 0);
    }

    #[test]
    fn test_author_counts_sorted_by_count() {
        let r = report(vec![
            record("bob", "one", 1),
            record("alice", "two", 1),
            record("bob", "three", 1),
        ]);
        assert_eq!(
            r.author_counts(),
            vec![("bob".to_string(), 2), ("alice".to_string(), 1)]
        );
    }

    #[test]
    fn test_category_counts_group_uncategorized() {
        let r = report(vec![
            record("a", "net: fix routing", 1),
            record("a", "net: more fixes", 1),
            record("a", "no category here", 1),
        ]);
        let counts = r.category_counts();
        assert!(counts.contains(&(Some("net".to_string()), 2)));
        assert!(counts.contains(&(None, 1)));
    }

    #[test]
    fn test_is_stale() {
        let now = Utc::now();
        assert!(is_stale(None, now, 600));
        assert!(is_stale(Some(now - Duration::seconds(601)), now, 600));
        assert!(!is_stale(Some(now - Duration::seconds(599)), now, 600));
    }
}
