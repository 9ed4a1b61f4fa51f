use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::reference::ExternalReference;

/// Parsed metadata for one patch file in a series.
///
/// Records are rebuilt wholesale on every refresh pass and never partially
/// updated. `issues` and `reviews` are filled in by the reference resolvers
/// after the text has been parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchRecord {
    /// Filename within the patch repository
    pub filename: String,
    /// 1-based position within the series listing, if read from one
    pub idx: Option<usize>,
    /// Git revision the patch text was read at, if not the working copy
    pub rev: Option<String>,
    pub author: Option<String>,
    pub author_email: Option<String>,
    pub date: Option<DateTime<Utc>>,
    /// Subject line plus body, trailing blank lines stripped
    pub commit_message: String,
    /// Touched file paths, in diff-header order
    pub files: Vec<String>,
    /// Total line count of the raw patch text, blank lines included
    pub line_count: usize,
    pub issues: Vec<ExternalReference>,
    pub reviews: Vec<ExternalReference>,
}

impl PatchRecord {
    /// First line of the commit message, if any
    pub fn subject(&self) -> Option<&str> {
        self.commit_message.lines().next().filter(|s| !s.is_empty())
    }

    /// Text before the first `:` of the subject.
    ///
    /// Only a subject containing a `:` yields a category; everything else is
    /// uncategorized.
    pub fn category(&self) -> Option<&str> {
        self.subject()
            .and_then(|s| s.split_once(':'))
            .map(|(category, _)| category.trim_end())
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn issue_count(&self) -> usize {
        self.issues.len()
    }

    pub fn review_count(&self) -> usize {
        self.reviews.len()
    }

    pub fn all_reviews_merged(&self) -> bool {
        self.reviews.iter().all(|r| r.is_merged())
    }

    /// Browse URL for the patch file under the repository's web frontend
    pub fn url(&self, html_base: &str) -> String {
        format!(
            "{}/blob/master/{}",
            html_base.trim_end_matches('/'),
            self.filename
        )
    }
}
