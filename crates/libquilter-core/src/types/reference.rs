use serde::{Deserialize, Serialize};

/// Which remote tracker a reference points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefKind {
    Issue,
    Review,
}

/// Terminal classification of a single remote lookup attempt.
///
/// Set once per reference instance; `NotFetched` is the pre-resolve
/// placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchOutcome {
    NotFetched,
    Success,
    NotFound,
    Forbidden,
    AuthError,
    UnknownError,
}

/// An issue or code-review identifier mentioned in a commit message,
/// resolved against a remote tracker.
///
/// Plain data, always serializable; the tracker clients that produce these
/// are never persisted. Equality is by id only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalReference {
    pub id: String,
    pub kind: RefKind,
    pub subject: Option<String>,
    pub status: Option<String>,
    pub outcome: FetchOutcome,
}

impl PartialEq for ExternalReference {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ExternalReference {}

impl ExternalReference {
    /// Pre-resolve placeholder for an extracted identifier
    pub fn new(kind: RefKind, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            subject: None,
            status: None,
            outcome: FetchOutcome::NotFetched,
        }
    }

    pub fn with_outcome(kind: RefKind, id: impl Into<String>, outcome: FetchOutcome) -> Self {
        Self {
            outcome,
            ..Self::new(kind, id)
        }
    }

    /// Title shown to readers; outcome-dependent.
    ///
    /// Only a successful fetch shows the tracker-supplied subject; every
    /// other outcome shows a fixed placeholder.
    pub fn title(&self) -> &str {
        match self.outcome {
            FetchOutcome::Success => self.subject.as_deref().unwrap_or(""),
            FetchOutcome::NotFetched => "<Not Fetched>",
            FetchOutcome::NotFound => "<Not Found>",
            FetchOutcome::Forbidden => "<Forbidden>",
            FetchOutcome::AuthError => "<Auth Error>",
            FetchOutcome::UnknownError => "<Unknown Error>",
        }
    }

    /// Short display label (first five characters of the id)
    pub fn label(&self) -> &str {
        match self.id.char_indices().nth(5) {
            Some((end, _)) => &self.id[..end],
            None => &self.id,
        }
    }

    pub fn is_merged(&self) -> bool {
        self.status
            .as_deref()
            .map(|s| s.eq_ignore_ascii_case("merged"))
            .unwrap_or(false)
    }

    /// Tracker URL for this reference
    pub fn url(&self, tracker_base: &str) -> String {
        let base = tracker_base.trim_end_matches('/');
        match self.kind {
            RefKind::Issue => format!("{}/issues/{}", base, self.id),
            RefKind::Review => format!("{}/#q,{},n,z", base, self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_is_by_id_only() {
        let a = ExternalReference::with_outcome(RefKind::Issue, "123", FetchOutcome::Success);
        let b = ExternalReference::with_outcome(RefKind::Issue, "123", FetchOutcome::NotFound);
        let c = ExternalReference::new(RefKind::Issue, "456");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_title_per_outcome() {
        let mut r = ExternalReference::new(RefKind::Issue, "123");
        assert_eq!(r.title(), "<Not Fetched>");
        r.outcome = FetchOutcome::NotFound;
        assert_eq!(r.title(), "<Not Found>");
        r.outcome = FetchOutcome::Forbidden;
        assert_eq!(r.title(), "<Forbidden>");
        r.outcome = FetchOutcome::AuthError;
        assert_eq!(r.title(), "<Auth Error>");
        r.outcome = FetchOutcome::UnknownError;
        assert_eq!(r.title(), "<Unknown Error>");
        r.outcome = FetchOutcome::Success;
        r.subject = Some("Fix the frobnicator".to_string());
        assert_eq!(r.title(), "Fix the frobnicator");
    }

    #[test]
    fn test_urls() {
        let issue = ExternalReference::new(RefKind::Issue, "42");
        assert_eq!(
            issue.url("https://redmine.example.com/"),
            "https://redmine.example.com/issues/42"
        );
        let review = ExternalReference::new(RefKind::Review, "I1234abcd");
        assert_eq!(
            review.url("https://review.example.org"),
            "https://review.example.org/#q,I1234abcd,n,z"
        );
        assert_eq!(review.label(), "I1234");
    }

    #[test]
    fn test_label_counts_characters_not_bytes() {
        let short = ExternalReference::new(RefKind::Review, "Iñ12");
        assert_eq!(short.label(), "Iñ12");
        let long = ExternalReference::new(RefKind::Review, "aaaañrest");
        assert_eq!(long.label(), "aaaañ");
    }
}
