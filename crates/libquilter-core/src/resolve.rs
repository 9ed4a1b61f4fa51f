//! External-reference extraction and resolution.
//!
//! Two sub-resolvers (issues, reviews) share one shape: a regex extraction
//! step over commit-message lines plus a cached remote fetch. Clients are
//! constructor-injected; the cache guarantees at most one remote fetch per
//! identifier for its lifetime.

use std::collections::HashMap;

use regex::Regex;
use tracing::{debug, warn};

use crate::cache::CacheStore;
use crate::error::QuilterError;
use crate::tracker::{TrackerClient, TrackerError};
use crate::types::reference::{ExternalReference, FetchOutcome, RefKind};

/// Cache blob name for resolved issues
pub const ISSUE_CACHE: &str = "redmine_issues";
/// Cache blob name for resolved reviews
pub const REVIEW_CACHE: &str = "gerrit_reviews";

/// Identifier extraction patterns for one tracker.
///
/// A line can name an id through a free-text tag or through the tracker's
/// own URL; both feed the same id space.
pub struct RefPatterns {
    tag: Regex,
    link: Regex,
}

impl RefPatterns {
    /// Issue tag (`RM #1234`, case-insensitive) or issue-URL patterns
    pub fn issues(tracker_url: &str) -> Result<Self, QuilterError> {
        let tag = compile(r"(?i)RM\s*#*(\d+)")?;
        let link = compile(&format!(
            r"{}/issues/(\d+)",
            regex::escape(tracker_url.trim_end_matches('/'))
        ))?;
        Ok(Self { tag, link })
    }

    /// Review tag (`Upstream-Change-Id: I...`) or review-URL patterns
    pub fn reviews(tracker_url: &str) -> Result<Self, QuilterError> {
        let tag = compile(r"(?i)Upstream-Change-Id:?\s+(\S+)")?;
        let link = compile(&format!(
            r"{}/#q,([^,\s]+)",
            regex::escape(tracker_url.trim_end_matches('/'))
        ))?;
        Ok(Self { tag, link })
    }

    /// Extract an identifier from one commit-message line, if any
    pub fn extract<'a>(&self, line: &'a str) -> Option<&'a str> {
        self.tag
            .captures(line)
            .or_else(|| self.link.captures(line))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

fn compile(pattern: &str) -> Result<Regex, QuilterError> {
    Regex::new(pattern).map_err(|e| QuilterError::ConfigInvalid(format!("bad pattern: {}", e)))
}

/// Lazy write-through map of id to resolved reference, backed by one named
/// cache blob
struct RefCache {
    store: CacheStore,
    name: String,
    data: Option<HashMap<String, ExternalReference>>,
}

impl RefCache {
    fn new(store: CacheStore, name: &str) -> Self {
        Self {
            store,
            name: name.to_string(),
            data: None,
        }
    }

    fn load(&mut self) -> Result<(), QuilterError> {
        if self.data.is_none() {
            let map = match self.store.read(&self.name) {
                Ok(map) => map,
                Err(QuilterError::CacheMiss(_)) => HashMap::new(),
                Err(e) => return Err(e),
            };
            self.data = Some(map);
        }
        Ok(())
    }

    fn get(&mut self, id: &str) -> Result<Option<ExternalReference>, QuilterError> {
        self.load()?;
        Ok(self.data.as_ref().and_then(|map| map.get(id)).cloned())
    }

    fn insert(&mut self, reference: ExternalReference) -> Result<(), QuilterError> {
        self.load()?;
        if let Some(map) = self.data.as_mut() {
            map.insert(reference.id.clone(), reference);
        }
        match self.data.as_ref() {
            Some(map) => self.store.write(&self.name, map),
            None => Ok(()),
        }
    }
}

/// Cached resolver for one tracker's references
pub struct ReferenceResolver<C> {
    client: C,
    kind: RefKind,
    patterns: RefPatterns,
    cache: RefCache,
    ignore_errors: bool,
    /// Set after the first unrecoverable outcome; short-circuits every later
    /// lookup in the same pass
    poisoned: Option<FetchOutcome>,
}

impl<C: TrackerClient> ReferenceResolver<C> {
    pub fn issues(
        client: C,
        tracker_url: &str,
        ignore_errors: bool,
        store: CacheStore,
    ) -> Result<Self, QuilterError> {
        Ok(Self {
            client,
            kind: RefKind::Issue,
            patterns: RefPatterns::issues(tracker_url)?,
            cache: RefCache::new(store, ISSUE_CACHE),
            ignore_errors,
            poisoned: None,
        })
    }

    pub fn reviews(
        client: C,
        tracker_url: &str,
        ignore_errors: bool,
        store: CacheStore,
    ) -> Result<Self, QuilterError> {
        Ok(Self {
            client,
            kind: RefKind::Review,
            patterns: RefPatterns::reviews(tracker_url)?,
            cache: RefCache::new(store, REVIEW_CACHE),
            ignore_errors,
            poisoned: None,
        })
    }

    /// Extract and resolve every reference named by a commit message.
    ///
    /// A record never holds duplicate references to the same id, even when a
    /// tag and a URL independently name it.
    pub fn scan_message(&mut self, message: &str) -> Result<Vec<ExternalReference>, QuilterError> {
        let mut refs: Vec<ExternalReference> = Vec::new();
        for line in message.lines() {
            if let Some(id) = self.patterns.extract(line) {
                if refs.iter().any(|r| r.id == id) {
                    continue;
                }
                let id = id.to_string();
                refs.push(self.resolve(&id)?);
            }
        }
        Ok(refs)
    }

    /// Resolve one identifier, consulting the persistent cache first.
    ///
    /// Success/not-found/forbidden outcomes are permanent for the id and
    /// written through; auth and unknown errors are per-pass and poison the
    /// resolver instead.
    pub fn resolve(&mut self, id: &str) -> Result<ExternalReference, QuilterError> {
        if let Some(cached) = self.cache.get(id)? {
            return Ok(cached);
        }

        if let Some(outcome) = self.poisoned {
            return Ok(ExternalReference::with_outcome(self.kind, id, outcome));
        }

        debug!(id, kind = ?self.kind, "resolving reference");
        let reference = match self.client.fetch(id) {
            Ok(item) => ExternalReference {
                id: id.to_string(),
                kind: self.kind,
                subject: Some(item.subject),
                status: item.status,
                outcome: FetchOutcome::Success,
            },
            Err(TrackerError::NotFound) => {
                ExternalReference::with_outcome(self.kind, id, FetchOutcome::NotFound)
            }
            Err(TrackerError::Forbidden) => {
                ExternalReference::with_outcome(self.kind, id, FetchOutcome::Forbidden)
            }
            Err(TrackerError::Auth(msg)) => {
                if !self.ignore_errors {
                    return Err(QuilterError::TrackerAuth(msg));
                }
                warn!(id, "tracker auth error, short-circuiting further lookups");
                self.poisoned = Some(FetchOutcome::AuthError);
                return Ok(ExternalReference::with_outcome(
                    self.kind,
                    id,
                    FetchOutcome::AuthError,
                ));
            }
            Err(TrackerError::Unknown(msg)) => {
                if !self.ignore_errors {
                    return Err(QuilterError::TrackerUnknown(msg));
                }
                warn!(id, "tracker error, short-circuiting further lookups");
                self.poisoned = Some(FetchOutcome::UnknownError);
                return Ok(ExternalReference::with_outcome(
                    self.kind,
                    id,
                    FetchOutcome::UnknownError,
                ));
            }
        };

        self.cache.insert(reference.clone())?;
        Ok(reference)
    }
}
