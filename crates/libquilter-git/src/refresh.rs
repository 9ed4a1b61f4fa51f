//! Per-repository refresh coordination.
//!
//! For each tracked repository: sync the working copy, re-parse the whole
//! series, resolve references, extract activity, and atomically write the
//! aggregate. No step is retried; a failed repository keeps its previously
//! cached aggregate readable until the next scheduled run succeeds.

use std::path::PathBuf;

use chrono::Utc;
use tracing::info;

use libquilter_core::config::{Config, RepoConfig};
use libquilter_core::resolve::ReferenceResolver;
use libquilter_core::tracker::TrackerClient;
use libquilter_core::types::report::RepoReport;
use libquilter_core::{CacheStore, QuilterError};

use crate::activity;
use crate::error::GitError;
use crate::repo::GitRepo;
use crate::series::{load_series, parse_series_patches};

/// Drives the refresh pipeline for every tracked repository.
///
/// Tracker clients are injected at construction; the coordinator owns the
/// resolvers and the cache store for the lifetime of one batch run.
pub struct Refresher<I, R> {
    cache: CacheStore,
    issues: ReferenceResolver<I>,
    reviews: ReferenceResolver<R>,
    repo_directory: PathBuf,
    lookback: String,
    allow_missing_series: bool,
}

impl<I: TrackerClient, R: TrackerClient> Refresher<I, R> {
    pub fn new(config: &Config, issue_client: I, review_client: R) -> Result<Self, QuilterError> {
        let cache = CacheStore::new(&config.quilter.state_directory);
        let issues = ReferenceResolver::issues(
            issue_client,
            &config.redmine.url,
            config.redmine.ignore_errors,
            cache.clone(),
        )?;
        let reviews = ReferenceResolver::reviews(
            review_client,
            &config.gerrit.url,
            config.gerrit.ignore_errors,
            cache.clone(),
        )?;
        Ok(Self {
            cache,
            issues,
            reviews,
            repo_directory: config.quilter.repo_directory.clone(),
            lookback: config.quilter.lookback.clone(),
            allow_missing_series: config.quilter.allow_missing_series,
        })
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Refresh one repository and write its aggregate to the cache
    pub fn refresh_repo(&mut self, name: &str, repo: &RepoConfig) -> Result<RepoReport, GitError> {
        info!(repo = name, "refreshing");

        let workdir = self.repo_directory.join(repo.local_name());
        let git = GitRepo::open(&workdir);
        let git = if git.exists() {
            git.sync(&repo.branch)?;
            git
        } else {
            GitRepo::clone_from(&repo.clone_url, &workdir)?
        };

        let filenames = load_series(git.workdir(), self.allow_missing_series)?;
        let mut patches = parse_series_patches(git.workdir(), &filenames)?;

        for record in &mut patches {
            record.issues = self.issues.scan_message(&record.commit_message)?;
            record.reviews = self.reviews.scan_message(&record.commit_message)?;
        }

        let activities = activity::extract(&git, &self.lookback)?;

        let report = RepoReport {
            name: name.to_string(),
            patches,
            activities,
            refreshed_at: Utc::now(),
        };
        self.cache.write(name, &report)?;

        info!(
            repo = name,
            patches = report.patches.len(),
            activities = report.activities.len(),
            "refresh complete"
        );
        Ok(report)
    }
}
