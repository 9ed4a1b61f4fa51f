//! Configuration loading.
//!
//! TOML, searched along `./quilter.toml`, `~/.quilter.toml`,
//! `/etc/quilter.toml` (first hit wins) unless an explicit path is given.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::QuilterError;

fn default_state_directory() -> PathBuf {
    PathBuf::from("/tmp")
}

fn default_stale_secs() -> u64 {
    600
}

fn default_lookback() -> String {
    "3 months".to_string()
}

fn default_branch() -> String {
    "master".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub quilter: CoreConfig,
    pub redmine: RedmineConfig,
    pub gerrit: GerritConfig,
    #[serde(default)]
    pub repo: BTreeMap<String, RepoConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoreConfig {
    /// Root for the cache directory
    #[serde(default = "default_state_directory")]
    pub state_directory: PathBuf,
    /// Where working copies of tracked repositories are kept
    pub repo_directory: PathBuf,
    /// Maximum age of a cached aggregate before readers flag it stale
    #[serde(default = "default_stale_secs")]
    pub stale_secs: u64,
    /// Activity lookback window, in git `--since` syntax
    #[serde(default = "default_lookback")]
    pub lookback: String,
    /// Treat a missing series listing as an empty series instead of an error
    #[serde(default)]
    pub allow_missing_series: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedmineConfig {
    pub url: String,
    pub key: Option<String>,
    #[serde(default = "default_true")]
    pub verify_cert: bool,
    #[serde(default)]
    pub ignore_errors: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GerritConfig {
    pub url: String,
    #[serde(default)]
    pub ignore_errors: bool,
}

/// One tracked patch repository
#[derive(Debug, Clone, Deserialize)]
pub struct RepoConfig {
    pub clone_url: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Web frontend base URL, used to build patch browse links
    pub html_url: Option<String>,
}

impl RepoConfig {
    /// Directory name of the working copy under `repo_directory`
    pub fn local_name(&self) -> String {
        let trimmed = self.clone_url.trim_end_matches('/');
        let tail = trimmed.rsplit(['/', ':']).next().unwrap_or(trimmed);
        tail.trim_end_matches(".git").to_string()
    }
}

impl Config {
    pub fn load(explicit: Option<&Path>) -> Result<Self, QuilterError> {
        let path = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(QuilterError::ConfigNotFound(path.display().to_string()));
                }
                path.to_path_buf()
            }
            None => find_config()?,
        };
        let text = fs::read_to_string(&path)?;
        Ok(toml::from_str(&text)?)
    }

    /// Tracked repository names, sorted
    pub fn repo_names(&self) -> Vec<&str> {
        self.repo.keys().map(|k| k.as_str()).collect()
    }
}

fn search_path() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("quilter.toml")];
    if let Ok(home) = std::env::var("HOME") {
        paths.push(Path::new(&home).join(".quilter.toml"));
    }
    paths.push(PathBuf::from("/etc/quilter.toml"));
    paths
}

fn find_config() -> Result<PathBuf, QuilterError> {
    let candidates = search_path();
    for candidate in &candidates {
        if candidate.exists() {
            return Ok(candidate.clone());
        }
    }
    let shown: Vec<String> = candidates.iter().map(|p| p.display().to_string()).collect();
    Err(QuilterError::ConfigNotFound(shown.join(", ")))
}
