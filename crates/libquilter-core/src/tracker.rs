//! Remote tracker clients.
//!
//! Thin, synchronous HTTP clients behind the `TrackerClient` trait so the
//! resolver can be driven by test doubles. Clients hold live handles and are
//! never persisted; only the plain reference values they produce are.

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::config::{GerritConfig, RedmineConfig};
use crate::error::QuilterError;

/// Subject/status pair returned by a successful tracker lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerItem {
    pub subject: String,
    pub status: Option<String>,
}

/// Closed classification of a failed tracker lookup
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("not found")]
    NotFound,
    #[error("forbidden")]
    Forbidden,
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("unexpected tracker response: {0}")]
    Unknown(String),
}

/// Injected capability: given an id, return a subject/status pair or a
/// typed failure
pub trait TrackerClient {
    fn fetch(&self, id: &str) -> Result<TrackerItem, TrackerError>;
}

fn classify_status(status: reqwest::StatusCode) -> Option<TrackerError> {
    if status.is_success() {
        return None;
    }
    Some(match status.as_u16() {
        404 => TrackerError::NotFound,
        403 => TrackerError::Forbidden,
        401 => TrackerError::Auth("HTTP 401 Unauthorized".to_string()),
        code => TrackerError::Unknown(format!("HTTP {}", code)),
    })
}

/// Redmine-style issue tracker client
pub struct RedmineClient {
    http: reqwest::blocking::Client,
    url: String,
    key: Option<String>,
}

#[derive(Deserialize)]
struct IssueEnvelope {
    issue: IssueBody,
}

#[derive(Deserialize)]
struct IssueBody {
    subject: String,
    status: Option<IssueStatus>,
}

#[derive(Deserialize)]
struct IssueStatus {
    name: String,
}

impl RedmineClient {
    pub fn new(config: &RedmineConfig) -> Result<Self, QuilterError> {
        let http = reqwest::blocking::Client::builder()
            .danger_accept_invalid_certs(!config.verify_cert)
            .build()
            .map_err(|e| QuilterError::TrackerUnknown(e.to_string()))?;
        Ok(Self {
            http,
            url: config.url.trim_end_matches('/').to_string(),
            key: config.key.clone(),
        })
    }
}

impl TrackerClient for RedmineClient {
    fn fetch(&self, id: &str) -> Result<TrackerItem, TrackerError> {
        let url = format!("{}/issues/{}.json", self.url, id);
        debug!(id, "fetching redmine issue");

        let mut request = self.http.get(&url);
        if let Some(key) = &self.key {
            request = request.header("X-Redmine-API-Key", key);
        }
        let response = request
            .send()
            .map_err(|e| TrackerError::Unknown(e.to_string()))?;

        if let Some(err) = classify_status(response.status()) {
            return Err(err);
        }
        let envelope: IssueEnvelope = response
            .json()
            .map_err(|e| TrackerError::Unknown(e.to_string()))?;
        Ok(TrackerItem {
            subject: envelope.issue.subject,
            status: envelope.issue.status.map(|s| s.name),
        })
    }
}

/// Gerrit-style code-review client
pub struct GerritClient {
    http: reqwest::blocking::Client,
    url: String,
}

#[derive(Deserialize)]
struct ChangeBody {
    subject: String,
    status: Option<String>,
}

impl GerritClient {
    pub fn new(config: &GerritConfig) -> Result<Self, QuilterError> {
        let http = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| QuilterError::TrackerUnknown(e.to_string()))?;
        Ok(Self {
            http,
            url: config.url.trim_end_matches('/').to_string(),
        })
    }
}

impl TrackerClient for GerritClient {
    fn fetch(&self, id: &str) -> Result<TrackerItem, TrackerError> {
        let url = format!("{}/changes/{}", self.url, id);
        debug!(id, "fetching gerrit change");

        let response = self
            .http
            .get(&url)
            .send()
            .map_err(|e| TrackerError::Unknown(e.to_string()))?;

        if let Some(err) = classify_status(response.status()) {
            return Err(err);
        }
        let text = response
            .text()
            .map_err(|e| TrackerError::Unknown(e.to_string()))?;
        // Gerrit prefixes JSON responses with an XSSI guard
        let json = text
            .trim_start()
            .strip_prefix(")]}'")
            .unwrap_or(&text)
            .trim_start();
        let change: ChangeBody =
            serde_json::from_str(json).map_err(|e| TrackerError::Unknown(e.to_string()))?;
        Ok(TrackerItem {
            subject: change.subject,
            status: change.status,
        })
    }
}
