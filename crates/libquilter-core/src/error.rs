use std::path::PathBuf;

use thiserror::Error;

/// Main error type for quilter operations
#[derive(Debug, Error)]
pub enum QuilterError {
    #[error("malformed patch '{filename}': {reason}")]
    MalformedPatch { filename: String, reason: String },

    #[error("series file not found: {0}")]
    SeriesNotFound(PathBuf),

    #[error("cache miss: {0}")]
    CacheMiss(String),

    #[error("tracker authentication error: {0}")]
    TrackerAuth(String),

    #[error("tracker error: {0}")]
    TrackerUnknown(String),

    #[error("config file not found in search path: {0}")]
    ConfigNotFound(String),

    #[error("invalid config: {0}")]
    ConfigInvalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl QuilterError {
    /// Get the exit code for the CLI
    pub fn exit_code(&self) -> i32 {
        match self {
            QuilterError::MalformedPatch { .. } => 2,
            QuilterError::ConfigInvalid(_) => 2,
            QuilterError::TomlParse(_) => 2,
            QuilterError::SeriesNotFound(_) => 3,
            QuilterError::CacheMiss(_) => 3,
            QuilterError::ConfigNotFound(_) => 3,
            QuilterError::TrackerAuth(_) => 4,
            QuilterError::TrackerUnknown(_) => 4,
            QuilterError::Io(_) => 5,
            QuilterError::Json(_) => 5,
        }
    }

    /// Create a MalformedPatch error carrying the offending filename
    pub fn malformed(filename: &str, reason: impl Into<String>) -> Self {
        QuilterError::MalformedPatch {
            filename: filename.to_string(),
            reason: reason.into(),
        }
    }
}
