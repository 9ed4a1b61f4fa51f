//! Series-listing loading.
//!
//! A `series` file at the repository root names the current patch queue,
//! one filename per line, in application order.

use std::fs;
use std::path::Path;

use tracing::warn;

use libquilter_core::parse::parse_patch;
use libquilter_core::types::patch::PatchRecord;
use libquilter_core::QuilterError;

/// Read the ordered patch filenames from the series listing.
///
/// A missing listing is `SeriesNotFound` unless the deployment tolerates it,
/// in which case the series is empty.
pub fn load_series(repo_root: &Path, allow_missing: bool) -> Result<Vec<String>, QuilterError> {
    let path = repo_root.join("series");
    if !path.exists() {
        if allow_missing {
            warn!(path = %path.display(), "series listing missing, treating as empty");
            return Ok(vec![]);
        }
        return Err(QuilterError::SeriesNotFound(path));
    }

    let text = fs::read_to_string(path)?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Parse every patch in the series from the working copy, assigning 1-based
/// series positions
pub fn parse_series_patches(
    repo_root: &Path,
    filenames: &[String],
) -> Result<Vec<PatchRecord>, QuilterError> {
    let mut patches = Vec::with_capacity(filenames.len());
    for (i, filename) in filenames.iter().enumerate() {
        let raw = fs::read_to_string(repo_root.join(filename))?;
        let mut record = parse_patch(filename, &raw)?;
        record.idx = Some(i + 1);
        patches.push(record);
    }
    Ok(patches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PATCH: &str = "\
From: A <a@example.com>
Date: Tue, 4 Jun 2013 03:35:51 -0500
Subject: cat: hello

diff --git a/x.txt b/x.txt
";

    #[test]
    fn test_missing_series_is_an_error_by_default() {
        let temp = TempDir::new().unwrap();
        let err = load_series(temp.path(), false).unwrap_err();
        assert!(matches!(err, QuilterError::SeriesNotFound(_)));
    }

    #[test]
    fn test_missing_series_tolerated_when_configured() {
        let temp = TempDir::new().unwrap();
        assert!(load_series(temp.path(), true).unwrap().is_empty());
    }

    #[test]
    fn test_series_order_and_blank_lines() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("series"), "b.patch\n\na.patch\n").unwrap();
        assert_eq!(
            load_series(temp.path(), false).unwrap(),
            vec!["b.patch", "a.patch"]
        );
    }

    #[test]
    fn test_parse_series_assigns_idx() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("one.patch"), PATCH).unwrap();
        fs::write(temp.path().join("two.patch"), PATCH).unwrap();
        let names = vec!["one.patch".to_string(), "two.patch".to_string()];

        let patches = parse_series_patches(temp.path(), &names).unwrap();
        assert_eq!(patches.len(), 2);
        assert_eq!(patches[0].idx, Some(1));
        assert_eq!(patches[0].filename, "one.patch");
        assert_eq!(patches[1].idx, Some(2));
        assert_eq!(patches[1].category(), Some("cat"));
    }
}
