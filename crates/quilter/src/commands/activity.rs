use chrono::{DateTime, NaiveDate, Utc};

use libquilter_core::config::Config;
use libquilter_core::types::report::RepoReport;
use libquilter_core::{CacheStore, QuilterError};
use libquilter_git::GitError;

pub fn run(config: &Config, repo: &str, since: Option<&str>) -> Result<(), GitError> {
    let cache = CacheStore::new(&config.quilter.state_directory);

    let report: RepoReport = match cache.read(repo) {
        Ok(report) => report,
        Err(QuilterError::CacheMiss(_)) => {
            println!("{}: not yet refreshed; run `quilter refresh`", repo);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let events: Vec<_> = match since {
        Some(raw) => report.activities_since(parse_since(raw)?),
        None => report.activities.iter().collect(),
    };

    for event in events {
        println!("{}  {}", event.when.format("%Y-%m-%d %H:%M"), event);
    }
    Ok(())
}

fn parse_since(raw: &str) -> Result<DateTime<Utc>, GitError> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(at) = date.and_hms_opt(0, 0, 0) {
            return Ok(at.and_utc());
        }
    }
    Err(GitError::Parse(format!(
        "invalid --since value '{}': expected RFC 3339 or YYYY-MM-DD",
        raw
    )))
}
