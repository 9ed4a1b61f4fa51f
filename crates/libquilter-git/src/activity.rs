//! Activity-log extraction from git history.
//!
//! Input is the raw stdout of `git log --summary -M --pretty=%H %ct`:
//! one `<hash> <epoch>` header per commit, followed by indented per-file
//! change lines. Blocks are converted into typed events for every tracked
//! patch file that was created, deleted, or renamed.

use chrono::{DateTime, Utc};
use tracing::debug;

use libquilter_core::parse::parse_patch;
use libquilter_core::types::activity::{ActivityEvent, ActivityKind};
use libquilter_core::types::patch::PatchRecord;

use crate::error::GitError;
use crate::repo::{GitRepo, PatchSource};

/// File extension of tracked patch files
pub const PATCH_EXT: &str = ".patch";

/// One per-file change inside a commit block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileChange {
    Create(String),
    Delete(String),
    Rename { old: String, new: String },
}

/// One commit's worth of summary output
#[derive(Debug, Clone, PartialEq)]
pub struct LogBlock {
    pub rev: String,
    pub when: DateTime<Utc>,
    pub changes: Vec<FileChange>,
}

fn parse_header(line: &str) -> Option<(String, DateTime<Utc>)> {
    let (hash, ts) = line.split_once(' ')?;
    if hash.len() != 40 || !hash.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let secs: i64 = ts.trim().parse().ok()?;
    let when = DateTime::from_timestamp(secs, 0)?;
    Some((hash.to_string(), when))
}

/// Expand a summary rename, handling git's brace compression
/// (`dir/{old => new}.patch`) as well as the plain `old => new` form
fn parse_rename(rest: &str) -> Option<FileChange> {
    // Drop the trailing similarity score, e.g. " (92%)"
    let rest = match rest.rsplit_once(" (") {
        Some((head, tail)) if tail.ends_with("%)") => head,
        _ => rest,
    };

    if let (Some(open), Some(close)) = (rest.find('{'), rest.rfind('}')) {
        if open < close {
            let prefix = &rest[..open];
            let suffix = &rest[close + 1..];
            let (old, new) = rest[open + 1..close].split_once(" => ")?;
            // An empty side (a directory appearing or vanishing) leaves a
            // double slash behind; collapse it.
            return Some(FileChange::Rename {
                old: format!("{}{}{}", prefix, old, suffix).replace("//", "/"),
                new: format!("{}{}{}", prefix, new, suffix).replace("//", "/"),
            });
        }
    }

    let (old, new) = rest.split_once(" => ")?;
    Some(FileChange::Rename {
        old: old.to_string(),
        new: new.to_string(),
    })
}

/// Group raw log output into per-commit blocks
pub fn parse_log(output: &str) -> Vec<LogBlock> {
    let mut blocks: Vec<LogBlock> = Vec::new();
    for line in output.lines() {
        if let Some((rev, when)) = parse_header(line) {
            blocks.push(LogBlock {
                rev,
                when,
                changes: vec![],
            });
            continue;
        }
        let Some(block) = blocks.last_mut() else {
            continue;
        };
        let trimmed = line.trim_start();
        if let Some(rest) = trimmed.strip_prefix("create mode ") {
            if let Some((_, path)) = rest.split_once(' ') {
                block.changes.push(FileChange::Create(path.to_string()));
            }
        } else if let Some(rest) = trimmed.strip_prefix("delete mode ") {
            if let Some((_, path)) = rest.split_once(' ') {
                block.changes.push(FileChange::Delete(path.to_string()));
            }
        } else if let Some(rest) = trimmed.strip_prefix("rename ") {
            if let Some(change) = parse_rename(rest) {
                block.changes.push(change);
            }
        }
    }
    blocks
}

fn is_patch_file(path: &str) -> bool {
    path.ends_with(PATCH_EXT)
}

fn parse_at<S: PatchSource>(source: &S, rev: &str, path: &str) -> Result<PatchRecord, GitError> {
    let raw = source.patch_at(rev, path)?;
    let mut record = parse_patch(path, &raw)?;
    record.rev = Some(rev.to_string());
    Ok(record)
}

/// Convert parsed blocks into events, reading patch content where each file
/// is observable: the commit itself for creations and renames, the first
/// parent for deletions. Entries without the tracked extension are dropped.
pub fn events_from_log<S: PatchSource>(
    source: &S,
    output: &str,
) -> Result<Vec<ActivityEvent>, GitError> {
    let blocks = parse_log(output);
    let mut events = Vec::new();
    for block in &blocks {
        for change in &block.changes {
            let event = match change {
                FileChange::Create(path) if is_patch_file(path) => ActivityEvent {
                    when: block.when,
                    kind: ActivityKind::Created,
                    patch: parse_at(source, &block.rev, path)?,
                    old_filename: None,
                },
                FileChange::Delete(path) if is_patch_file(path) => ActivityEvent {
                    when: block.when,
                    kind: ActivityKind::Deleted,
                    // The file is gone at this commit; read it from the
                    // first parent instead.
                    patch: parse_at(source, &format!("{}^", block.rev), path)?,
                    old_filename: None,
                },
                FileChange::Rename { old, new } if is_patch_file(new) => ActivityEvent {
                    when: block.when,
                    kind: ActivityKind::Renamed,
                    patch: parse_at(source, &block.rev, new)?,
                    old_filename: Some(old.clone()),
                },
                _ => continue,
            };
            events.push(event);
        }
    }
    debug!(events = events.len(), blocks = blocks.len(), "activity extracted");
    Ok(events)
}

/// Extract activity events for the lookback window.
///
/// Restartable: everything is re-derived from history on demand. An empty
/// window is a valid, empty result.
pub fn extract(repo: &GitRepo, since: &str) -> Result<Vec<ActivityEvent>, GitError> {
    let output = repo.log_summary(since)?;
    events_from_log(repo, &output)
}
