use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::patch::PatchRecord;

/// What happened to a tracked patch file in one commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityKind {
    Created,
    Deleted,
    Renamed,
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActivityKind::Created => "create",
            ActivityKind::Deleted => "delete",
            ActivityKind::Renamed => "rename",
        };
        f.write_str(s)
    }
}

/// A dated creation/deletion/rename observed for a tracked patch file in
/// git history.
///
/// The record is parsed at the commit where the file is observable: at the
/// commit itself for creations and renames, at the first parent for
/// deletions. Events carry no intrinsic ordering; sort by `when` where a
/// presentation needs one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub when: DateTime<Utc>,
    pub kind: ActivityKind,
    pub patch: PatchRecord,
    /// Prior filename, for renames
    pub old_filename: Option<String>,
}

impl fmt::Display for ActivityEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.kind, &self.old_filename) {
            (ActivityKind::Renamed, Some(old)) => {
                write!(f, "{} {} => {}", self.kind, old, self.patch.filename)
            }
            _ => write!(f, "{} {}", self.kind, self.patch.filename),
        }
    }
}
