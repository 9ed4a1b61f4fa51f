//! Git working-copy wrapper.
//!
//! Every operation shells out to the `git` binary with
//! `Command::current_dir`, so no process-global working directory is ever
//! changed. Non-zero exit is always fatal for the caller's refresh.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::error::GitError;

/// A local working copy of a tracked patch repository
#[derive(Debug)]
pub struct GitRepo {
    workdir: PathBuf,
}

/// Read patch file content at a specific revision.
///
/// Split from `GitRepo` so history extraction can be exercised with stub
/// content in tests.
pub trait PatchSource {
    fn patch_at(&self, rev: &str, path: &str) -> Result<String, GitError>;
}

fn run_git(cwd: &Path, args: &[&str]) -> Result<String, GitError> {
    debug!(?args, cwd = %cwd.display(), "running git");
    let output = Command::new("git").args(args).current_dir(cwd).output()?;
    if !output.status.success() {
        return Err(GitError::CommandFailed {
            args: args.iter().map(|a| a.to_string()).collect(),
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

impl GitRepo {
    /// Wrap an existing working copy
    pub fn open(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    /// Clone `clone_url` into `workdir`, creating parent directories
    pub fn clone_from(clone_url: &str, workdir: &Path) -> Result<Self, GitError> {
        let parent = workdir.parent().unwrap_or(Path::new("."));
        std::fs::create_dir_all(parent)?;
        let target = workdir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| ".".to_string());
        run_git(parent, &["clone", clone_url, &target])?;
        Ok(Self::open(workdir))
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    pub fn exists(&self) -> bool {
        self.workdir.join(".git").is_dir()
    }

    /// Fast-forward the tracked branch from its remote
    pub fn sync(&self, branch: &str) -> Result<(), GitError> {
        run_git(&self.workdir, &["checkout", branch])?;
        run_git(&self.workdir, &["fetch", "origin"])?;
        run_git(&self.workdir, &["merge", &format!("origin/{}", branch)])?;
        Ok(())
    }

    /// History with per-file change summaries, rename detection on, one
    /// `<hash> <epoch>` header per commit
    pub fn log_summary(&self, since: &str) -> Result<String, GitError> {
        run_git(
            &self.workdir,
            &["log", "--summary", "-M", "--pretty=%H %ct", "--since", since],
        )
    }

    /// File content at a specific revision
    pub fn show(&self, rev: &str, path: &str) -> Result<String, GitError> {
        run_git(&self.workdir, &["show", &format!("{}:{}", rev, path)])
    }
}

impl PatchSource for GitRepo {
    fn patch_at(&self, rev: &str, path: &str) -> Result<String, GitError> {
        self.show(rev, path)
    }
}
