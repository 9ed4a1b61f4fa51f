//! Activity extraction against a real git repository.

use std::path::Path;
use std::process::Command;

use libquilter_core::types::activity::ActivityKind;
use libquilter_git::{activity, GitRepo};
use tempfile::TempDir;

const PATCH: &str = "\
From: Foo Bar <foo.bar@example.com>
Date: Tue, 4 Jun 2013 03:35:51 -0500
Subject: cat: hello world

Body line.
";

fn git(dir: &Path, args: &[&str]) {
    let status = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap();
    assert!(
        status.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&status.stderr)
    );
}

fn setup_repo() -> TempDir {
    let temp = TempDir::new().unwrap();
    git(temp.path(), &["init"]);
    git(temp.path(), &["symbolic-ref", "HEAD", "refs/heads/master"]);
    git(temp.path(), &["config", "user.name", "Test"]);
    git(temp.path(), &["config", "user.email", "test@example.com"]);
    temp
}

#[test]
fn test_create_rename_delete_lifecycle() {
    let temp = setup_repo();
    let dir = temp.path();

    std::fs::write(dir.join("a.patch"), PATCH).unwrap();
    std::fs::write(dir.join("README"), "not a patch\n").unwrap();
    git(dir, &["add", "."]);
    git(dir, &["commit", "-m", "add patch"]);

    git(dir, &["mv", "a.patch", "b.patch"]);
    git(dir, &["commit", "-m", "rename patch"]);

    git(dir, &["rm", "b.patch"]);
    git(dir, &["commit", "-m", "drop patch"]);

    let repo = GitRepo::open(dir);
    let events = activity::extract(&repo, "1970-01-01").unwrap();

    // git log is newest-first; block order is preserved
    assert_eq!(events.len(), 3);

    assert_eq!(events[0].kind, ActivityKind::Deleted);
    assert_eq!(events[0].patch.filename, "b.patch");
    // Deleted content must come from the first parent, where it still exists
    assert!(events[0].patch.rev.as_deref().unwrap().ends_with('^'));
    assert_eq!(events[0].patch.subject(), Some("cat: hello world"));

    assert_eq!(events[1].kind, ActivityKind::Renamed);
    assert_eq!(events[1].patch.filename, "b.patch");
    assert_eq!(events[1].old_filename.as_deref(), Some("a.patch"));

    assert_eq!(events[2].kind, ActivityKind::Created);
    assert_eq!(events[2].patch.filename, "a.patch");
    assert_eq!(events[2].old_filename, None);

    assert!(events[2].when <= events[1].when);
    assert!(events[1].when <= events[0].when);
}

#[test]
fn test_window_with_no_activity_is_empty() {
    let temp = setup_repo();
    let dir = temp.path();

    std::fs::write(dir.join("a.patch"), PATCH).unwrap();
    git(dir, &["add", "."]);
    git(dir, &["commit", "-m", "add patch"]);

    let repo = GitRepo::open(dir);
    // Nothing commits in the future
    let events = activity::extract(&repo, "2999-01-01").unwrap();
    assert!(events.is_empty());
}

#[test]
fn test_git_failure_is_fatal() {
    let temp = TempDir::new().unwrap();
    // Not a git repository at all
    let repo = GitRepo::open(temp.path());
    assert!(activity::extract(&repo, "1970-01-01").is_err());
}
