//! Shared fixtures for integration tests.
//!
//! Repositories are built with the real `git` CLI in temp directories so
//! the porcelain runs against exactly what a user's git would produce.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use quire::core::config::Config;
use quire::engine::Workspace;
use quire::git::Git;

/// Run a git command in the given directory, panicking on failure.
pub fn run_git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("git command failed to start");

    if !output.status.success() {
        panic!(
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn configure_identity(dir: &Path) {
    run_git(dir, &["config", "user.email", "test@example.com"]);
    run_git(dir, &["config", "user.name", "Test User"]);
    run_git(dir, &["config", "commit.gpgsign", "false"]);
}

/// A non-bare repository in a temp directory.
pub struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    /// Repository on `main` with one commit containing `README.md`.
    pub fn new() -> Self {
        let repo = Self::empty();
        repo.commit_file("README.md", "# Draft\n", "Initial commit");
        repo
    }

    /// Repository on `main` with no commits.
    pub fn empty() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        run_git(dir.path(), &["init", "-b", "main"]);
        configure_identity(dir.path());
        Self { dir }
    }

    /// Clone `url` into a new temp directory.
    pub fn clone_from(url: &Path) -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let url = url.to_string_lossy().to_string();
        run_git(dir.path(), &["clone", "-q", &url, "."]);
        configure_identity(dir.path());
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Porcelain handle with default configuration (no user config files).
    pub fn workspace(&self) -> Workspace {
        Workspace::with_config(self.path(), Config::default()).expect("failed to open workspace")
    }

    pub fn git(&self) -> Git {
        Git::open(self.path()).expect("failed to open test repo")
    }

    pub fn git_cmd(&self, args: &[&str]) -> String {
        run_git(self.path(), args)
    }

    pub fn write(&self, path: &str, content: &str) {
        let full = self.path().join(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(full, content).unwrap();
    }

    pub fn read(&self, path: &str) -> String {
        std::fs::read_to_string(self.path().join(path)).unwrap()
    }

    /// Write, stage and commit one file. Returns the new HEAD.
    pub fn commit_file(&self, path: &str, content: &str, message: &str) -> String {
        self.write(path, content);
        self.git_cmd(&["add", path]);
        self.git_cmd(&["commit", "-q", "-m", message]);
        self.rev("HEAD")
    }

    pub fn rev(&self, rev: &str) -> String {
        self.git_cmd(&["rev-parse", rev])
    }

    /// `None` if the ref doesn't exist.
    pub fn try_rev(&self, rev: &str) -> Option<String> {
        let output = Command::new("git")
            .args(["rev-parse", "--verify", "-q", rev])
            .current_dir(self.path())
            .output()
            .expect("git rev-parse failed to start");
        output
            .status
            .success()
            .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Symbolic HEAD target, `None` when detached.
    pub fn symbolic_head(&self) -> Option<String> {
        let output = Command::new("git")
            .args(["symbolic-ref", "-q", "HEAD"])
            .current_dir(self.path())
            .output()
            .expect("git symbolic-ref failed to start");
        output
            .status
            .success()
            .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    pub fn parents(&self, rev: &str) -> Vec<String> {
        self.git_cmd(&["rev-list", "--parents", "-n", "1", rev])
            .split_whitespace()
            .skip(1)
            .map(String::from)
            .collect()
    }

    pub fn commit_count(&self) -> usize {
        self.git_cmd(&["rev-list", "--all", "--count"])
            .parse()
            .unwrap()
    }

    pub fn has_marker(&self, name: &str) -> bool {
        self.path().join(".git").join(name).exists()
    }

    /// Porcelain status lines, for asserting the tree is untouched.
    pub fn short_status(&self) -> String {
        self.git_cmd(&["status", "--porcelain"])
    }
}

/// A bare "remote", a working clone under test, and a second clone that
/// plays the collaborator pushing from elsewhere.
pub struct RemoteSetup {
    remote: TempDir,
    pub local: TestRepo,
    pub other: TestRepo,
}

impl RemoteSetup {
    pub fn new() -> Self {
        let remote = TempDir::new().expect("failed to create temp dir");
        run_git(remote.path(), &["init", "-q", "--bare", "-b", "main"]);

        let seed = TestRepo::new();
        let url = remote.path().to_string_lossy().to_string();
        seed.git_cmd(&["remote", "add", "origin", &url]);
        seed.git_cmd(&["push", "-q", "origin", "main"]);

        let local = TestRepo::clone_from(remote.path());
        let other = TestRepo::clone_from(remote.path());
        Self {
            remote,
            local,
            other,
        }
    }

    pub fn remote_path(&self) -> PathBuf {
        self.remote.path().to_path_buf()
    }

    /// A ref as the bare remote sees it.
    pub fn remote_rev(&self, rev: &str) -> Option<String> {
        let output = Command::new("git")
            .args(["rev-parse", "--verify", "-q", rev])
            .current_dir(self.remote.path())
            .output()
            .expect("git rev-parse failed to start");
        output
            .status
            .success()
            .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Commit in the collaborator clone and push it.
    pub fn push_from_other(&self, path: &str, content: &str, message: &str) -> String {
        let oid = self.other.commit_file(path, content, message);
        self.other.git_cmd(&["push", "-q", "origin", "HEAD"]);
        oid
    }
}
