//! TestRepo helper for integration tests.
//!
//! Provides a temporary jj repository for testing fold and pop.

use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

/// A temporary jj repository for testing.
///
/// The repository is automatically cleaned up when the TestRepo is dropped.
pub struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    /// Create a new jj repository in a temporary directory.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");

        let output = Command::new("jj")
            .args(["git", "init"])
            .current_dir(dir.path())
            .output()
            .expect("Failed to execute jj git init");

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            panic!("jj git init failed: {}", stderr);
        }

        let repo = Self { dir };
        repo.jj(&["config", "set", "--repo", "user.name", "Test User"]);
        repo.jj(&["config", "set", "--repo", "user.email", "test@example.com"]);
        repo
    }

    /// Get the path to the repository root.
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Execute a jj command in this repository.
    ///
    /// # Panics
    ///
    /// Panics if the command fails to execute or returns a non-zero exit code.
    pub fn jj(&self, args: &[&str]) -> String {
        let output = Command::new("jj")
            .args(args)
            .current_dir(self.path())
            .output()
            .expect("Failed to execute jj command");

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            panic!(
                "jj {:?} failed with exit code {:?}:\n{}",
                args,
                output.status.code(),
                stderr
            );
        }

        String::from_utf8_lossy(&output.stdout).into_owned()
    }

    /// Write a file in the repository.
    pub fn write_file(&self, name: &str, content: &str) {
        let path = self.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(&path, content).expect("Failed to write file");
    }

    /// Read a file from the repository.
    ///
    /// Returns an empty string if the file does not exist.
    pub fn read_file(&self, name: &str) -> String {
        std::fs::read_to_string(self.path().join(name)).unwrap_or_default()
    }

    /// Full change id of a single revision.
    pub fn change_id(&self, rev: &str) -> String {
        self.jj(&["log", "-r", rev, "--no-graph", "-T", "change_id"])
            .trim()
            .to_string()
    }

    /// Get the description of a revision.
    pub fn get_description(&self, rev: &str) -> String {
        self.jj(&["log", "-r", rev, "--no-graph", "-T", "description"])
            .trim()
            .to_string()
    }

    /// Content of `path` as recorded in `rev`.
    pub fn file_at(&self, rev: &str, path: &str) -> String {
        self.jj(&["file", "show", "-r", rev, path])
    }

    /// Count the number of changes matching a revset.
    pub fn count_changes(&self, revset: &str) -> usize {
        self.jj(&["log", "-r", revset, "--no-graph", "-T", "\"x\""])
            .matches('x')
            .count()
    }

    /// Commit ids of every visible commit plus the working copy, for
    /// comparing whole-repository state.
    pub fn view(&self) -> String {
        let commits = self.jj(&[
            "log",
            "-r",
            "all()",
            "--no-graph",
            "-T",
            "commit_id ++ \"\\n\"",
        ]);
        let working_copy = self.jj(&["log", "-r", "@", "--no-graph", "-T", "commit_id"]);
        format!("{commits}@ {working_copy}")
    }
}

impl Default for TestRepo {
    fn default() -> Self {
        Self::new()
    }
}
