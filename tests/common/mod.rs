//! Common test utilities for integration tests.
//!
//! This module provides helpers for creating and managing temporary
//! jj repositories in tests.
//!
//! Note: Each integration test file compiles as a separate crate,
//! so not all helpers are used in every test file. We suppress
//! dead_code warnings at the module level.

#![allow(dead_code)]
#![allow(unused_imports)]

pub mod test_repo;

pub use test_repo::TestRepo;

/// Whether a command-line tool can be started
pub fn has_tool(tool: &str) -> bool {
    std::process::Command::new(tool)
        .arg("--version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

/// Return early from a test when `jj` or `git` is not installed
#[macro_export]
macro_rules! skip_if_no_jj {
    () => {
        if !$crate::common::has_tool("jj") || !$crate::common::has_tool("git") {
            eprintln!("skipping: jj or git not found on PATH");
            return;
        }
    };
}
