//! jj-specific constants
//!
//! Centralized definitions for jj command names, flags, and special values.

/// jj command binary name
pub const JJ_COMMAND: &str = "jj";

/// jj subcommands
pub mod commands {
    pub const LOG: &str = "log";
    pub const DIFF: &str = "diff";
    pub const NEW: &str = "new";
    pub const EDIT: &str = "edit";
    pub const COMMIT: &str = "commit";
    pub const SQUASH: &str = "squash";
    pub const REBASE: &str = "rebase";
    pub const ROOT: &str = "root";
    pub const OP: &str = "op";
    pub const OP_LOG: &str = "log";
    pub const OP_RESTORE: &str = "restore";
}

/// jj command flags
pub mod flags {
    /// Disable color output for parsing (global flag, safe for all commands)
    pub const NO_COLOR: &str = "--color=never";
    /// Disable graph output for parsing (jj log only, NOT a global flag)
    pub const NO_GRAPH: &str = "--no-graph";
    /// Specify template
    pub const TEMPLATE: &str = "-T";
    /// Specify revision/revset
    pub const REVISION: &str = "-r";
    /// Specify repository path
    pub const REPO_PATH: &str = "-R";
    /// Description for new/commit
    pub const MESSAGE: &str = "-m";
    /// Limit the number of log entries
    pub const LIMIT: &str = "--limit";
    /// Git-style unified diff output
    pub const GIT: &str = "--git";
    /// Insert a new or rebased change between a revision and its parents
    pub const INSERT_BEFORE: &str = "--insert-before";
    /// Squash sources
    pub const FROM: &str = "--from";
    /// Squash destination
    pub const INTO: &str = "--into";
    /// Keep the destination's description when squashing
    pub const USE_DESTINATION_MESSAGE: &str = "--use-destination-message";
    /// Separates options from fileset arguments
    pub const END_OF_OPTIONS: &str = "--";
}

/// Revset expressions
pub mod revsets {
    /// The working-copy change
    pub const WORKING_COPY: &str = "@";

    /// Every descendant of `origin` plus the mutable history between the
    /// immutable heads and `origin`.
    pub fn chain_neighbourhood(origin: &str) -> String {
        format!("descendants({origin})|(heads(immutable())::ancestors({origin}))")
    }

    /// Union of several change ids
    pub fn any_of(ids: &[&str]) -> String {
        ids.join("|")
    }
}

/// Error detection patterns in jj output
pub mod errors {
    /// Pattern indicating not a jj repository
    pub const NOT_A_REPO: &str = "There is no jj repo";
}
