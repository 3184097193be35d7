//! Quahog - quilt patch series as Jujutsu commits
//!
//! Converts between a quilt `patches/` directory and a chain of jj commits
//! so patches can be edited with ordinary jj tooling.
//!
//! This library provides:
//! - [`chain`]: Patch-chain discovery around a revision
//! - [`cli`]: Command-line definitions
//! - [`jj`]: Jujutsu command execution and parsing
//! - [`logging`]: Log output setup
//! - [`model`]: Domain models
//! - [`ops`]: Fold and pop with rollback
//! - [`quilt`]: Patch files, the series manifest and patch application

pub mod chain;
pub mod cli;
pub mod jj;
pub mod logging;
pub mod model;
pub mod ops;
pub mod quilt;
