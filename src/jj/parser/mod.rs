//! jj output parser
//!
//! Parses the output from jj commands into structured data.

mod log;
mod operation;


/// Parser for jj command output
pub struct Parser;
