//! Change metadata parser (jj log with the change template)

use super::super::JjError;
use super::super::template::{FIELD_SEPARATOR, PARENT_SEPARATOR};
use crate::model::Change;

use super::Parser;

/// Number of fields produced by [`Templates::change`](super::super::template::Templates::change)
const CHANGE_FIELDS: usize = 7;

impl Parser {
    /// Parse `jj log --no-graph` output into a list of Changes
    ///
    /// One change per line, newest first (jj's log order).
    pub fn parse_changes(output: &str) -> Result<Vec<Change>, JjError> {
        output
            .lines()
            .filter(|line| !line.is_empty())
            .map(Self::parse_change_record)
            .collect()
    }

    /// Parse a single change record (one line, tab-separated fields)
    pub(super) fn parse_change_record(record: &str) -> Result<Change, JjError> {
        let fields: Vec<&str> = record.splitn(CHANGE_FIELDS, FIELD_SEPARATOR).collect();

        if fields.len() < CHANGE_FIELDS {
            return Err(JjError::ParseError(format!(
                "Expected {} fields, got {}: {:?}",
                CHANGE_FIELDS,
                fields.len(),
                fields
            )));
        }

        if fields[0].is_empty() {
            return Err(JjError::ParseError(format!(
                "Missing change id in: {record:?}"
            )));
        }

        let description: String = serde_json::from_str(fields[6]).map_err(|e| {
            JjError::ParseError(format!("Bad description encoding {:?}: {}", fields[6], e))
        })?;

        let parents = if fields[5].is_empty() {
            Vec::new()
        } else {
            fields[5]
                .split(PARENT_SEPARATOR)
                .map(|s| s.to_string())
                .collect()
        };

        let mut change = Change::new(fields[0], description, parents, Self::flag(fields[3])?);
        change.has_conflict = Self::flag(fields[1])?;
        change.is_divergent = Self::flag(fields[2])?;
        change.is_empty = Self::flag(fields[4])?;
        Ok(change)
    }

    fn flag(field: &str) -> Result<bool, JjError> {
        match field {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(JjError::ParseError(format!(
                "Expected true/false, got {other:?}"
            ))),
        }
    }
}
