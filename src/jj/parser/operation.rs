//! Operation log parser (jj op log)

use super::super::JjError;
use crate::model::OperationId;

use super::Parser;

impl Parser {
    /// Parse the current operation id out of `jj op log --limit 1` output
    ///
    /// Expects one line holding the id printed by
    /// [`Templates::op_id`](super::super::template::Templates::op_id).
    pub fn parse_op_id(output: &str) -> Result<OperationId, JjError> {
        let id = output
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .ok_or_else(|| JjError::ParseError("empty operation log".to_string()))?;

        if !id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(JjError::ParseError(format!(
                "Unexpected operation id: {id:?}"
            )));
        }

        Ok(OperationId::new(id))
    }
}
