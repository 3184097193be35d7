//! jj template definitions for stable output parsing
//!
//! These templates ensure consistent, parseable output from jj commands
//! regardless of user configuration.

/// Separator used between fields in template output (tab character)
pub const FIELD_SEPARATOR: char = '\t';

/// Separator between parent ids inside the parents field
pub const PARENT_SEPARATOR: char = ',';

/// Templates for jj commands
pub struct Templates;

impl Templates {
    /// Template for change metadata
    ///
    /// Fields (separated by tab):
    /// 1. change_id (short)
    /// 2. has_conflict ("true" or "false")
    /// 3. is_divergent ("true" or "false")
    /// 4. is_mutable ("true" or "false")
    /// 5. is_empty ("true" or "false")
    /// 6. parent change ids (comma-separated, empty for the root)
    /// 7. description, JSON-escaped so that it stays on one line
    ///
    /// The description is last so that a stray tab inside it can never
    /// shift the other fields.
    pub fn change() -> &'static str {
        concat!(
            "change_id.short()",
            " ++ \"\\t\" ++ ",
            "if(conflict, 'true', 'false')",
            " ++ \"\\t\" ++ ",
            "if(divergent, 'true', 'false')",
            " ++ \"\\t\" ++ ",
            "if(immutable, 'false', 'true')",
            " ++ \"\\t\" ++ ",
            "if(empty, 'true', 'false')",
            " ++ \"\\t\" ++ ",
            "parents.map(|c| c.change_id().short()).join(',')",
            " ++ \"\\t\" ++ ",
            "description.escape_json()",
            " ++ \"\\n\""
        )
    }

    /// Template for `jj op log`: the full operation id
    pub fn op_id() -> &'static str {
        "self.id() ++ \"\\n\""
    }
}
