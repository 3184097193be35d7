//! jj git-style diff → quilt patch body

use regex::Regex;
use std::sync::LazyLock;

/// Regex for hunk headers
/// Format: `@@ -<start>[,<len>] +<start>[,<len>] @@[ <section>]`
///
/// Groups:
/// 1. old length (absent = 1)
/// 2. new length (absent = 1)
static HUNK_HEADER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@@ -\d+(?:,(\d+))? \+\d+(?:,(\d+))? @@").expect("Invalid hunk header regex")
});

/// Lines of the current hunk still to be passed through verbatim
#[derive(Debug, Default, Clone, Copy)]
struct HunkBudget {
    old: usize,
    new: usize,
}

impl HunkBudget {
    fn parse(header: &str) -> Option<Self> {
        let caps = HUNK_HEADER_REGEX.captures(header)?;
        let len = |idx| {
            caps.get(idx)
                .map_or(Some(1), |m| m.as_str().parse::<usize>().ok())
        };
        Some(Self {
            old: len(1)?,
            new: len(2)?,
        })
    }

    fn is_open(self) -> bool {
        self.old > 0 || self.new > 0
    }

    fn consume(&mut self, line: &str) {
        match line.as_bytes().first() {
            Some(b'-') => self.old = self.old.saturating_sub(1),
            Some(b'+') => self.new = self.new.saturating_sub(1),
            // "\ No newline at end of file" belongs to the previous line
            Some(b'\\') => {}
            _ => {
                self.old = self.old.saturating_sub(1);
                self.new = self.new.saturating_sub(1);
            }
        }
    }
}

/// Rewrite a jj `diff --git` into the layout quilt's `-p ab` generator uses.
///
/// `root` is the series root relative to the repository root (`""` for the
/// repository root itself):
/// - `diff --git` lines are dropped
/// - `--- a/<root>/<path>` becomes `--- a/<path>`, likewise for `+++ b/`
/// - hunk headers lose trailing whitespace
/// - every other line keeps its exact bytes, `\r` and missing final newline
///   included
///
/// Hunk bodies are copied byte for byte, even when a body line happens to
/// look like a file header.
pub fn format_git_diff(diff: &str, root: &str) -> String {
    let root = root.trim_end_matches('/');
    let root = if root == "." { "" } else { root };
    let old_prefix = format!("--- a/{root}/");
    let new_prefix = format!("+++ b/{root}/");

    let mut result = String::with_capacity(diff.len());
    let mut hunk = HunkBudget::default();

    for raw in diff.split_inclusive('\n') {
        let line = raw.strip_suffix('\n').unwrap_or(raw);
        let eol = &raw[line.len()..];

        if hunk.is_open() && !line.starts_with("@@") {
            hunk.consume(line);
            result.push_str(line);
        } else if line.starts_with("diff --git") {
            continue;
        } else if line.starts_with("@@") {
            hunk = HunkBudget::parse(line).unwrap_or_default();
            result.push_str(line.trim_end_matches([' ', '\t', '\r']));
        } else if let Some(path) = line.strip_prefix(&old_prefix).filter(|_| !root.is_empty()) {
            result.push_str("--- a/");
            result.push_str(path);
        } else if let Some(path) = line.strip_prefix(&new_prefix).filter(|_| !root.is_empty()) {
            result.push_str("+++ b/");
            result.push_str(path);
        } else {
            result.push_str(line);
        }
        result.push_str(eol);
    }

    result
}
