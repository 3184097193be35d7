//! Property-based tests for the git diff → quilt patch translator

use proptest::prelude::*;
use quahog::quilt::format_git_diff;

/// One line of a hunk body, including CRLF lines and ones that look like
/// file headers
fn body_line() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z ]{0,12}".prop_map(|s| format!(" {s}")),
        "[a-z ]{0,12}".prop_map(|s| format!("-{s}")),
        "[a-z ]{0,12}".prop_map(|s| format!("+{s}")),
        "[a-z ]{0,12}".prop_map(|s| format!("-{s}\r")),
        "[a-z]{1,6}".prop_map(|s| format!("--- a/pkg/{s}")),
        "[a-z]{1,6}".prop_map(|s| format!("+++ b/pkg/{s}")),
    ]
}

#[derive(Debug, Clone)]
struct Hunk {
    section: String,
    body: Vec<String>,
}

impl Hunk {
    /// Header with the counts git would print, plus trailing whitespace
    fn header(&self) -> String {
        let old = self.body.iter().filter(|l| !l.starts_with('+')).count();
        let new = self.body.iter().filter(|l| !l.starts_with('-')).count();
        format!("@@ -1,{old} +1,{new} @@ {} \t", self.section)
    }
}

fn hunk() -> impl Strategy<Value = Hunk> {
    (
        "[a-z()]{0,8}",
        prop::collection::vec(body_line(), 1..6),
    )
        .prop_map(|(section, body)| Hunk { section, body })
}

fn file() -> impl Strategy<Value = (String, Vec<Hunk>)> {
    ("[a-z]{1,8}", prop::collection::vec(hunk(), 1..4))
}

/// A `jj diff --git` for files under `pkg/`, and the patch quilt expects
fn diff_pair(files: &[(String, Vec<Hunk>)]) -> (String, String) {
    let mut input = String::new();
    let mut expected = String::new();
    for (path, hunks) in files {
        input.push_str(&format!("diff --git a/pkg/{path} b/pkg/{path}\n"));
        input.push_str(&format!("--- a/pkg/{path}\n+++ b/pkg/{path}\n"));
        expected.push_str(&format!("--- a/{path}\n+++ b/{path}\n"));
        for hunk in hunks {
            let header = hunk.header();
            input.push_str(&header);
            input.push('\n');
            expected.push_str(header.trim_end());
            expected.push('\n');
            for line in &hunk.body {
                input.push_str(line);
                input.push('\n');
                expected.push_str(line);
                expected.push('\n');
            }
        }
    }
    (input, expected)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// Translator should not panic on arbitrary input
    #[test]
    fn format_does_not_panic(input in "(.*\n){0,8}", root in "[a-z/.]{0,8}") {
        let _ = format_git_diff(&input, &root);
    }

    /// Hunk headers with absurd counts are tolerated
    #[test]
    fn format_handles_oversized_counts(old in any::<u64>(), new in any::<u64>()) {
        let diff = format!("@@ -1,{old} +1,{new} @@\n-a\n+b\n");
        let _ = format_git_diff(&diff, "pkg");
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// Well-formed diffs translate exactly: headers rewritten, bodies kept
    #[test]
    fn format_translates_structured_diff(
        files in prop::collection::vec(file(), 1..4),
    ) {
        let (input, expected) = diff_pair(&files);
        let output = format_git_diff(&input, "pkg");
        prop_assert_eq!(&output, &expected);

        prop_assert!(!output.lines().any(|l| l.starts_with("diff --git")));
        for line in output.lines().filter(|l| l.starts_with("@@")) {
            prop_assert_eq!(line, line.trim_end());
        }
    }
}
