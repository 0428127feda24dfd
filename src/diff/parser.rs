//! Unified diff parsing
//!
//! A single left-to-right scan turns raw `git diff` / `diff -u` output into a
//! [`ParseResult`]. Malformed input never fails the parse: unknown lines are
//! skipped, malformed `@@` markers are dropped and reported as diagnostics.

use regex::Regex;
use std::sync::LazyLock;

use super::cursor::LineCursor;
use super::model::{DiffLine, Hunk, ParseDiagnostic, ParseResult};

static HUNK_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@").expect("Invalid hunk header regex")
});

/// Parser behaviour switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Fold a removal immediately followed by an addition with the same
    /// trimmed text into one context row. Hides line-ending and
    /// missing-newline churn, but can also hide an edit that only touched
    /// leading or trailing whitespace.
    pub reconcile_identical_lines: bool,
}

impl ParseOptions {
    pub fn reconciling() -> Self {
        Self {
            reconcile_identical_lines: true,
        }
    }
}

/// How a single raw diff line is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineClass<'a> {
    HunkHeader,
    Metadata,
    NoNewlineMarker,
    Removed(&'a str),
    Added(&'a str),
    Context(&'a str),
    Other,
}

fn classify(line: &str) -> LineClass<'_> {
    if line.starts_with("@@") {
        LineClass::HunkHeader
    } else if line.starts_with("diff")
        || line.starts_with("index")
        || line.starts_with("---")
        || line.starts_with("+++")
    {
        LineClass::Metadata
    } else if line.starts_with('\\') {
        LineClass::NoNewlineMarker
    } else if let Some(rest) = line.strip_prefix('-') {
        LineClass::Removed(rest)
    } else if let Some(rest) = line.strip_prefix('+') {
        LineClass::Added(rest)
    } else if let Some(rest) = line.strip_prefix(' ') {
        LineClass::Context(rest)
    } else {
        LineClass::Other
    }
}

/// Lines the reconciler looks past when searching for the matching addition
fn is_skippable(line: &str) -> bool {
    matches!(
        classify(line),
        LineClass::Metadata | LineClass::NoNewlineMarker
    )
}

/// Parse a `@@ -a,b +c,d @@` marker. Omitted counts default to 1.
pub fn parse_hunk_header(line: &str) -> Option<Hunk> {
    let caps = HUNK_HEADER.captures(line)?;
    let number = |idx: usize, default: Option<usize>| -> Option<usize> {
        match caps.get(idx) {
            Some(m) => m.as_str().parse().ok(),
            None => default,
        }
    };

    Some(Hunk {
        old_start: number(1, None)?,
        old_count: number(2, Some(1))?,
        new_start: number(3, None)?,
        new_count: number(4, Some(1))?,
    })
}

fn strip_content(rest: &str) -> String {
    rest.trim_end().to_string()
}

/// Parse without reconciliation
#[cfg(test)]
pub fn parse(diff_text: &str) -> ParseResult {
    parse_with(diff_text, &ParseOptions::default())
}

pub fn parse_with(diff_text: &str, options: &ParseOptions) -> ParseResult {
    if diff_text.trim().is_empty() {
        return ParseResult::default();
    }

    let mut scan = Scan::default();
    let mut cursor = LineCursor::new(diff_text);

    loop {
        let line_index = cursor.position();
        let Some(line) = cursor.next_line() else {
            break;
        };

        match classify(line) {
            LineClass::HunkHeader => scan.hunk_header(line, line_index),
            LineClass::Metadata => scan.metadata(line),
            LineClass::NoNewlineMarker | LineClass::Other => {}
            LineClass::Removed(rest) => {
                if options.reconcile_identical_lines && scan.try_reconcile(rest, &mut cursor) {
                    continue;
                }
                scan.removed(rest);
            }
            LineClass::Added(rest) => scan.added(rest),
            LineClass::Context(rest) => scan.context(rest),
        }
    }

    scan.finish()
}

/// Running state of one parse
#[derive(Default)]
struct Scan {
    result: ParseResult,
    old_line: usize,
    new_line: usize,
    current: Option<Hunk>,
}

impl Scan {
    fn hunk_header(&mut self, line: &str, line_index: usize) {
        let Some(hunk) = parse_hunk_header(line) else {
            log::debug!("Dropping malformed hunk header at line {}: {}", line_index + 1, line);
            self.result.diagnostics.push(ParseDiagnostic::MalformedHunkHeader {
                line_index,
                text: line.to_string(),
            });
            return;
        };

        if let Some(open) = self.current.take() {
            self.result.hunks.push(open);
        }
        self.old_line = hunk.old_start.saturating_sub(1);
        self.new_line = hunk.new_start.saturating_sub(1);
        self.current = Some(hunk);

        self.result.push_both(DiffLine::Header {
            text: line.to_string(),
            hunk: Some(self.result.hunks.len()),
        });
    }

    fn metadata(&mut self, line: &str) {
        self.result.push_both(DiffLine::Header {
            text: line.to_string(),
            hunk: None,
        });
    }

    fn removed(&mut self, rest: &str) {
        self.old_line = self.old_line.saturating_add(1);
        self.result.push_pair(
            DiffLine::Removed {
                old_number: self.old_line,
                content: strip_content(rest),
            },
            DiffLine::Removed {
                old_number: self.old_line,
                content: String::new(),
            },
        );
    }

    fn added(&mut self, rest: &str) {
        self.new_line = self.new_line.saturating_add(1);
        self.result.push_pair(
            DiffLine::Added {
                new_number: self.new_line,
                content: String::new(),
            },
            DiffLine::Added {
                new_number: self.new_line,
                content: strip_content(rest),
            },
        );
    }

    fn context(&mut self, rest: &str) {
        self.old_line = self.old_line.saturating_add(1);
        self.new_line = self.new_line.saturating_add(1);
        self.result.push_both(DiffLine::Context {
            old_number: self.old_line,
            new_number: self.new_line,
            content: strip_content(rest),
        });
    }

    /// Look past metadata and `\` markers for an addition carrying the same
    /// trimmed text as `removed`. On a match the skipped lines and the
    /// addition are consumed and one context row is emitted; otherwise the
    /// cursor is left untouched.
    fn try_reconcile(&mut self, removed: &str, cursor: &mut LineCursor<'_>) -> bool {
        let Some(offset) = cursor.find_from(0, is_skippable) else {
            return false;
        };
        let Some(LineClass::Added(added)) = cursor.peek(offset).map(classify) else {
            return false;
        };
        if added.trim() != removed.trim() {
            return false;
        }

        for n in 0..offset {
            if let Some(skipped) = cursor.peek(n) {
                if classify(skipped) == LineClass::Metadata {
                    self.metadata(skipped);
                }
            }
        }
        cursor.consume(offset + 1);
        self.context(added);
        true
    }

    fn finish(mut self) -> ParseResult {
        if let Some(open) = self.current.take() {
            self.result.hunks.push(open);
        }
        self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::model::{LineKind, Side};
    use pretty_assertions::assert_eq;

    fn kinds(lines: &[DiffLine]) -> Vec<LineKind> {
        lines.iter().map(DiffLine::kind).collect()
    }

    // --- parse_hunk_header ---

    #[test]
    fn hunk_header_standard() {
        assert_eq!(
            parse_hunk_header("@@ -10,5 +15,8 @@"),
            Some(Hunk { old_start: 10, old_count: 5, new_start: 15, new_count: 8 })
        );
    }

    #[test]
    fn hunk_header_counts_default_to_one() {
        assert_eq!(
            parse_hunk_header("@@ -5 +5 @@"),
            Some(Hunk { old_start: 5, old_count: 1, new_start: 5, new_count: 1 })
        );
    }

    #[test]
    fn hunk_header_with_section_heading() {
        let hunk = parse_hunk_header("@@ -100,20 +110,25 @@ fn some_function()").unwrap();
        assert_eq!(hunk.old_start, 100);
        assert_eq!(hunk.new_count, 25);
    }

    #[test]
    fn hunk_header_invalid() {
        assert_eq!(parse_hunk_header("@@ bogus @@"), None);
        assert_eq!(parse_hunk_header("@@"), None);
        assert_eq!(parse_hunk_header("@@ -99999999999999999999999 +1 @@"), None);
    }

    // --- parse ---

    #[test]
    fn empty_and_blank_input() {
        assert_eq!(parse(""), ParseResult::default());
        assert_eq!(parse("   "), ParseResult::default());
        assert_eq!(parse("\n\n  \n"), ParseResult::default());
    }

    #[test]
    fn full_file_diff() {
        let diff = "diff --git a/src/lib.rs b/src/lib.rs\n\
                    index 83db48f..bf269f4 100644\n\
                    --- a/src/lib.rs\n\
                    +++ b/src/lib.rs\n\
                    @@ -1,3 +1,3 @@\n \
                    fn main() {\n\
                    -    old();\n\
                    +    new();\n \
                    }\n";
        let result = parse(diff);

        assert_eq!(result.hunks.len(), 1);
        assert_eq!(result.old_lines.len(), result.new_lines.len());
        assert_eq!(
            kinds(&result.old_lines),
            vec![
                LineKind::Header,
                LineKind::Header,
                LineKind::Header,
                LineKind::Header,
                LineKind::Header,
                LineKind::Context,
                LineKind::Removed,
                LineKind::Added,
                LineKind::Context,
            ]
        );
        assert_eq!(result.old_lines[0].content(), "diff --git a/src/lib.rs b/src/lib.rs");
        assert_eq!(result.old_lines[4].hunk_index(), Some(0));
        assert_eq!(result.old_lines[0].hunk_index(), None);
    }

    #[test]
    fn removed_rows_have_placeholder_on_new_side() {
        let result = parse("@@ -1,2 +1,1 @@\n keep\n-gone\n");
        assert_eq!(result.old_lines[2], DiffLine::Removed { old_number: 2, content: "gone".into() });
        assert_eq!(result.new_lines[2], DiffLine::Removed { old_number: 2, content: String::new() });
        assert_eq!(result.new_lines[2].side_line_number(Side::New), None);
    }

    #[test]
    fn added_rows_have_placeholder_on_old_side() {
        let result = parse("@@ -1,1 +1,2 @@\n keep\n+newline\n");
        assert_eq!(result.old_lines[2], DiffLine::Added { new_number: 2, content: String::new() });
        assert_eq!(result.new_lines[2], DiffLine::Added { new_number: 2, content: "newline".into() });
        assert_eq!(result.old_lines[2].side_line_number(Side::Old), None);
    }

    #[test]
    fn line_numbers_follow_hunk_start() {
        let result = parse("@@ -5,3 +10,3 @@\n a\n-b\n+c\n");
        assert_eq!(result.old_lines[1].side_line_number(Side::Old), Some(5));
        assert_eq!(result.new_lines[1].side_line_number(Side::New), Some(10));
        assert_eq!(result.old_lines[2].side_line_number(Side::Old), Some(6));
        assert_eq!(result.new_lines[3].side_line_number(Side::New), Some(11));
    }

    #[test]
    fn counters_reset_for_each_hunk() {
        let diff = "@@ -1,2 +1,2 @@\n a\n-b\n+B\n@@ -10,1 +11,1 @@\n-x\n+y\n";
        let result = parse(diff);

        assert_eq!(result.hunks.len(), 2);
        assert_eq!(result.hunks[1], Hunk { old_start: 10, old_count: 1, new_start: 11, new_count: 1 });
        assert_eq!(result.old_lines[4].hunk_index(), Some(1));
        assert_eq!(result.old_lines[5], DiffLine::Removed { old_number: 10, content: "x".into() });
        assert_eq!(result.new_lines[6], DiffLine::Added { new_number: 11, content: "y".into() });
    }

    #[test]
    fn no_newline_marker_is_dropped() {
        let with_marker = parse("@@ -1 +1 @@\n-a\n\\ No newline at end of file\n+b\n");
        let without = parse("@@ -1 +1 @@\n-a\n+b\n");
        assert_eq!(with_marker, without);
        assert_eq!(with_marker.old_lines.len(), 3);
    }

    #[test]
    fn content_is_stripped_and_trimmed() {
        let result = parse("@@ -1 +1 @@\n-  indented   \n+tab\t\n");
        assert_eq!(result.old_lines[1].content(), "  indented");
        assert_eq!(result.new_lines[2].content(), "tab");
    }

    #[test]
    fn crlf_input() {
        let result = parse("@@ -1 +1 @@\r\n-a\r\n+b\r\n");
        assert_eq!(result.old_lines[1].content(), "a");
        assert_eq!(result.new_lines[2].content(), "b");
    }

    #[test]
    fn unknown_lines_are_ignored() {
        let result = parse("Binary files a/x.png and b/x.png differ\n@@ -1 +1 @@\n-a\n+b\nstray\n");
        assert_eq!(result.old_lines.len(), 3);
    }

    #[test]
    fn malformed_hunk_header_is_dropped_and_reported() {
        let result = parse("@@ nonsense @@\n a\n@@ -3 +3 @@\n b\n");
        assert_eq!(result.hunks.len(), 1);
        assert_eq!(
            result.diagnostics,
            vec![ParseDiagnostic::MalformedHunkHeader {
                line_index: 0,
                text: "@@ nonsense @@".into(),
            }]
        );
        // Content before the first valid marker still counts from zero
        assert_eq!(result.old_lines[0], DiffLine::Context { old_number: 1, new_number: 1, content: "a".into() });
        assert_eq!(result.old_lines[2], DiffLine::Context { old_number: 3, new_number: 3, content: "b".into() });
    }

    #[test]
    fn zero_hunk_diff_has_only_headers() {
        let diff = "diff --git a/old.txt b/new.txt\nsimilarity index 100%\nrename from old.txt\nrename to new.txt\n";
        let result = parse(diff);
        assert!(result.hunks.is_empty());
        assert!(result.is_empty());
    }

    #[test]
    fn new_file_hunk_starting_at_zero() {
        let result = parse("@@ -0,0 +1,2 @@\n+one\n+two\n");
        assert_eq!(result.hunks[0].old_start, 0);
        assert_eq!(result.new_lines[1].side_line_number(Side::New), Some(1));
        assert_eq!(result.new_lines[2].side_line_number(Side::New), Some(2));
    }

    #[test]
    fn huge_hunk_start_does_not_overflow() {
        let result = parse(&format!("@@ -{} +1,2 @@\n a\n-b\n+c\n", usize::MAX));
        assert!(result.diagnostics.is_empty());
        assert_eq!(result.old_lines[1].side_line_number(Side::Old), Some(usize::MAX));
        assert_eq!(result.old_lines[2].side_line_number(Side::Old), Some(usize::MAX));
        assert_eq!(result.new_lines[1].side_line_number(Side::New), Some(1));
        assert_eq!(result.new_lines[3].side_line_number(Side::New), Some(2));
    }

    #[test]
    fn parse_is_idempotent() {
        let diff = "@@ -1,3 +1,3 @@\n a\n-b\n+c\n d\n";
        assert_eq!(parse(diff), parse(diff));
        let options = ParseOptions::reconciling();
        assert_eq!(parse_with(diff, &options), parse_with(diff, &options));
    }

    #[test]
    fn sides_stay_aligned() {
        let diff = "diff --git a/f b/f\n@@ -1,4 +1,5 @@\n a\n-b\n-c\n+C\n+D\n+E\n d\n\\ No newline at end of file\n";
        let result = parse(diff);
        assert_eq!(result.old_lines.len(), result.new_lines.len());
        for (old, new) in result.rows() {
            assert_eq!(old.kind(), new.kind());
        }
    }

    // --- reconciliation ---

    #[test]
    fn reconcile_folds_identical_pair() {
        let diff = "@@ -1,2 +1,2 @@\n-foo\n+foo\n bar\n";
        let result = parse_with(diff, &ParseOptions::reconciling());
        assert_eq!(
            result.old_lines,
            vec![
                DiffLine::Header { text: "@@ -1,2 +1,2 @@".into(), hunk: Some(0) },
                DiffLine::Context { old_number: 1, new_number: 1, content: "foo".into() },
                DiffLine::Context { old_number: 2, new_number: 2, content: "bar".into() },
            ]
        );
        assert_eq!(result.old_lines, result.new_lines);
    }

    #[test]
    fn reconcile_disabled_keeps_pair() {
        let result = parse("@@ -1,2 +1,2 @@\n-foo\n+foo\n bar\n");
        assert_eq!(
            kinds(&result.old_lines),
            vec![LineKind::Header, LineKind::Removed, LineKind::Added, LineKind::Context]
        );
    }

    #[test]
    fn reconcile_looks_past_no_newline_marker() {
        let diff = "@@ -1 +1 @@\n-last line\n\\ No newline at end of file\n+last line\n";
        let result = parse_with(diff, &ParseOptions::reconciling());
        assert_eq!(kinds(&result.old_lines), vec![LineKind::Header, LineKind::Context]);
        assert!(!result.has_changes());
    }

    #[test]
    fn reconcile_ignores_surrounding_whitespace() {
        let diff = "@@ -1 +1 @@\n-  value\n+value  \n";
        let result = parse_with(diff, &ParseOptions::reconciling());
        assert_eq!(result.new_lines[1], DiffLine::Context { old_number: 1, new_number: 1, content: "value".into() });
    }

    #[test]
    fn reconcile_leaves_real_edits() {
        let diff = "@@ -1,2 +1,2 @@\n-foo\n+fob\n bar\n";
        let result = parse_with(diff, &ParseOptions::reconciling());
        assert_eq!(
            kinds(&result.old_lines),
            vec![LineKind::Header, LineKind::Removed, LineKind::Added, LineKind::Context]
        );
        assert_eq!(result.new_lines[2], DiffLine::Added { new_number: 1, content: "fob".into() });
    }

    #[test]
    fn reconcile_only_pairs_adjacent_lines() {
        // The second removal is followed by a removal, not an addition
        let diff = "@@ -1,2 +1,1 @@\n-a\n-b\n+a\n";
        let result = parse_with(diff, &ParseOptions::reconciling());
        assert_eq!(
            kinds(&result.old_lines),
            vec![LineKind::Header, LineKind::Removed, LineKind::Removed, LineKind::Added]
        );
    }

    #[test]
    fn reconcile_at_end_of_input() {
        let result = parse_with("@@ -1 +0,0 @@\n-gone\n", &ParseOptions::reconciling());
        assert_eq!(kinds(&result.old_lines), vec![LineKind::Header, LineKind::Removed]);
    }

    #[test]
    fn reconcile_keeps_skipped_metadata_rows() {
        let diff = "@@ -1 +1 @@\n-same\nindex 000..111\n+same\n";
        let result = parse_with(diff, &ParseOptions::reconciling());
        assert_eq!(
            kinds(&result.old_lines),
            vec![LineKind::Header, LineKind::Header, LineKind::Context]
        );
        assert_eq!(result.old_lines[1].content(), "index 000..111");
    }

    #[test]
    fn reconcile_counters_continue_after_fold() {
        let diff = "@@ -4,3 +4,3 @@\n-same\n+same\n-old\n+new\n";
        let result = parse_with(diff, &ParseOptions::reconciling());
        assert_eq!(result.old_lines[1], DiffLine::Context { old_number: 4, new_number: 4, content: "same".into() });
        assert_eq!(result.old_lines[2], DiffLine::Removed { old_number: 5, content: "old".into() });
        assert_eq!(result.new_lines[3], DiffLine::Added { new_number: 5, content: "new".into() });
    }
}
