//! Parsed diff model
//!
//! A unified diff is reconstructed into two index-aligned row sequences, one
//! per side of the comparison. Row `i` of the old side and row `i` of the new
//! side always describe the same rendered row.

use serde::Serialize;

/// Which side of the comparison a row is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Old,
    New,
}

/// Classification of a row, used for styling and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    Added,
    Removed,
    Context,
    Header,
}

/// One row on one side of the comparison.
///
/// The row on the opposite side of an `Added`/`Removed` row is the same
/// variant with empty content, so the two sequences stay aligned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DiffLine {
    /// Raw metadata text (`diff`, `index`, `---`, `+++` or an `@@` marker).
    /// `hunk` points into [`ParseResult::hunks`] for `@@` markers.
    Header { text: String, hunk: Option<usize> },
    Context {
        old_number: usize,
        new_number: usize,
        content: String,
    },
    Removed { old_number: usize, content: String },
    Added { new_number: usize, content: String },
}

impl DiffLine {
    pub fn kind(&self) -> LineKind {
        match self {
            Self::Header { .. } => LineKind::Header,
            Self::Context { .. } => LineKind::Context,
            Self::Removed { .. } => LineKind::Removed,
            Self::Added { .. } => LineKind::Added,
        }
    }

    /// 1-based line number on `side`, absent when the row has no
    /// counterpart there
    pub fn side_line_number(&self, side: Side) -> Option<usize> {
        match (self, side) {
            (Self::Context { old_number, .. }, Side::Old) => Some(*old_number),
            (Self::Context { new_number, .. }, Side::New) => Some(*new_number),
            (Self::Removed { old_number, .. }, Side::Old) => Some(*old_number),
            (Self::Added { new_number, .. }, Side::New) => Some(*new_number),
            _ => None,
        }
    }

    /// Stripped content for change rows, raw text for headers
    pub fn content(&self) -> &str {
        match self {
            Self::Header { text, .. } => text,
            Self::Context { content, .. }
            | Self::Removed { content, .. }
            | Self::Added { content, .. } => content,
        }
    }

    pub fn is_header(&self) -> bool {
        matches!(self, Self::Header { .. })
    }

    pub fn is_change(&self) -> bool {
        matches!(self, Self::Added { .. } | Self::Removed { .. })
    }

    /// Index of the hunk this header opens, if it is an `@@` marker
    pub fn hunk_index(&self) -> Option<usize> {
        match self {
            Self::Header { hunk, .. } => *hunk,
            _ => None,
        }
    }
}

/// A contiguous region of the diff introduced by an `@@ -a,b +c,d @@` marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Hunk {
    pub old_start: usize,
    pub old_count: usize,
    pub new_start: usize,
    pub new_count: usize,
}

/// Something the parser tolerated but a caller may want to know about
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseDiagnostic {
    /// An `@@` line that did not match the hunk header pattern; it was dropped
    MalformedHunkHeader { line_index: usize, text: String },
}

/// Output of a single parse. Nothing here outlives the render that uses it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseResult {
    pub old_lines: Vec<DiffLine>,
    pub new_lines: Vec<DiffLine>,
    pub hunks: Vec<Hunk>,
    pub diagnostics: Vec<ParseDiagnostic>,
}

impl ParseResult {
    pub fn side(&self, side: Side) -> &[DiffLine] {
        match side {
            Side::Old => &self.old_lines,
            Side::New => &self.new_lines,
        }
    }

    /// Aligned (old, new) row pairs in scan order
    pub fn rows(&self) -> impl Iterator<Item = (&DiffLine, &DiffLine)> {
        self.old_lines.iter().zip(self.new_lines.iter())
    }

    /// True when every row is a header (or there are no rows at all)
    pub fn is_empty(&self) -> bool {
        self.old_lines.iter().all(DiffLine::is_header)
    }

    pub fn has_changes(&self) -> bool {
        self.old_lines.iter().any(DiffLine::is_change)
    }

    /// Number of (added, removed) rows
    pub fn change_counts(&self) -> (usize, usize) {
        self.old_lines.iter().fold((0, 0), |(added, removed), line| match line {
            DiffLine::Added { .. } => (added + 1, removed),
            DiffLine::Removed { .. } => (added, removed + 1),
            _ => (added, removed),
        })
    }

    pub(crate) fn push_pair(&mut self, old: DiffLine, new: DiffLine) {
        self.old_lines.push(old);
        self.new_lines.push(new);
    }

    pub(crate) fn push_both(&mut self, line: DiffLine) {
        self.old_lines.push(line.clone());
        self.new_lines.push(line);
    }
}
