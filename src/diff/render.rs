//! Projection of a parsed diff into display rows
//!
//! Split mode produces two columns (old, new) with header rows removed.
//! Unified mode produces one column in scan order where every hunk marker is
//! replaced by a readable summary of what the hunk changes.

use serde::Serialize;

use super::model::{DiffLine, LineKind, ParseResult, Side};
use super::parser::ParseOptions;

/// Keeps an empty cell one row tall
pub const EMPTY_CELL: &str = "\u{00A0}";

pub const NO_CHANGES: &str = "No changes detected";
pub const NO_CHANGES_IDENTICAL: &str = "No changes detected (file is identical to HEAD)";

/// Diff view mode: split (side-by-side) or unified (single pane)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Split,
    Unified,
}

impl ViewMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Split => Self::Unified,
            Self::Unified => Self::Split,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Split => "split",
            Self::Unified => "unified",
        }
    }
}

/// A display-ready row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayRow {
    pub kind: LineKind,
    pub old_number: Option<usize>,
    pub new_number: Option<usize>,
    /// `" "`, `"-"` or `"+"` in unified mode, empty otherwise
    pub prefix: &'static str,
    pub text: String,
}

impl DisplayRow {
    fn cell(line: &DiffLine, side: Side) -> Self {
        let number = line.side_line_number(side);
        let text = match line.content() {
            "" => EMPTY_CELL.to_string(),
            content => content.to_string(),
        };
        let (old_number, new_number) = match side {
            Side::Old => (number, None),
            Side::New => (None, number),
        };
        Self {
            kind: line.kind(),
            old_number,
            new_number,
            prefix: "",
            text,
        }
    }

    pub fn is_change(&self) -> bool {
        matches!(self.kind, LineKind::Added | LineKind::Removed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RenderedDiff {
    NoChanges { message: &'static str },
    Split { old: Vec<DisplayRow>, new: Vec<DisplayRow> },
    Unified { rows: Vec<DisplayRow> },
}

impl RenderedDiff {
    /// Number of display rows (split columns are the same height)
    pub fn row_count(&self) -> usize {
        match self {
            Self::NoChanges { .. } => 0,
            Self::Split { old, .. } => old.len(),
            Self::Unified { rows } => rows.len(),
        }
    }

    /// Index of the first added or removed row, the auto-scroll target
    pub fn first_change(&self) -> Option<usize> {
        self.change_indices().next()
    }

    /// Indices of every added or removed row, in display order
    pub fn change_indices(&self) -> Box<dyn Iterator<Item = usize> + '_> {
        match self {
            Self::NoChanges { .. } => Box::new(std::iter::empty()),
            Self::Split { old, .. } => Box::new(changed(old)),
            Self::Unified { rows } => Box::new(changed(rows)),
        }
    }
}

fn changed(rows: &[DisplayRow]) -> impl Iterator<Item = usize> + '_ {
    rows.iter()
        .enumerate()
        .filter(|(_, row)| row.is_change())
        .map(|(idx, _)| idx)
}

/// Render without the reconciliation hint
#[cfg(test)]
pub fn render(result: &ParseResult, mode: ViewMode) -> RenderedDiff {
    render_with(result, mode, &ParseOptions::default())
}

/// Render a result produced with `options`. A reconciling parse that leaves
/// no changes behind is reported as identical rather than drawn as context.
pub fn render_with(result: &ParseResult, mode: ViewMode, options: &ParseOptions) -> RenderedDiff {
    if options.reconcile_identical_lines && !result.has_changes() {
        return RenderedDiff::NoChanges {
            message: NO_CHANGES_IDENTICAL,
        };
    }
    if result.is_empty() {
        return RenderedDiff::NoChanges {
            message: NO_CHANGES,
        };
    }

    match mode {
        ViewMode::Split => render_split(result),
        ViewMode::Unified => render_unified(result),
    }
}

fn render_split(result: &ParseResult) -> RenderedDiff {
    let column = |side: Side| -> Vec<DisplayRow> {
        result
            .side(side)
            .iter()
            .filter(|line| !line.is_header())
            .map(|line| DisplayRow::cell(line, side))
            .collect()
    };

    RenderedDiff::Split {
        old: column(Side::Old),
        new: column(Side::New),
    }
}

fn render_unified(result: &ParseResult) -> RenderedDiff {
    let counts = hunk_change_counts(result);
    let mut rows = Vec::with_capacity(result.old_lines.len());

    for (old, new) in result.rows() {
        let row = match (old, new) {
            (DiffLine::Header { text, .. }, _) => {
                let hunk = old.hunk_index();
                let text = match hunk.and_then(|idx| result.hunks.get(idx).map(|h| (idx, h))) {
                    Some((idx, h)) => {
                        let (removed, added) = counts.get(idx).copied().unwrap_or_default();
                        hunk_summary(h.new_start, removed, added)
                    }
                    None => text.clone(),
                };
                DisplayRow {
                    kind: LineKind::Header,
                    old_number: None,
                    new_number: None,
                    prefix: "",
                    text,
                }
            }
            (DiffLine::Context { old_number, new_number, content }, _) => DisplayRow {
                kind: LineKind::Context,
                old_number: Some(*old_number),
                new_number: Some(*new_number),
                prefix: " ",
                text: content.clone(),
            },
            (DiffLine::Removed { old_number, content }, _) => DisplayRow {
                kind: LineKind::Removed,
                old_number: Some(*old_number),
                new_number: None,
                prefix: "-",
                text: content.clone(),
            },
            (DiffLine::Added { new_number, .. }, added) => DisplayRow {
                kind: LineKind::Added,
                old_number: None,
                new_number: Some(*new_number),
                prefix: "+",
                text: added.content().to_string(),
            },
        };
        rows.push(row);
    }

    RenderedDiff::Unified { rows }
}

/// (removed, added) per hunk, indexed like `result.hunks`
fn hunk_change_counts(result: &ParseResult) -> Vec<(usize, usize)> {
    let mut counts = vec![(0, 0); result.hunks.len()];
    let mut current = None;

    for line in &result.old_lines {
        if let Some(idx) = line.hunk_index() {
            current = Some(idx);
            continue;
        }
        match line {
            DiffLine::Removed { .. } => {
                if let Some(entry) = current.and_then(|idx| counts.get_mut(idx)) {
                    entry.0 += 1;
                }
            }
            DiffLine::Added { .. } => {
                if let Some(entry) = current.and_then(|idx| counts.get_mut(idx)) {
                    entry.1 += 1;
                }
            }
            _ => {}
        }
    }

    counts
}

fn lines_word(n: usize) -> &'static str {
    if n == 1 {
        "line"
    } else {
        "lines"
    }
}

/// `Changes at line N (r lines removed, a lines added)`, dropping empty clauses
pub fn hunk_summary(new_start: usize, removed: usize, added: usize) -> String {
    let mut clauses = Vec::with_capacity(2);
    if removed > 0 {
        clauses.push(format!("{} {} removed", removed, lines_word(removed)));
    }
    if added > 0 {
        clauses.push(format!("{} {} added", added, lines_word(added)));
    }

    if clauses.is_empty() {
        format!("Changes at line {}", new_start)
    } else {
        format!("Changes at line {} ({})", new_start, clauses.join(", "))
    }
}
