mod text;

use crossterm::event::KeyEvent;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, StatefulWidget, Widget},
};
use std::collections::HashMap;
use unicode_width::UnicodeWidthStr;

use crate::config::Colors;
use crate::diff::{
    parse_with, render_with, DisplayRow, LineKind, ParseOptions, ParseResult, RenderedDiff, Side,
    ViewMode, EMPTY_CELL,
};
use crate::event::KeyInput;
use crate::ui::syntax::{Highlighter, StyledLine};

use super::{Action, FocusTarget, ScrollState, YankTarget};
use text::{display_text, fit_spans, is_binary, truncate_or_pad};

/// Minimum width for split view (below this, auto-switch to unified)
const SPLIT_VIEW_MIN_WIDTH: u16 = 100;
/// Minimum width change to reset manual mode override
const RESIZE_THRESHOLD: u16 = 4;
const NUM_WIDTH: usize = 4;
const SEPARATOR: &str = " \u{2502} ";
const DEFAULT_PAGE: usize = 20;

/// Syntax highlighting per side, keyed by that side's line number
#[derive(Debug, Default)]
struct SideHighlights {
    old: HashMap<usize, StyledLine>,
    new: HashMap<usize, StyledLine>,
}

impl SideHighlights {
    fn build(result: &ParseResult, path: &str, highlighter: &Highlighter) -> Self {
        Self {
            old: highlight_side(result, Side::Old, path, highlighter),
            new: highlight_side(result, Side::New, path, highlighter),
        }
    }

    fn get(&self, side: Side, number: Option<usize>) -> Option<&StyledLine> {
        let map = match side {
            Side::Old => &self.old,
            Side::New => &self.new,
        };
        number.and_then(|n| map.get(&n))
    }
}

fn highlight_side(
    result: &ParseResult,
    side: Side,
    path: &str,
    highlighter: &Highlighter,
) -> HashMap<usize, StyledLine> {
    let (numbers, lines): (Vec<usize>, Vec<&str>) = result
        .side(side)
        .iter()
        .filter_map(|line| Some((line.side_line_number(side)?, line.content())))
        .unzip();
    numbers
        .into_iter()
        .zip(highlighter.highlight_lines(&lines, path))
        .collect()
}

/// Diff view widget state
pub struct DiffViewState {
    path: Option<String>,
    result: ParseResult,
    rendered: RenderedDiff,
    options: ParseOptions,
    pub view_mode: ViewMode,
    pub scroll: ScrollState,
    binary: bool,
    /// User manually set the view mode (don't auto-switch)
    manual_mode: bool,
    /// Mode fixed from the command line; width never overrides it
    pinned: bool,
    last_width: u16,
    /// Centre the first change once the real viewport height is known
    center_pending: bool,
    page_height: usize,
    highlights: SideHighlights,
}

impl DiffViewState {
    pub fn new(options: ParseOptions) -> Self {
        let result = ParseResult::default();
        let view_mode = ViewMode::default();
        Self {
            path: None,
            rendered: render_with(&result, view_mode, &options),
            result,
            options,
            view_mode,
            scroll: ScrollState::new(),
            binary: false,
            manual_mode: false,
            pinned: false,
            last_width: 0,
            center_pending: false,
            page_height: DEFAULT_PAGE,
            highlights: SideHighlights::default(),
        }
    }

    /// Start in `mode` and never auto-switch away from it on resize
    pub fn pin_view_mode(&mut self, mode: ViewMode) {
        self.set_view_mode(mode);
        self.pinned = true;
    }

    /// Parse `text` and scroll to its first change
    pub fn set_content(&mut self, path: Option<&str>, text: &str, highlighter: Option<&Highlighter>) {
        self.path = path.map(str::to_string);
        self.binary = is_binary(text);
        self.result = if self.binary {
            ParseResult::default()
        } else {
            parse_with(text, &self.options)
        };
        if !self.result.diagnostics.is_empty() {
            log::debug!(
                "{}: {} malformed hunk header(s) skipped",
                self.title(),
                self.result.diagnostics.len()
            );
        }

        self.highlights = match (highlighter, path) {
            (Some(h), Some(p)) if !self.binary => SideHighlights::build(&self.result, p, h),
            _ => SideHighlights::default(),
        };

        self.scroll.reset();
        self.rerender();
        self.center_on_first_change(self.page_height);
        self.center_pending = true;
    }

    fn rerender(&mut self) {
        self.rendered = render_with(&self.result, self.view_mode, &self.options);
        self.scroll.set_len(self.rendered.row_count());
    }

    fn center_on_first_change(&mut self, height: usize) {
        if let Some(idx) = self.rendered.first_change() {
            self.scroll.center_on(idx, height);
        }
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn title(&self) -> String {
        self.path.clone().unwrap_or_else(|| "Diff".to_string())
    }

    /// (old, new) line numbers shown on a display row
    fn row_numbers(&self, idx: usize) -> (Option<usize>, Option<usize>) {
        match &self.rendered {
            RenderedDiff::NoChanges { .. } => (None, None),
            RenderedDiff::Split { old, new } => (
                old.get(idx).and_then(|r| r.old_number),
                new.get(idx).and_then(|r| r.new_number),
            ),
            RenderedDiff::Unified { rows } => rows
                .get(idx)
                .map(|r| (r.old_number, r.new_number))
                .unwrap_or_default(),
        }
    }

    fn find_row(&self, old: Option<usize>, new: Option<usize>) -> Option<usize> {
        (0..self.rendered.row_count()).find(|&idx| {
            let (row_old, row_new) = self.row_numbers(idx);
            (new.is_some() && row_new == new) || (old.is_some() && row_old == old)
        })
    }

    /// Switch mode, keeping the cursor on the same source line
    fn set_view_mode(&mut self, mode: ViewMode) {
        if mode == self.view_mode {
            return;
        }
        let (old, new) = self.row_numbers(self.scroll.cursor);
        self.view_mode = mode;
        self.rerender();
        if let Some(idx) = self.find_row(old, new) {
            self.scroll.cursor = idx;
        }
    }

    /// Toggle between split and unified view modes (manual override)
    pub fn toggle_view_mode(&mut self) {
        self.set_view_mode(self.view_mode.toggled());
        self.manual_mode = true;
        self.pinned = false;
    }

    /// Auto-adjust view mode based on available width (unless user manually set it)
    pub fn auto_adjust_view_mode(&mut self, width: u16) {
        if self.manual_mode && self.last_width > 0 && width.abs_diff(self.last_width) >= RESIZE_THRESHOLD {
            self.manual_mode = false;
        }
        self.last_width = width;

        if self.manual_mode || self.pinned {
            return;
        }
        self.set_view_mode(if width < SPLIT_VIEW_MIN_WIDTH {
            ViewMode::Unified
        } else {
            ViewMode::Split
        });
    }

    /// First row of every run of consecutive changed rows
    fn change_starts(&self) -> Vec<usize> {
        let mut starts = Vec::new();
        let mut prev: Option<usize> = None;
        for idx in self.rendered.change_indices() {
            if prev.map_or(true, |p| p + 1 != idx) {
                starts.push(idx);
            }
            prev = Some(idx);
        }
        starts
    }

    pub fn next_change(&mut self) -> bool {
        let cursor = self.scroll.cursor;
        match self.change_starts().into_iter().find(|&idx| idx > cursor) {
            Some(idx) => {
                self.scroll.center_on(idx, self.page_height);
                true
            }
            None => false,
        }
    }

    pub fn prev_change(&mut self) -> bool {
        let cursor = self.scroll.cursor;
        match self.change_starts().into_iter().rev().find(|&idx| idx < cursor) {
            Some(idx) => {
                self.scroll.center_on(idx, self.page_height);
                true
            }
            None => false,
        }
    }

    /// Mouse wheel scrolling; the cursor is dragged along with the viewport
    pub fn scroll_lines(&mut self, lines: isize) {
        self.scroll.scroll_by(lines, self.page_height);
    }

    /// New-side line number under the cursor, old side for removed rows
    pub fn current_line_number(&self) -> Option<usize> {
        let (old, new) = self.row_numbers(self.scroll.cursor);
        new.or(old)
    }

    /// `path:line` under the cursor, or just the path
    pub fn location(&self) -> Option<String> {
        let path = self.path.as_deref()?;
        Some(match self.current_line_number() {
            Some(line) => format!("{}:{}", path, line),
            None => path.to_string(),
        })
    }

    /// Text of the row under the cursor (new side preferred)
    pub fn current_content(&self) -> Option<String> {
        let idx = self.scroll.cursor;
        let row = match &self.rendered {
            RenderedDiff::NoChanges { .. } => return None,
            RenderedDiff::Split { old, new } => match new.get(idx) {
                Some(row) if row.new_number.is_some() => row,
                _ => old.get(idx)?,
            },
            RenderedDiff::Unified { rows } => rows.get(idx).filter(|r| r.kind != LineKind::Header)?,
        };
        Some(row.text.replace(EMPTY_CELL, ""))
    }

    /// Handle key input, return action for App to dispatch
    pub fn handle_key(&mut self, key: &KeyEvent) -> Action {
        let page = self.page_height.max(1);
        if KeyInput::is_down(key) {
            self.scroll.move_down();
        } else if KeyInput::is_up(key) {
            self.scroll.move_up();
        } else if KeyInput::is_fast_down(key) {
            self.scroll.move_down_n(5);
        } else if KeyInput::is_fast_up(key) {
            self.scroll.move_up_n(5);
        } else if KeyInput::is_page_down(key) {
            self.scroll.move_down_n(page);
        } else if KeyInput::is_page_up(key) {
            self.scroll.move_up_n(page);
        } else if KeyInput::is_top(key) {
            self.scroll.go_top();
        } else if KeyInput::is_bottom(key) {
            self.scroll.go_bottom();
        } else if KeyInput::is_toggle_view_mode(key) {
            self.toggle_view_mode();
        } else if KeyInput::is_next_change(key) {
            self.next_change();
        } else if KeyInput::is_prev_change(key) {
            self.prev_change();
        } else if KeyInput::is_yank(key) {
            return Action::Yank(YankTarget::Location);
        } else if KeyInput::is_yank_content(key) {
            return Action::Yank(YankTarget::Content);
        } else if KeyInput::is_escape(key) {
            return Action::ChangeFocus(FocusTarget::FileList);
        } else {
            return Action::Ignored;
        }
        Action::None
    }
}

/// Diff view widget
pub struct DiffView<'a> {
    colors: &'a Colors,
    focused: bool,
    staged: bool,
}

impl<'a> DiffView<'a> {
    pub fn new(colors: &'a Colors) -> Self {
        Self {
            colors,
            focused: false,
            staged: false,
        }
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    pub fn staged(mut self, staged: bool) -> Self {
        self.staged = staged;
        self
    }
}

impl<'a> StatefulWidget for DiffView<'a> {
    type State = DiffViewState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let is_split = matches!(state.rendered, RenderedDiff::Split { .. });
        let label_rows = if is_split { 1 } else { 0 };
        let body_height = area.height.saturating_sub(2 + label_rows) as usize;

        let badge = if self.staged { "[staged]" } else { "[unstaged]" };
        let mut title = format!("{} [{}] {}", state.title(), state.view_mode.label(), badge);
        let scroll_info = state.scroll.scroll_percent(body_height);
        if !scroll_info.is_empty() {
            title.push_str(" \u{2500}\u{2500}\u{2500} ");
            title.push_str(&scroll_info);
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.colors.border_style(self.focused))
            .title(Span::styled(title, self.colors.style_header()));

        let inner = block.inner(area);
        block.render(area, buf);
        if inner.height == 0 || inner.width == 0 {
            return;
        }

        if state.binary {
            let line = Line::from(Span::styled("Binary file not shown", self.colors.style_muted()));
            buf.set_line(inner.x, inner.y, &line, inner.width);
            return;
        }

        if let RenderedDiff::NoChanges { message } = &state.rendered {
            let line = Line::from(Span::styled(*message, self.colors.style_muted()));
            buf.set_line(inner.x, inner.y, &line, inner.width);
            if inner.height > 2 {
                let hint = Line::from(Span::styled("Press ? for help", self.colors.style_muted()));
                buf.set_line(inner.x, inner.y + 2, &hint, inner.width);
            }
            return;
        }

        let pane_width = (inner.width as usize).saturating_sub(SEPARATOR.width()) / 2;
        if is_split {
            let labels = Line::from(vec![
                Span::styled(truncate_or_pad(" Original", pane_width), self.colors.style_header()),
                Span::styled(SEPARATOR, self.colors.style_muted()),
                Span::styled(truncate_or_pad(" Modified", pane_width), self.colors.style_header()),
            ]);
            buf.set_line(inner.x, inner.y, &labels, inner.width);
        }

        let body_y = inner.y + label_rows;
        let height = body_height.min(inner.height.saturating_sub(label_rows) as usize);
        state.page_height = height.max(1);
        if state.center_pending {
            state.center_on_first_change(height);
            state.center_pending = false;
        }
        state.scroll.ensure_visible(height);

        let offset = state.scroll.offset;
        let cursor = state.scroll.cursor;
        let width = inner.width as usize;

        for i in 0..height {
            let idx = offset + i;
            let is_cursor = self.focused && idx == cursor;
            let line = match &state.rendered {
                RenderedDiff::Split { old, new } => match (old.get(idx), new.get(idx)) {
                    (Some(old_row), Some(new_row)) => {
                        let mut spans = render_cell(
                            old_row,
                            Side::Old,
                            state.highlights.get(Side::Old, old_row.old_number),
                            is_cursor,
                            self.colors,
                            pane_width,
                        );
                        spans.push(Span::styled(SEPARATOR, self.colors.style_muted()));
                        spans.extend(render_cell(
                            new_row,
                            Side::New,
                            state.highlights.get(Side::New, new_row.new_number),
                            is_cursor,
                            self.colors,
                            pane_width,
                        ));
                        Line::from(spans)
                    }
                    _ => break,
                },
                RenderedDiff::Unified { rows } => match rows.get(idx) {
                    Some(row) => {
                        let hl = match row.kind {
                            LineKind::Removed => state.highlights.get(Side::Old, row.old_number),
                            _ => state.highlights.get(Side::New, row.new_number),
                        };
                        render_unified_row(row, hl, is_cursor, self.colors, width)
                    }
                    None => break,
                },
                RenderedDiff::NoChanges { .. } => break,
            };
            buf.set_line(inner.x, body_y + i as u16, &line, inner.width);
        }
    }
}

fn gutter(number: Option<usize>) -> String {
    match number {
        Some(n) => format!("{:>width$}", n, width = NUM_WIDTH),
        None => " ".repeat(NUM_WIDTH),
    }
}

fn cursor_style(cursor: bool) -> Style {
    if cursor {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default()
    }
}

/// Foreground and change background for a row kind
fn kind_styles(kind: LineKind, colors: &Colors) -> (Style, Style) {
    match kind {
        LineKind::Added => (colors.style_added(), Style::default().bg(colors.added_bg)),
        LineKind::Removed => (colors.style_removed(), Style::default().bg(colors.removed_bg)),
        LineKind::Header => (colors.style_header(), Style::default()),
        LineKind::Context => (colors.style_text(), Style::default()),
    }
}

/// One half of a split row: gutter + content, `width` columns
fn render_cell(
    row: &DisplayRow,
    side: Side,
    highlight: Option<&StyledLine>,
    cursor: bool,
    colors: &Colors,
    width: usize,
) -> Vec<Span<'static>> {
    let number = match side {
        Side::Old => row.old_number,
        Side::New => row.new_number,
    };
    let content_width = width.saturating_sub(NUM_WIDTH + 1);
    // placeholder opposite a change keeps the plain background
    let (fg, bg) = match number {
        Some(_) => kind_styles(row.kind, colors),
        None => (colors.style_muted(), Style::default()),
    };
    let overlay = bg.patch(cursor_style(cursor));

    let mut spans = vec![
        Span::styled(gutter(number), colors.style_muted()),
        Span::raw(" "),
    ];
    match highlight {
        Some(hl) => spans.extend(fit_spans(hl, content_width, Style::reset(), overlay)),
        None => spans.push(Span::styled(
            truncate_or_pad(&display_text(&row.text), content_width),
            fg.patch(overlay),
        )),
    }
    spans
}

/// A unified row: `old new ±content`, headers span the whole width
fn render_unified_row(
    row: &DisplayRow,
    highlight: Option<&StyledLine>,
    cursor: bool,
    colors: &Colors,
    width: usize,
) -> Line<'static> {
    let (fg, bg) = kind_styles(row.kind, colors);
    let overlay = bg.patch(cursor_style(cursor));

    if row.kind == LineKind::Header {
        return Line::from(Span::styled(truncate_or_pad(&row.text, width), fg.patch(overlay)));
    }

    let content_width = width.saturating_sub(2 * NUM_WIDTH + 3);
    let mut spans = vec![
        Span::styled(gutter(row.old_number), colors.style_muted()),
        Span::raw(" "),
        Span::styled(gutter(row.new_number), colors.style_muted()),
        Span::raw(" "),
        Span::styled(row.prefix, fg.patch(overlay)),
    ];
    match highlight {
        Some(hl) => spans.extend(fit_spans(hl, content_width, Style::reset(), overlay)),
        None => spans.push(Span::styled(
            truncate_or_pad(&display_text(&row.text), content_width),
            fg.patch(overlay),
        )),
    }
    Line::from(spans)
}
