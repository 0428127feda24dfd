use crossterm::event::KeyEvent;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, StatefulWidget, Widget},
};
use unicode_width::UnicodeWidthStr;

use crate::config::Colors;
use crate::diff::{FilePatch, FileStatus};
use crate::event::KeyInput;

use super::{Action, FocusTarget, ScrollState, YankTarget};

/// File list widget state
#[derive(Debug, Default)]
pub struct FileListState {
    pub files: Vec<FilePatch>,
    pub scroll: ScrollState,
}

impl FileListState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the files, keeping the cursor on the same path when it survives
    pub fn set_files(&mut self, files: Vec<FilePatch>) {
        let previous = self.selected().map(|f| f.path.clone());
        self.files = files;
        self.scroll.set_len(self.files.len());

        if let Some(idx) = previous.and_then(|path| self.files.iter().position(|f| f.path == path)) {
            self.scroll.cursor = idx;
        }
    }

    pub fn selected(&self) -> Option<&FilePatch> {
        self.files.get(self.scroll.cursor)
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Summed (added, removed) over every file
    pub fn totals(&self) -> (usize, usize) {
        self.files
            .iter()
            .fold((0, 0), |(a, r), f| (a + f.stats.added, r + f.stats.removed))
    }

    /// Handle key input, return action for App to dispatch
    pub fn handle_key(&mut self, key: &KeyEvent) -> Action {
        if KeyInput::is_down(key) {
            self.scroll.move_down();
        } else if KeyInput::is_up(key) {
            self.scroll.move_up();
        } else if KeyInput::is_fast_down(key) {
            self.scroll.move_down_n(5);
        } else if KeyInput::is_fast_up(key) {
            self.scroll.move_up_n(5);
        } else if KeyInput::is_top(key) {
            self.scroll.go_top();
        } else if KeyInput::is_bottom(key) {
            self.scroll.go_bottom();
        } else if KeyInput::is_enter(key) {
            return match self.selected() {
                Some(_) => Action::FileSelected(self.scroll.cursor),
                None => Action::None,
            };
        } else if KeyInput::is_yank(key) {
            return Action::Yank(YankTarget::Location);
        } else if KeyInput::is_toggle_view_mode(key) || KeyInput::is_next_change(key) {
            // diff-pane keys jump straight into the diff
            return Action::ChangeFocus(FocusTarget::Preview);
        } else {
            return Action::Ignored;
        }
        Action::None
    }
}

/// File list widget
pub struct FileList<'a> {
    colors: &'a Colors,
    focused: bool,
}

impl<'a> FileList<'a> {
    pub fn new(colors: &'a Colors) -> Self {
        Self {
            colors,
            focused: false,
        }
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }
}

impl<'a> StatefulWidget for FileList<'a> {
    type State = FileListState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let title = format!("Files ({})", state.file_count());
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.colors.border_style(self.focused))
            .title(Span::styled(title, self.colors.style_header()));

        let inner = block.inner(area);
        block.render(area, buf);

        let height = inner.height as usize;
        state.scroll.ensure_visible(height);

        for (i, (idx, file)) in state
            .files
            .iter()
            .enumerate()
            .skip(state.scroll.offset)
            .take(height)
            .enumerate()
        {
            let y = inner.y + i as u16;
            let is_selected = idx == state.scroll.cursor;
            let line = render_entry(file, is_selected, inner.width as usize, self.colors);
            buf.set_line(inner.x, y, &line, inner.width);
        }
    }
}

fn status_style(status: FileStatus, colors: &Colors) -> Style {
    match status {
        FileStatus::Modified => Style::default().fg(colors.modified),
        FileStatus::Added => colors.style_added(),
        FileStatus::Deleted => colors.style_removed(),
        FileStatus::Renamed => Style::default().fg(colors.renamed),
    }
}

fn render_entry(file: &FilePatch, selected: bool, width: usize, colors: &Colors) -> Line<'static> {
    let cursor = if selected { ">" } else { " " };
    let added = format!("+{}", file.stats.added);
    let removed = format!("-{}", file.stats.removed);

    // "> M path  +a -r"
    let fixed = 4 + added.width() + 1 + removed.width() + 1;
    let path = shorten_path(&file.path, width.saturating_sub(fixed));
    let pad = width.saturating_sub(fixed + path.width());

    let name_style = if selected {
        colors.style_selected()
    } else {
        colors.style_text()
    };

    Line::from(vec![
        Span::raw(cursor),
        Span::raw(" "),
        Span::styled(file.status.to_string(), status_style(file.status, colors)),
        Span::raw(" "),
        Span::styled(path, name_style),
        Span::raw(" ".repeat(pad + 1)),
        Span::styled(added, colors.style_added()),
        Span::raw(" "),
        Span::styled(removed, colors.style_removed()),
    ])
}

/// Keep the tail of a path that does not fit: `…/widgets/mod.rs`
fn shorten_path(path: &str, max_width: usize) -> String {
    if path.width() <= max_width {
        return path.to_string();
    }
    let mut kept = String::new();
    for part in path.rsplit('/') {
        let candidate = if kept.is_empty() {
            part.to_string()
        } else {
            format!("{}/{}", part, kept)
        };
        if candidate.width() + 2 > max_width {
            break;
        }
        kept = candidate;
    }
    if kept.is_empty() {
        let tail: String = path.chars().rev().take(max_width.saturating_sub(1)).collect();
        return format!("\u{2026}{}", tail.chars().rev().collect::<String>());
    }
    format!("\u{2026}/{}", kept)
}
