use crossterm::event::{KeyEvent, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Position, Rect},
    text::{Line, Span},
    Frame,
};
use std::time::Instant;
use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::diff::split_patch;
use crate::event::KeyInput;
use crate::source::DiffSource;
use crate::ui::{
    centered_rect, Action, AppLayout, DiffView, DiffViewState, FileList, FileListState,
    FocusTarget, HelpModal, Highlighter, LayoutAreas, YankTarget,
};

const MOUSE_SCROLL_LINES: isize = 3;

/// Which window is focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedWindow {
    FileList,
    Preview,
}

impl FocusedWindow {
    pub fn next(self) -> Self {
        match self {
            Self::FileList => Self::Preview,
            Self::Preview => Self::FileList,
        }
    }
}

/// Transient message in the status bar
#[derive(Debug)]
struct StatusMessage {
    text: String,
    is_error: bool,
    shown_at: Instant,
}

/// Main application state
pub struct App {
    // Core
    pub running: bool,
    pub config: Config,
    source: DiffSource,

    // State
    pub focused: FocusedWindow,
    pub show_help: bool,
    status: Option<StatusMessage>,
    areas: LayoutAreas,

    // Widget states
    pub file_list_state: FileListState,
    pub diff_view_state: DiffViewState,

    highlighter: Option<Highlighter>,
}

impl App {
    /// `text` is the already loaded diff; the source is kept for reloads
    pub fn new(config: Config, source: DiffSource, text: &str) -> Self {
        let mut diff_view_state = DiffViewState::new(config.parse);
        if let Some(mode) = config.view_mode {
            diff_view_state.pin_view_mode(mode);
        }
        let highlighter = config.highlight.then(|| Highlighter::new(config.theme));

        let mut app = Self {
            running: true,
            config,
            source,
            focused: FocusedWindow::FileList,
            show_help: false,
            status: None,
            areas: LayoutAreas::default(),
            file_list_state: FileListState::new(),
            diff_view_state,
            highlighter,
        };
        app.set_text(text);
        app
    }

    fn has_file_list(&self) -> bool {
        self.file_list_state.file_count() > 1
    }

    fn set_text(&mut self, text: &str) {
        let files = split_patch(text, &self.config.parse);
        log::debug!("{} file(s) in diff from {}", files.len(), self.source.label());
        self.file_list_state.set_files(files);
        if !self.has_file_list() {
            self.focused = FocusedWindow::Preview;
        }
        self.update_preview();
    }

    /// Re-read the source. On failure the last good diff stays on screen.
    pub fn reload(&mut self) {
        if !self.source.is_reloadable() {
            self.set_status("stdin cannot be reloaded", true);
            return;
        }
        match self.source.load(self.config.input_format) {
            Ok(text) => {
                self.set_text(&text);
                self.set_status(format!("Reloaded {}", self.source.label()), false);
            }
            Err(e) => {
                log::warn!("Reloading {} failed: {}", self.source.label(), e);
                self.set_status(e.to_string(), true);
            }
        }
    }

    fn set_status(&mut self, text: impl Into<String>, is_error: bool) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error,
            shown_at: Instant::now(),
        });
    }

    pub fn handle_tick(&mut self) {
        let timeout = self.config.timing.status_timeout;
        if self.status.as_ref().is_some_and(|s| s.shown_at.elapsed() >= timeout) {
            self.status = None;
        }
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) {
        // Help modal takes priority
        if self.show_help {
            if KeyInput::is_help(&key) || KeyInput::is_escape(&key) {
                self.show_help = false;
            }
            return;
        }

        // Global keys
        if KeyInput::is_quit(&key) {
            self.running = false;
            return;
        }

        if KeyInput::is_help(&key) {
            self.show_help = true;
            return;
        }

        if KeyInput::is_refresh(&key) {
            self.reload();
            return;
        }

        if KeyInput::is_tab(&key) || KeyInput::is_shift_tab(&key) {
            if self.has_file_list() {
                self.focused = self.focused.next();
            }
            return;
        }

        // Window-specific keys - delegate to widget, dispatch action
        let action = match self.focused {
            FocusedWindow::FileList => self.file_list_state.handle_key(&key),
            FocusedWindow::Preview => self.diff_view_state.handle_key(&key),
        };

        self.dispatch(action);
    }

    /// Dispatch an action from a widget
    fn dispatch(&mut self, action: Action) {
        match action {
            Action::None | Action::Ignored => {}

            Action::ChangeFocus(FocusTarget::FileList) => {
                if self.has_file_list() {
                    self.focused = FocusedWindow::FileList;
                }
            }

            Action::ChangeFocus(FocusTarget::Preview) | Action::FileSelected(_) => {
                self.focused = FocusedWindow::Preview;
            }

            Action::Yank(target) => self.yank(target),
        }

        // File list moves change what the preview shows
        if self.focused == FocusedWindow::FileList {
            self.sync_preview();
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        let lines = match mouse.kind {
            MouseEventKind::ScrollDown => MOUSE_SCROLL_LINES,
            MouseEventKind::ScrollUp => -MOUSE_SCROLL_LINES,
            _ => return,
        };
        let position = Position::new(mouse.column, mouse.row);

        if self.areas.file_list.contains(position) {
            let scroll = &mut self.file_list_state.scroll;
            if lines > 0 {
                scroll.move_down_n(lines.unsigned_abs());
            } else {
                scroll.move_up_n(lines.unsigned_abs());
            }
            self.sync_preview();
        } else if self.areas.preview.contains(position) {
            self.diff_view_state.scroll_lines(lines);
        }
    }

    /// Show the selected file unless it is already showing
    fn sync_preview(&mut self) {
        let selected = self.file_list_state.selected().map(|f| f.path.as_str());
        if selected != self.diff_view_state.path() {
            self.update_preview();
        }
    }

    fn update_preview(&mut self) {
        match self.file_list_state.selected() {
            Some(file) => self.diff_view_state.set_content(
                Some(file.path.as_str()),
                &file.text,
                self.highlighter.as_ref(),
            ),
            None => self.diff_view_state.set_content(None, "", None),
        }
    }

    fn yank_text(&self, target: YankTarget) -> Option<String> {
        match (target, self.focused) {
            (YankTarget::Location, FocusedWindow::Preview) => self.diff_view_state.location(),
            (YankTarget::Location, FocusedWindow::FileList) => {
                self.file_list_state.selected().map(|f| f.path.clone())
            }
            (YankTarget::Content, _) => self.diff_view_state.current_content(),
        }
    }

    fn yank(&mut self, target: YankTarget) {
        let Some(text) = self.yank_text(target) else {
            return;
        };

        match arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text.as_str())) {
            Ok(()) => self.set_status(format!("Copied {}", text), false),
            Err(e) => {
                log::warn!("Clipboard unavailable: {}", e);
                self.set_status(format!("Clipboard unavailable: {}", e), true);
            }
        }
    }

    /// Render the UI
    pub fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let show_file_list = self.has_file_list();
        self.areas = AppLayout::default().compute(area, show_file_list);
        let areas = self.areas;
        let colors = &self.config.colors;

        if show_file_list {
            let file_list = FileList::new(colors).focused(self.focused == FocusedWindow::FileList);
            frame.render_stateful_widget(file_list, areas.file_list, &mut self.file_list_state);
        }

        self.diff_view_state.auto_adjust_view_mode(areas.preview.width);
        let diff_view = DiffView::new(colors)
            .focused(self.focused == FocusedWindow::Preview)
            .staged(self.config.staged);
        frame.render_stateful_widget(diff_view, areas.preview, &mut self.diff_view_state);

        self.render_status_bar(frame, areas.status_bar);

        if self.show_help {
            let help_area = centered_rect(60, 70, area);
            frame.render_widget(HelpModal::new(colors), help_area);
        }
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let colors = &self.config.colors;
        let total_width = area.width as usize;

        let (added, removed) = self.file_list_state.totals();
        let files = self.file_list_state.file_count();
        let left_content = format!(
            " {}  {} file{}  +{} -{}",
            self.source.label(),
            files,
            if files == 1 { "" } else { "s" },
            added,
            removed
        );

        let (right_content, right_style) = match &self.status {
            Some(status) => (
                format!("{} ", status.text),
                if status.is_error {
                    colors.style_error()
                } else {
                    colors.style_status_bar()
                },
            ),
            None => {
                let reconcile = if self.config.parse.reconcile_identical_lines {
                    " reconcile"
                } else {
                    ""
                };
                (
                    format!("{}{}  ? help ", self.diff_view_state.view_mode.label(), reconcile),
                    colors.style_status_bar(),
                )
            }
        };

        let right_width = right_content.width().min(total_width);
        let left_width = left_content.width();
        let padding = total_width.saturating_sub(left_width + right_width);

        let line = Line::from(vec![
            Span::styled(left_content, colors.style_status_bar()),
            Span::styled(" ".repeat(padding), colors.style_status_bar()),
            Span::styled(right_content, right_style),
        ]);
        frame.render_widget(line, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::ThemeMode;
    use crossterm::event::{KeyCode, KeyModifiers};
    use ratatui::{backend::TestBackend, Terminal};
    use std::io::Write;

    const TWO_FILES: &str = "\
diff --git a/a.txt b/a.txt
--- a/a.txt
+++ b/a.txt
@@ -1,2 +1,2 @@
 keep
-old
+new
diff --git a/b.txt b/b.txt
new file mode 100644
--- /dev/null
+++ b/b.txt
@@ -0,0 +1 @@
+hello
";

    fn config() -> Config {
        let mut config = Config::new(ThemeMode::Dark);
        config.highlight = false;
        config
    }

    fn app(text: &str) -> App {
        App::new(config(), DiffSource::Stdin, text)
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn screen(app: &mut App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| app.render(frame)).unwrap();
        let buffer = terminal.backend().buffer();
        (0..height)
            .map(|y| (0..width).map(|x| buffer[(x, y)].symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn multi_file_starts_in_file_list() {
        let app = app(TWO_FILES);
        assert_eq!(app.focused, FocusedWindow::FileList);
        assert_eq!(app.file_list_state.file_count(), 2);
        assert_eq!(app.diff_view_state.path(), Some("a.txt"));
    }

    #[test]
    fn moving_in_file_list_updates_preview() {
        let mut app = app(TWO_FILES);
        press(&mut app, KeyCode::Char('j'));
        assert_eq!(app.diff_view_state.path(), Some("b.txt"));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.focused, FocusedWindow::Preview);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.focused, FocusedWindow::FileList);
    }

    #[test]
    fn single_file_focuses_preview() {
        let mut app = app("@@ -1 +1 @@\n-a\n+b\n");
        assert_eq!(app.focused, FocusedWindow::Preview);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focused, FocusedWindow::Preview);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.focused, FocusedWindow::Preview);
    }

    #[test]
    fn quit_and_help() {
        let mut app = app(TWO_FILES);
        press(&mut app, KeyCode::Char('?'));
        assert!(app.show_help);
        // keys are swallowed while help is open
        press(&mut app, KeyCode::Char('q'));
        assert!(app.running);
        press(&mut app, KeyCode::Esc);
        assert!(!app.show_help);
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.running);
    }

    #[test]
    fn stdin_reload_reports_error() {
        let mut app = app(TWO_FILES);
        press(&mut app, KeyCode::Char('r'));
        let status = app.status.as_ref().unwrap();
        assert!(status.is_error);
        assert_eq!(app.file_list_state.file_count(), 2);
    }

    #[test]
    fn reload_reads_file_again() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "@@ -1 +1 @@\n-a\n+b\n").unwrap();
        let source = DiffSource::File(file.path().to_path_buf());
        let text = source.load(Default::default()).unwrap();
        let mut app = App::new(config(), source, &text);
        assert_eq!(app.file_list_state.totals(), (1, 1));

        std::fs::write(file.path(), TWO_FILES).unwrap();
        app.reload();
        assert_eq!(app.file_list_state.file_count(), 2);
        assert!(!app.status.as_ref().unwrap().is_error);
    }

    #[test]
    fn failed_reload_keeps_last_diff() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("change.diff");
        std::fs::write(&path, TWO_FILES).unwrap();
        let mut app = App::new(config(), DiffSource::File(path.clone()), TWO_FILES);

        std::fs::remove_file(&path).unwrap();
        app.reload();
        assert_eq!(app.file_list_state.file_count(), 2);
        assert!(app.status.as_ref().unwrap().text.contains("change.diff"));
    }

    #[test]
    fn status_message_expires() {
        let mut app = app(TWO_FILES);
        app.config.timing.status_timeout = std::time::Duration::ZERO;
        app.reload();
        app.handle_tick();
        assert!(app.status.is_none());
    }

    #[test]
    fn empty_diff_shows_placeholder() {
        let mut app = app("");
        assert_eq!(app.file_list_state.file_count(), 0);
        let text = screen(&mut app, 80, 10);
        assert!(text.contains("No changes detected"));
        assert!(text.contains("0 files"));
    }

    #[test]
    fn renders_file_list_and_diff() {
        let mut app = app(TWO_FILES);
        let text = screen(&mut app, 160, 20);
        assert!(text.contains("Files (2)"));
        assert!(text.contains("a.txt [split]"));
        assert!(text.contains("2 files  +2 -1"));
    }

    #[test]
    fn narrow_terminal_switches_to_unified() {
        let mut app = app("@@ -1 +1 @@\n-a\n+b\n");
        let text = screen(&mut app, 60, 10);
        assert!(text.contains("[unified]"));
        assert!(text.contains("Changes at line 1"));
    }

    #[test]
    fn yank_text_follows_focus() {
        let mut app = app(TWO_FILES);
        assert_eq!(app.yank_text(YankTarget::Location).as_deref(), Some("a.txt"));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.yank_text(YankTarget::Location).as_deref(), Some("a.txt:2"));
        assert_eq!(app.yank_text(YankTarget::Content).as_deref(), Some("old"));
    }
}
