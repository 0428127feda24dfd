use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent};
use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, DebouncedEventKind, Debouncer};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// Application events
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Terminal key press
    Key(KeyEvent),
    /// Mouse event
    Mouse(MouseEvent),
    /// The watched diff file was written
    FileChanged,
    /// Tick for periodic updates
    Tick,
}

/// Event handler that polls the terminal in a separate thread
pub struct EventHandler {
    rx: mpsc::Receiver<AppEvent>,
    _tx: mpsc::Sender<AppEvent>,
    _watcher: Option<Debouncer<RecommendedWatcher>>,
}

impl EventHandler {
    /// `watch` is the diff file to re-read on change, if any
    pub fn new(tick_rate: Duration, watch: Option<(&Path, Duration)>) -> Self {
        let (tx, rx) = mpsc::channel();
        let event_tx = tx.clone();

        let watcher = watch.and_then(|(path, debounce)| Self::setup_watcher(path, debounce, tx.clone()));

        thread::spawn(move || loop {
            let event = if event::poll(tick_rate).unwrap_or(false) {
                match event::read() {
                    Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => AppEvent::Key(key),
                    Ok(Event::Mouse(mouse)) => AppEvent::Mouse(mouse),
                    _ => continue,
                }
            } else {
                AppEvent::Tick
            };

            if event_tx.send(event).is_err() {
                break;
            }
        });

        Self {
            rx,
            _tx: tx,
            _watcher: watcher,
        }
    }

    /// Watch the file's directory rather than the file itself: editors and
    /// `git diff > file` often replace the file, which drops a direct watch.
    fn setup_watcher(
        path: &Path,
        debounce: Duration,
        tx: mpsc::Sender<AppEvent>,
    ) -> Option<Debouncer<RecommendedWatcher>> {
        let target = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let dir = match target.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file_name = target.file_name()?.to_os_string();

        let debouncer = new_debouncer(debounce, move |res: DebounceEventResult| match res {
            Ok(events) => {
                let touched = events.iter().any(|event| {
                    matches!(event.kind, DebouncedEventKind::Any)
                        && event.path.file_name() == Some(file_name.as_os_str())
                });
                if touched {
                    let _ = tx.send(AppEvent::FileChanged);
                }
            }
            Err(e) => log::warn!("File watcher error: {:?}", e),
        });

        let mut debouncer = match debouncer {
            Ok(debouncer) => debouncer,
            Err(e) => {
                log::warn!("Failed to create file watcher: {}", e);
                return None;
            }
        };

        if let Err(e) = debouncer.watcher().watch(&dir, RecursiveMode::NonRecursive) {
            log::warn!("Failed to watch {}: {}", dir.display(), e);
            return None;
        }
        log::debug!("Watching {} for changes", target.display());
        Some(debouncer)
    }

    /// Get the next event (blocking)
    pub fn next(&self) -> Result<AppEvent> {
        Ok(self.rx.recv()?)
    }

    /// Get a queued event without blocking
    pub fn try_next(&self) -> Option<AppEvent> {
        self.rx.try_recv().ok()
    }
}

/// Key input helper
pub struct KeyInput;

impl KeyInput {
    pub fn is_quit(key: &KeyEvent) -> bool {
        matches!(
            key,
            KeyEvent {
                code: KeyCode::Char('q'),
                modifiers: KeyModifiers::NONE,
                ..
            } | KeyEvent {
                code: KeyCode::Char('c'),
                modifiers: KeyModifiers::CONTROL,
                ..
            }
        )
    }

    pub fn is_down(key: &KeyEvent) -> bool {
        matches!(key.code, KeyCode::Char('j') | KeyCode::Down) && key.modifiers == KeyModifiers::NONE
    }

    pub fn is_up(key: &KeyEvent) -> bool {
        matches!(key.code, KeyCode::Char('k') | KeyCode::Up) && key.modifiers == KeyModifiers::NONE
    }

    pub fn is_fast_down(key: &KeyEvent) -> bool {
        key.code == KeyCode::Char('J') && key.modifiers == KeyModifiers::SHIFT
    }

    pub fn is_fast_up(key: &KeyEvent) -> bool {
        key.code == KeyCode::Char('K') && key.modifiers == KeyModifiers::SHIFT
    }

    pub fn is_tab(key: &KeyEvent) -> bool {
        key.code == KeyCode::Tab && key.modifiers == KeyModifiers::NONE
    }

    pub fn is_shift_tab(key: &KeyEvent) -> bool {
        key.code == KeyCode::BackTab
            || (key.code == KeyCode::Tab && key.modifiers == KeyModifiers::SHIFT)
    }

    pub fn is_page_down(key: &KeyEvent) -> bool {
        (key.code == KeyCode::Char('d') && key.modifiers == KeyModifiers::CONTROL)
            || key.code == KeyCode::PageDown
    }

    pub fn is_page_up(key: &KeyEvent) -> bool {
        (key.code == KeyCode::Char('u') && key.modifiers == KeyModifiers::CONTROL)
            || key.code == KeyCode::PageUp
    }

    pub fn is_top(key: &KeyEvent) -> bool {
        key.code == KeyCode::Char('g') && key.modifiers == KeyModifiers::NONE
    }

    pub fn is_bottom(key: &KeyEvent) -> bool {
        key.code == KeyCode::Char('G') && key.modifiers == KeyModifiers::SHIFT
    }

    pub fn is_enter(key: &KeyEvent) -> bool {
        key.code == KeyCode::Enter
    }

    pub fn is_escape(key: &KeyEvent) -> bool {
        key.code == KeyCode::Esc
    }

    pub fn is_help(key: &KeyEvent) -> bool {
        key.code == KeyCode::Char('?')
    }

    pub fn is_yank(key: &KeyEvent) -> bool {
        key.code == KeyCode::Char('y') && key.modifiers == KeyModifiers::NONE
    }

    pub fn is_yank_content(key: &KeyEvent) -> bool {
        key.code == KeyCode::Char('Y') && key.modifiers == KeyModifiers::SHIFT
    }

    pub fn is_refresh(key: &KeyEvent) -> bool {
        key.code == KeyCode::Char('r') && key.modifiers == KeyModifiers::NONE
    }

    pub fn is_toggle_view_mode(key: &KeyEvent) -> bool {
        key.code == KeyCode::Char('s') && key.modifiers == KeyModifiers::NONE
    }

    pub fn is_next_change(key: &KeyEvent) -> bool {
        matches!(key.code, KeyCode::Char(']') | KeyCode::Char('n'))
            && key.modifiers == KeyModifiers::NONE
    }

    pub fn is_prev_change(key: &KeyEvent) -> bool {
        (key.code == KeyCode::Char('[') && key.modifiers == KeyModifiers::NONE)
            || (key.code == KeyCode::Char('N') && key.modifiers == KeyModifiers::SHIFT)
    }
}
