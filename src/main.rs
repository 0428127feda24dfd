mod app;
mod config;
mod diff;
mod event;
mod print;
mod source;
mod theme;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;

use app::App;
use config::Config;
use diff::{ParseOptions, ViewMode};
use event::{AppEvent, EventHandler};
use print::OutputFormat;
use source::{DiffSource, InputFormat};
use theme::ThemeMode;

/// diffpane - split and unified diff viewer
#[derive(Parser, Debug)]
#[command(name = "diffpane")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Diff file to show, or "-" for stdin
    #[arg(default_value = "-")]
    path: PathBuf,

    /// Start in unified mode and stay there
    #[arg(long)]
    unified: bool,

    /// Fold removed/added pairs whose text is identical
    #[arg(long)]
    reconcile: bool,

    /// Input is a backend payload: {"success", "diff", "error"}
    #[arg(long)]
    json_payload: bool,

    /// Label the diff as staged
    #[arg(long)]
    staged: bool,

    /// Write the rendered diff to stdout instead of opening the viewer
    #[arg(long)]
    print: bool,

    /// Print mode output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Re-read PATH whenever it changes
    #[arg(long)]
    watch: bool,

    /// Disable syntax highlighting
    #[arg(long)]
    no_highlight: bool,

    /// Colour theme (detected from the terminal by default)
    #[arg(long, value_enum)]
    theme: Option<ThemeMode>,
}

impl Args {
    fn config(&self) -> Config {
        // Print mode must not query the terminal
        let theme = match (self.theme, self.print) {
            (Some(theme), _) => theme,
            (None, true) => ThemeMode::default(),
            (None, false) => ThemeMode::detect(),
        };

        let mut config = Config::new(theme);
        config.parse = if self.reconcile {
            ParseOptions::reconciling()
        } else {
            ParseOptions::default()
        };
        config.input_format = if self.json_payload {
            InputFormat::JsonPayload
        } else {
            InputFormat::Plain
        };
        config.view_mode = self.unified.then_some(ViewMode::Unified);
        config.highlight = !self.no_highlight;
        config.staged = self.staged;
        config
    }
}

/// Logs go to a file while the viewer owns the terminal, to stderr otherwise
fn init_logging(to_file: bool) -> Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if to_file {
        let path = std::env::temp_dir().join("diffpane.log");
        let log_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(log_file)));
    }
    builder.init();
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(!args.print)?;

    let source = DiffSource::from_arg(&args.path);
    let config = args.config();
    let text = source
        .load(config.input_format)
        .with_context(|| format!("Failed to load diff from {}", source.label()))?;

    if args.print {
        let mode = config.view_mode.unwrap_or_default();
        let mut stdout = io::stdout().lock();
        return print::write_report(&mut stdout, &text, &config.parse, mode, args.format);
    }

    let watch_path = if args.watch {
        let path = source.watch_path().map(|p| p.to_path_buf());
        if path.is_none() {
            log::warn!("--watch ignored: {} cannot be re-read", source.label());
        }
        path
    } else {
        None
    };
    let tick_rate = config.timing.tick_rate;
    let debounce = config.timing.watch_debounce;

    let mut app = App::new(config, source, &text);

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = EventHandler::new(tick_rate, watch_path.as_deref().map(|p| (p, debounce)));

    // Main loop
    let result = run_app(&mut terminal, &mut app, &events);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => app.handle_key(key),
        AppEvent::Mouse(mouse) => app.handle_mouse(mouse),
        AppEvent::Tick => app.handle_tick(),
        AppEvent::FileChanged => app.reload(),
    }
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App, events: &EventHandler) -> Result<()> {
    while app.running {
        terminal.draw(|frame| {
            app.render(frame);
        })?;

        match events.next()? {
            AppEvent::FileChanged => {
                // Drain queued FileChanged events to coalesce rapid saves
                let mut pending = Vec::new();
                while let Some(evt) = events.try_next() {
                    if !matches!(evt, AppEvent::FileChanged) {
                        pending.push(evt);
                    }
                }
                app.reload();
                for evt in pending {
                    handle_event(app, evt);
                }
            }
            event => handle_event(app, event),
        }
    }

    Ok(())
}
