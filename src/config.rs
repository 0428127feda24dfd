use ratatui::style::{Color, Modifier, Style};
use std::time::Duration;

use crate::diff::{ParseOptions, ViewMode};
use crate::source::InputFormat;
use crate::theme::ThemeMode;

/// Application configuration
pub struct Config {
    pub colors: Colors,
    pub timing: Timing,
    pub theme: ThemeMode,
    pub parse: ParseOptions,
    pub input_format: InputFormat,
    /// Pinned diff pane mode; `None` follows the pane width
    pub view_mode: Option<ViewMode>,
    pub highlight: bool,
    /// Label shown next to the file title ("staged" / "unstaged")
    pub staged: bool,
}

impl Config {
    pub fn new(theme: ThemeMode) -> Self {
        Self {
            colors: Colors::for_theme(theme),
            timing: Timing::default(),
            theme,
            parse: ParseOptions::default(),
            input_format: InputFormat::default(),
            view_mode: None,
            highlight: true,
            staged: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(ThemeMode::detect())
    }
}

/// Color palette - adapts to theme
pub struct Colors {
    pub added: Color,
    pub removed: Color,
    pub added_bg: Color,
    pub removed_bg: Color,
    pub renamed: Color,
    pub modified: Color,
    pub header: Color,
    pub muted: Color,
    pub text: Color,
    pub border: Color,
    pub border_focused: Color,
    pub status_bar: Color,
    pub status_bar_text: Color,
    pub error: Color,
}

impl Colors {
    pub fn for_theme(theme: ThemeMode) -> Self {
        match theme {
            ThemeMode::Dark => Self::dark(),
            ThemeMode::Light => Self::light(),
        }
    }

    /// Dark theme (Catppuccin Mocha inspired)
    pub fn dark() -> Self {
        Self {
            added: Color::Rgb(166, 227, 161),          // Green
            removed: Color::Rgb(243, 139, 168),        // Red
            added_bg: Color::Rgb(30, 50, 40),          // Dark green tint
            removed_bg: Color::Rgb(50, 30, 35),        // Dark red tint
            renamed: Color::Rgb(203, 166, 247),        // Mauve
            modified: Color::Rgb(250, 179, 135),       // Peach
            header: Color::Rgb(137, 180, 250),         // Blue
            muted: Color::Rgb(108, 112, 134),          // Overlay0
            text: Color::Rgb(205, 214, 244),           // Text
            border: Color::Rgb(69, 71, 90),            // Surface1
            border_focused: Color::Rgb(137, 180, 250), // Blue
            status_bar: Color::Rgb(49, 50, 68),        // Surface0
            status_bar_text: Color::Rgb(205, 214, 244),
            error: Color::Rgb(243, 139, 168),
        }
    }

    /// Light theme (high contrast for light backgrounds)
    pub fn light() -> Self {
        Self {
            added: Color::Rgb(0, 110, 0),
            removed: Color::Rgb(180, 0, 30),
            added_bg: Color::Rgb(210, 245, 210),
            removed_bg: Color::Rgb(255, 215, 220),
            renamed: Color::Rgb(90, 20, 180),
            modified: Color::Rgb(160, 80, 0),
            header: Color::Rgb(0, 60, 180),
            muted: Color::Rgb(60, 60, 70), // Dark gray (not light!)
            text: Color::Rgb(10, 10, 15),
            border: Color::Rgb(150, 155, 170),
            border_focused: Color::Rgb(0, 60, 180),
            status_bar: Color::Rgb(220, 225, 235),
            status_bar_text: Color::Rgb(10, 10, 15),
            error: Color::Rgb(180, 0, 30),
        }
    }

    pub fn style_added(&self) -> Style {
        Style::default().fg(self.added)
    }

    pub fn style_removed(&self) -> Style {
        Style::default().fg(self.removed)
    }

    pub fn style_muted(&self) -> Style {
        Style::default().fg(self.muted)
    }

    pub fn style_text(&self) -> Style {
        Style::reset().fg(self.text)
    }

    pub fn style_header(&self) -> Style {
        Style::default().fg(self.header).add_modifier(Modifier::BOLD)
    }

    pub fn style_selected(&self) -> Style {
        Style::default().fg(self.text).add_modifier(Modifier::BOLD)
    }

    pub fn border_style(&self, focused: bool) -> Style {
        if focused {
            Style::default().fg(self.border_focused)
        } else {
            Style::default().fg(self.border)
        }
    }

    pub fn style_status_bar(&self) -> Style {
        Style::default().bg(self.status_bar).fg(self.status_bar_text)
    }

    pub fn style_error(&self) -> Style {
        Style::default()
            .bg(self.status_bar)
            .fg(self.error)
            .add_modifier(Modifier::BOLD)
    }
}

pub struct Timing {
    pub tick_rate: Duration,
    /// Quiet period before a burst of writes to the diff file is reported
    pub watch_debounce: Duration,
    pub status_timeout: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            tick_rate: Duration::from_millis(100),
            watch_debounce: Duration::from_millis(300),
            status_timeout: Duration::from_secs(3),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palettes_differ_by_theme() {
        let dark = Colors::for_theme(ThemeMode::Dark);
        let light = Colors::for_theme(ThemeMode::Light);
        assert_ne!(dark.text, light.text);
        assert_ne!(dark.added_bg, light.added_bg);
    }

    #[test]
    fn border_style_tracks_focus() {
        let colors = Colors::dark();
        assert_eq!(colors.border_style(true).fg, Some(colors.border_focused));
        assert_eq!(colors.border_style(false).fg, Some(colors.border));
    }

    #[test]
    fn defaults_do_not_reconcile() {
        let config = Config::new(ThemeMode::Dark);
        assert!(!config.parse.reconcile_identical_lines);
        assert_eq!(config.view_mode, None);
        assert_eq!(config.input_format, InputFormat::Plain);
        assert!(config.highlight);
    }
}
