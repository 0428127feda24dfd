use ratatui::style::{Color, Modifier, Style};
use syntect::easy::HighlightLines;
use syntect::highlighting::{FontStyle, Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};

use crate::theme::ThemeMode;

/// Styled fragments of one source line
pub type StyledLine = Vec<(String, Style)>;

const THEME_NAME: &str = "base16-eighties.dark";

/// Syntax highlighter using syntect
pub struct Highlighter {
    syntax_set: SyntaxSet,
    theme: Option<Theme>,
    theme_mode: ThemeMode,
}

impl Highlighter {
    pub fn new(mode: ThemeMode) -> Self {
        // Light mode reuses the dark theme and darkens its colours
        let mut themes = ThemeSet::load_defaults().themes;
        let theme = themes
            .remove(THEME_NAME)
            .or_else(|| themes.into_values().next());
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme,
            theme_mode: mode,
        }
    }

    fn syntax_for(&self, path: &str, first_line: &str) -> &SyntaxReference {
        let file_name = path.rsplit('/').next().unwrap_or(path);
        let extension = file_name.rsplit_once('.').map(|(_, ext)| ext).unwrap_or(file_name);

        let mapped = match extension {
            "ts" | "tsx" | "mts" | "cts" => "typescript",
            "jsx" | "mjs" | "cjs" => "js",
            "yml" => "yaml",
            "md" => "markdown",
            ext => ext,
        };

        self.syntax_set
            .find_syntax_by_extension(mapped)
            .or_else(|| self.syntax_set.find_syntax_by_extension(extension))
            .or_else(|| {
                // no TypeScript grammar in the default set
                if mapped == "typescript" {
                    self.syntax_set.find_syntax_by_extension("js")
                } else {
                    None
                }
            })
            .or_else(|| self.syntax_set.find_syntax_by_first_line(first_line))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text())
    }

    /// Highlight consecutive lines of one file. Always returns one entry per
    /// input line; lines that fail to highlight come back unstyled.
    pub fn highlight_lines(&self, lines: &[&str], path: &str) -> Vec<StyledLine> {
        let Some(theme) = &self.theme else {
            return lines.iter().map(|l| vec![(l.to_string(), Style::reset())]).collect();
        };

        let syntax = self.syntax_for(path, lines.first().copied().unwrap_or(""));
        let mut highlighter = HighlightLines::new(syntax, theme);
        let is_light = self.theme_mode == ThemeMode::Light;

        lines
            .iter()
            .map(|line| {
                // newline-aware syntaxes need the terminator to close line comments
                let with_newline = format!("{}\n", line);
                match highlighter.highlight_line(&with_newline, &self.syntax_set) {
                    Ok(ranges) => ranges
                        .into_iter()
                        .map(|(style, text)| {
                            (
                                text.trim_end_matches('\n').to_string(),
                                syntect_to_ratatui_style(&style, is_light),
                            )
                        })
                        .filter(|(text, _)| !text.is_empty())
                        .collect(),
                    Err(e) => {
                        log::debug!("Highlighting {} failed: {}", path, e);
                        vec![(line.to_string(), Style::reset())]
                    }
                }
            })
            .collect()
    }
}

/// Convert syntect style to ratatui style (foreground only, no background)
fn syntect_to_ratatui_style(style: &syntect::highlighting::Style, is_light: bool) -> Style {
    let fg = if is_light {
        darken_for_light_mode(style.foreground)
    } else {
        Color::Rgb(style.foreground.r, style.foreground.g, style.foreground.b)
    };

    let mut ratatui_style = Style::reset().fg(fg);
    if style.font_style.contains(FontStyle::BOLD) {
        ratatui_style = ratatui_style.add_modifier(Modifier::BOLD);
    }
    if style.font_style.contains(FontStyle::ITALIC) {
        ratatui_style = ratatui_style.add_modifier(Modifier::ITALIC);
    }
    if style.font_style.contains(FontStyle::UNDERLINE) {
        ratatui_style = ratatui_style.add_modifier(Modifier::UNDERLINED);
    }
    ratatui_style
}

/// Bright colours meant for a dark background are scaled down
fn darken_for_light_mode(color: syntect::highlighting::Color) -> Color {
    let lum = (0.299 * f32::from(color.r) + 0.587 * f32::from(color.g) + 0.114 * f32::from(color.b))
        / 255.0;
    if lum <= 0.5 {
        return Color::Rgb(color.r, color.g, color.b);
    }
    let scale = |c: u8| (f32::from(c) * 0.35) as u8;
    Color::Rgb(scale(color.r), scale(color.g), scale(color.b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_entry_per_line() {
        let highlighter = Highlighter::new(ThemeMode::Dark);
        let lines = ["fn main() {", "    // hi", "}"];
        let styled = highlighter.highlight_lines(&lines, "src/main.rs");
        assert_eq!(styled.len(), 3);
        let rebuilt: String = styled[1].iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(rebuilt, "    // hi");
    }

    #[test]
    fn unknown_extension_falls_back_to_plain_text() {
        let highlighter = Highlighter::new(ThemeMode::Light);
        let styled = highlighter.highlight_lines(&["whatever"], "notes.zzz");
        let rebuilt: String = styled[0].iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(rebuilt, "whatever");
    }

    #[test]
    fn light_mode_darkens_bright_colours() {
        let bright = syntect::highlighting::Color { r: 240, g: 240, b: 240, a: 255 };
        assert!(matches!(darken_for_light_mode(bright), Color::Rgb(r, _, _) if r < 100));
        let dark = syntect::highlighting::Color { r: 20, g: 20, b: 20, a: 255 };
        assert_eq!(darken_for_light_mode(dark), Color::Rgb(20, 20, 20));
    }
}
