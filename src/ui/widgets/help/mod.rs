use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};

use crate::config::Colors;

const SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "Navigation",
        &[
            ("j/k", "Move up/down"),
            ("J/K", "Move fast (5 lines)"),
            ("Ctrl-d/u", "Page down/up"),
            ("g/G", "Jump to top/bottom"),
            ("Tab", "Switch between file list and diff"),
            ("Enter", "Open the selected file's diff"),
            ("Esc", "Back to file list"),
        ],
    ),
    (
        "Diff View",
        &[
            ("s", "Toggle split/unified view"),
            ("] / n", "Next change"),
            ("[ / N", "Previous change"),
        ],
    ),
    (
        "Actions",
        &[
            ("y", "Copy path:line to clipboard"),
            ("Y", "Copy line content to clipboard"),
            ("r", "Reload the diff"),
            ("q", "Quit"),
        ],
    ),
];

/// Help modal widget
pub struct HelpModal<'a> {
    colors: &'a Colors,
}

impl<'a> HelpModal<'a> {
    pub fn new(colors: &'a Colors) -> Self {
        Self { colors }
    }

    fn lines(&self) -> Vec<Line<'static>> {
        let mut lines = vec![Line::from("")];
        for (title, bindings) in SECTIONS {
            lines.push(Line::from(Span::styled(*title, self.colors.style_header())));
            lines.extend(bindings.iter().map(|&(key, desc)| format_binding(key, desc, self.colors)));
            lines.push(Line::from(""));
        }
        lines.push(Line::from(Span::styled(
            "Press ? or Esc to close",
            self.colors.style_muted(),
        )));
        lines
    }
}

impl<'a> Widget for HelpModal<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.colors.border_style(true))
            .title(Span::styled("diffpane - keys", self.colors.style_header()))
            .title_alignment(Alignment::Center);

        let inner = block.inner(area);
        block.render(area, buf);

        Paragraph::new(self.lines())
            .wrap(Wrap { trim: false })
            .render(inner, buf);
    }
}

fn format_binding(key: &'static str, desc: &'static str, colors: &Colors) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:>12}", key), colors.style_header()),
        Span::raw("  "),
        Span::styled(desc, colors.style_text()),
    ])
}
