//! Column-width helpers for painting diff text

use ratatui::style::Style;
use ratatui::text::Span;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::diff::EMPTY_CELL;

const TAB: &str = "    ";
const ELLIPSIS: char = '\u{2026}';

/// Check the leading bytes for NUL, which text diffs never contain
pub fn is_binary(content: &str) -> bool {
    content.bytes().take(8192).any(|b| b == 0)
}

/// Tabs become four spaces; the one-row placeholder becomes a blank
pub fn display_text(text: &str) -> String {
    if text == EMPTY_CELL {
        return String::new();
    }
    text.replace('\t', TAB)
}

/// Fit `s` into exactly `width` terminal columns, ending in an ellipsis when
/// it had to be cut.
pub fn truncate_or_pad(s: &str, width: usize) -> String {
    let current = s.width();
    if current <= width {
        let mut out = String::with_capacity(s.len() + width - current);
        out.push_str(s);
        out.extend(std::iter::repeat(' ').take(width - current));
        return out;
    }
    if width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > width - 1 {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push(ELLIPSIS);
    used += 1;
    out.extend(std::iter::repeat(' ').take(width.saturating_sub(used)));
    out
}

/// Same as [`truncate_or_pad`] for a run of styled spans. `fill` styles the
/// padding; `patch` is applied on top of every span.
pub fn fit_spans(
    spans: &[(String, Style)],
    width: usize,
    fill: Style,
    patch: Style,
) -> Vec<Span<'static>> {
    let mut out = Vec::with_capacity(spans.len() + 1);
    let mut used = 0;

    for (text, style) in spans {
        let text = display_text(text);
        let remaining = width.saturating_sub(used);
        if remaining == 0 {
            break;
        }
        let piece = if text.width() > remaining {
            truncate_or_pad(&text, remaining)
        } else {
            text
        };
        used += piece.width();
        out.push(Span::styled(piece, style.patch(patch)));
    }

    if used < width {
        out.push(Span::styled(" ".repeat(width - used), fill.patch(patch)));
    }
    out
}
