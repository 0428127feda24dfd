//! Non-interactive output: the rendered diff written to stdout as text or JSON

use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;
use std::io::Write;
use unicode_width::UnicodeWidthStr;

use crate::diff::{
    parse_with, render_with, split_patch, DiffStats, DisplayRow, FilePatch, FileStatus,
    LineKind, ParseOptions, ParseResult, RenderedDiff, ViewMode, EMPTY_CELL,
};

const GUTTER_WIDTH: usize = 5;

/// Print mode output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Serialize)]
struct FileReport<'a> {
    path: &'a str,
    status: FileStatus,
    stats: DiffStats,
    parse: ParseResult,
    rendered: RenderedDiff,
}

impl<'a> FileReport<'a> {
    fn new(file: &'a FilePatch, options: &ParseOptions, mode: ViewMode) -> Self {
        let parse = parse_with(&file.text, options);
        let rendered = render_with(&parse, mode, options);
        Self {
            path: &file.path,
            status: file.status,
            stats: file.stats,
            parse,
            rendered,
        }
    }
}

/// Parse, render and write every file section of `text`
pub fn write_report<W: Write>(
    out: &mut W,
    text: &str,
    options: &ParseOptions,
    mode: ViewMode,
    format: OutputFormat,
) -> Result<()> {
    let files = split_patch(text, options);
    log::debug!("Printing {} file(s) as {:?}", files.len(), format);

    match format {
        OutputFormat::Json => {
            let reports: Vec<FileReport> = files
                .iter()
                .map(|file| FileReport::new(file, options, mode))
                .collect();
            serde_json::to_writer_pretty(&mut *out, &reports)?;
            writeln!(out)?;
        }
        OutputFormat::Text => {
            if files.is_empty() {
                let rendered = render_with(&ParseResult::default(), mode, options);
                return write_rendered(out, &rendered);
            }
            let banners = files.len() > 1;
            for (idx, file) in files.iter().enumerate() {
                if banners {
                    if idx > 0 {
                        writeln!(out)?;
                    }
                    writeln!(
                        out,
                        "==> {} [{}] +{} -{} <==",
                        file.path, file.status, file.stats.added, file.stats.removed
                    )?;
                }
                let rendered = render_with(&parse_with(&file.text, options), mode, options);
                write_rendered(out, &rendered)?;
            }
        }
    }
    Ok(())
}

fn gutter(number: Option<usize>) -> String {
    match number {
        Some(n) => format!("{:>width$}", n, width = GUTTER_WIDTH),
        None => " ".repeat(GUTTER_WIDTH),
    }
}

fn plain(row: &DisplayRow) -> &str {
    if row.text == EMPTY_CELL {
        ""
    } else {
        &row.text
    }
}

/// Change marker for a split cell; placeholders have no line number and no marker
fn marker(row: &DisplayRow, number: Option<usize>) -> char {
    match (row.kind, number) {
        (_, None) => ' ',
        (LineKind::Added, _) => '+',
        (LineKind::Removed, _) => '-',
        _ => ' ',
    }
}

fn write_rendered<W: Write>(out: &mut W, rendered: &RenderedDiff) -> Result<()> {
    match rendered {
        RenderedDiff::NoChanges { message } => writeln!(out, "{}", message)?,

        RenderedDiff::Unified { rows } => {
            for row in rows {
                if row.kind == LineKind::Header {
                    writeln!(out, "{}", row.text)?;
                } else {
                    writeln!(
                        out,
                        "{} {} {}{}",
                        gutter(row.old_number),
                        gutter(row.new_number),
                        row.prefix,
                        row.text
                    )?;
                }
            }
        }

        RenderedDiff::Split { old, new } => {
            let column_width = old.iter().map(|row| plain(row).width()).max().unwrap_or(0);
            for (left, right) in old.iter().zip(new) {
                let left_text = plain(left);
                let padding = column_width.saturating_sub(left_text.width());
                let line = format!(
                    "{} {}{}{} | {} {}{}",
                    gutter(left.old_number),
                    marker(left, left.old_number),
                    left_text,
                    " ".repeat(padding),
                    gutter(right.new_number),
                    marker(right, right.new_number),
                    plain(right)
                );
                writeln!(out, "{}", line.trim_end())?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{NO_CHANGES, NO_CHANGES_IDENTICAL};
    use pretty_assertions::assert_eq;

    const ONE_HUNK: &str = "@@ -1,2 +1,2 @@\n keep\n-old\n+new\n";

    fn report(text: &str, options: &ParseOptions, mode: ViewMode, format: OutputFormat) -> String {
        let mut out = Vec::new();
        write_report(&mut out, text, options, mode, format).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn text(input: &str, mode: ViewMode) -> String {
        report(input, &ParseOptions::default(), mode, OutputFormat::Text)
    }

    #[test]
    fn unified_text_rows() {
        assert_eq!(
            text(ONE_HUNK, ViewMode::Unified),
            "Changes at line 1 (1 line removed, 1 line added)\n\
             \x20   1     1  keep\n\
             \x20   2       -old\n\
             \x20         2 +new\n"
        );
    }

    #[test]
    fn split_text_rows() {
        assert_eq!(
            text(ONE_HUNK, ViewMode::Split),
            "    1  keep |     1  keep\n\
             \x20   2 -old  |\n\
             \x20           |     2 +new\n"
        );
    }

    #[test]
    fn hunkless_body_is_printed() {
        assert_eq!(
            text("-a\n+b\n", ViewMode::Unified),
            "    1       -a\n\
             \x20         1 +b\n"
        );
    }

    #[test]
    fn empty_input_prints_placeholder() {
        assert_eq!(text("", ViewMode::Split), format!("{}\n", NO_CHANGES));

        let reconciling = ParseOptions::reconciling();
        let out = report("@@ -1 +1 @@\n-same\n+same\n", &reconciling, ViewMode::Unified, OutputFormat::Text);
        assert_eq!(out, format!("{}\n", NO_CHANGES_IDENTICAL));
    }

    #[test]
    fn multi_file_text_has_banners() {
        let patch = "\
diff --git a/a.txt b/a.txt
--- a/a.txt
+++ b/a.txt
@@ -1 +1 @@
-a
+b
diff --git a/b.txt b/b.txt
deleted file mode 100644
--- a/b.txt
+++ /dev/null
@@ -1 +0,0 @@
-gone
";
        let out = text(patch, ViewMode::Unified);
        assert!(out.starts_with("==> a.txt [M] +1 -1 <==\n"));
        assert!(out.contains("\n\n==> b.txt [D] +0 -1 <==\n"));
        assert!(out.contains("diff --git a/b.txt b/b.txt\n"));
    }

    #[test]
    fn json_report_per_file() {
        let out = report(ONE_HUNK, &ParseOptions::default(), ViewMode::Unified, OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        let file = &value[0];
        assert_eq!(file["path"], "(diff)");
        assert_eq!(file["status"], "modified");
        assert_eq!(file["stats"]["added"], 1);
        assert_eq!(file["parse"]["hunks"][0]["new_start"], 1);
        assert_eq!(file["rendered"]["mode"], "unified");
        assert_eq!(file["rendered"]["rows"][2]["prefix"], "-");
    }

    #[test]
    fn json_report_of_nothing_is_empty_array() {
        let out = report("", &ParseOptions::default(), ViewMode::Split, OutputFormat::Json);
        assert_eq!(out.trim(), "[]");
    }
}
