//! Multi-file patch splitting
//!
//! `git diff` output for several files is cut into one section per file on
//! `diff ` boundaries, so each file can be parsed and shown on its own.

use serde::Serialize;
use std::fmt;

use super::parser::{parse_with, ParseOptions};

/// Change status of a file in a patch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Modified,
    Added,
    Deleted,
    Renamed,
}

impl FileStatus {
    pub fn as_char(&self) -> char {
        match self {
            Self::Modified => 'M',
            Self::Added => 'A',
            Self::Deleted => 'D',
            Self::Renamed => 'R',
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Diff statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffStats {
    pub added: usize,
    pub removed: usize,
}

/// The section of a patch that belongs to one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilePatch {
    pub path: String,
    pub status: FileStatus,
    pub stats: DiffStats,
    pub text: String,
}

impl FilePatch {
    fn new(text: &str, options: &ParseOptions) -> Self {
        let (added, removed) = parse_with(text, options).change_counts();
        Self {
            path: extract_path(text).unwrap_or_else(|| "(diff)".to_string()),
            status: detect_status(text),
            stats: DiffStats { added, removed },
            text: text.to_string(),
        }
    }
}

fn is_file_boundary(line: &str) -> bool {
    line.starts_with("diff --git ") || line.starts_with("diff -")
}

/// Split a patch into per-file sections.
///
/// Text before the first `diff ` line is kept as its own section only when it
/// carries hunks, changed lines or malformed hunk headers (plain `diff -u`
/// output or a bare hunk body); otherwise it is a commit message or similar
/// and is dropped. Input with none of those yields no sections.
pub fn split_patch(text: &str, options: &ParseOptions) -> Vec<FilePatch> {
    let mut sections: Vec<&str> = Vec::new();
    let mut start = 0;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        if is_file_boundary(line) && offset > start {
            sections.push(&text[start..offset]);
            start = offset;
        }
        offset += line.len();
    }
    if offset > start {
        sections.push(&text[start..offset]);
    }

    sections
        .into_iter()
        .filter(|section| {
            let first = section.lines().next().unwrap_or("");
            if is_file_boundary(first) || section.lines().any(|line| line.starts_with("@@")) {
                return true;
            }
            let parsed = parse_with(section, options);
            parsed.has_changes() || !parsed.diagnostics.is_empty()
        })
        .map(|section| FilePatch::new(section, options))
        .collect()
}

/// Drop `a/`/`b/` prefixes and the timestamp `diff -u` appends after a tab
fn clean_path(raw: &str) -> Option<String> {
    let path = raw.split('\t').next().unwrap_or(raw).trim();
    if path.is_empty() || path == "/dev/null" {
        return None;
    }
    let path = path
        .strip_prefix("a/")
        .or_else(|| path.strip_prefix("b/"))
        .unwrap_or(path);
    Some(path.to_string())
}

/// Display path of a file section: new path, then old path, then the
/// `diff --git` line
pub fn extract_path(section: &str) -> Option<String> {
    let mut old_path = None;
    let mut new_path = None;
    let mut git_path = None;

    for line in section.lines() {
        if line.starts_with("@@") {
            break;
        }
        if let Some(rest) = line.strip_prefix("+++ ") {
            new_path = clean_path(rest);
        } else if let Some(rest) = line.strip_prefix("--- ") {
            old_path = clean_path(rest);
        } else if let Some(rest) = line.strip_prefix("diff --git ") {
            git_path = rest
                .rsplit_once(" b/")
                .map(|(_, b)| b.to_string())
                .or_else(|| rest.split_whitespace().last().and_then(clean_path));
        }
    }

    new_path.or(old_path).or(git_path)
}

fn detect_status(section: &str) -> FileStatus {
    for line in section.lines() {
        if line.starts_with("@@") {
            break;
        }
        if line.starts_with("new file mode") || line == "--- /dev/null" {
            return FileStatus::Added;
        }
        if line.starts_with("deleted file mode") || line == "+++ /dev/null" {
            return FileStatus::Deleted;
        }
        if line.starts_with("rename from") {
            return FileStatus::Renamed;
        }
    }
    FileStatus::Modified
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TWO_FILES: &str = "\
diff --git a/src/a.rs b/src/a.rs
index 1111111..2222222 100644
--- a/src/a.rs
+++ b/src/a.rs
@@ -1,2 +1,2 @@
 keep
-old
+new
diff --git a/docs/b.md b/docs/b.md
new file mode 100644
index 0000000..3333333
--- /dev/null
+++ b/docs/b.md
@@ -0,0 +1,2 @@
+hello
+world
";

    fn opts() -> ParseOptions {
        ParseOptions::default()
    }

    #[test]
    fn splits_on_diff_lines() {
        let files = split_patch(TWO_FILES, &opts());
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].path, "src/a.rs");
        assert_eq!(files[1].path, "docs/b.md");
        assert!(files[0].text.starts_with("diff --git a/src/a.rs"));
        assert!(files[0].text.ends_with("+new\n"));
        assert!(files[1].text.starts_with("diff --git a/docs/b.md"));
    }

    #[test]
    fn sections_cover_whole_input() {
        let files = split_patch(TWO_FILES, &opts());
        let joined: String = files.iter().map(|f| f.text.as_str()).collect();
        assert_eq!(joined, TWO_FILES);
    }

    #[test]
    fn stats_and_status() {
        let files = split_patch(TWO_FILES, &opts());
        assert_eq!(files[0].status, FileStatus::Modified);
        assert_eq!(files[0].stats, DiffStats { added: 1, removed: 1 });
        assert_eq!(files[1].status, FileStatus::Added);
        assert_eq!(files[1].stats, DiffStats { added: 2, removed: 0 });
    }

    #[test]
    fn plain_unified_diff_is_one_section() {
        let diff = "--- old/config.toml\t2024-01-01 10:00:00\n+++ new/config.toml\t2024-01-02 10:00:00\n@@ -1 +1 @@\n-a\n+b\n";
        let files = split_patch(diff, &opts());
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "new/config.toml");
    }

    #[test]
    fn commit_message_preamble_is_dropped() {
        let text = format!("commit abc\nAuthor: someone\n\n    Fix things\n\n{}", TWO_FILES);
        let files = split_patch(&text, &opts());
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].path, "src/a.rs");
    }

    #[test]
    fn deleted_file_uses_old_path() {
        let diff = "diff --git a/gone.txt b/gone.txt\ndeleted file mode 100644\n--- a/gone.txt\n+++ /dev/null\n@@ -1 +0,0 @@\n-bye\n";
        let files = split_patch(diff, &opts());
        assert_eq!(files[0].path, "gone.txt");
        assert_eq!(files[0].status, FileStatus::Deleted);
    }

    #[test]
    fn rename_without_hunks_uses_git_line() {
        let diff = "diff --git a/old name.txt b/new name.txt\nsimilarity index 100%\nrename from old name.txt\nrename to new name.txt\n";
        let files = split_patch(diff, &opts());
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "new name.txt");
        assert_eq!(files[0].status, FileStatus::Renamed);
        assert_eq!(files[0].stats, DiffStats::default());
    }

    #[test]
    fn empty_or_plain_text_has_no_sections() {
        assert!(split_patch("", &opts()).is_empty());
        assert!(split_patch("just some text\n", &opts()).is_empty());
    }

    #[test]
    fn hunkless_changes_are_kept() {
        let files = split_patch("-a\n+b\n", &opts());
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "(diff)");
        assert_eq!(files[0].stats, DiffStats { added: 1, removed: 1 });

        // indented message lines only parse as context
        assert!(split_patch("    Fix things\n", &opts()).is_empty());
    }

    #[test]
    fn stats_respect_reconciliation() {
        let diff = "diff --git a/f b/f\n--- a/f\n+++ b/f\n@@ -1 +1 @@\n-same\n+same\n";
        let files = split_patch(diff, &ParseOptions::reconciling());
        assert_eq!(files[0].stats, DiffStats::default());
    }

    #[test]
    fn status_chars() {
        assert_eq!(FileStatus::Modified.to_string(), "M");
        assert_eq!(FileStatus::Renamed.as_char(), 'R');
    }
}
