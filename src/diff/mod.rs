//! Unified diff model, parser and renderer
//!
//! ```text
//! raw text ──parse_with──▶ ParseResult ──render_with──▶ RenderedDiff
//! ```

mod cursor;
mod model;
mod parser;
mod patch;
mod render;

pub use model::{LineKind, ParseResult, Side};
pub use parser::{parse_with, ParseOptions};
pub use patch::{split_patch, DiffStats, FilePatch, FileStatus};
pub use render::{render_with, DisplayRow, RenderedDiff, ViewMode, EMPTY_CELL};

#[cfg(test)]
pub use render::{NO_CHANGES, NO_CHANGES_IDENTICAL};
