//! Widget actions - what widgets report happened
//!
//! Widgets only mutate their own state; anything that touches another pane,
//! the clipboard or the source goes back to App as an Action.

/// Actions that widgets can return from key handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// No action, key was handled internally
    None,

    /// Key was not handled, pass to parent
    Ignored,

    /// Request focus change
    ChangeFocus(FocusTarget),

    /// File at this index of the file list was opened (Enter)
    FileSelected(usize),

    /// Copy something to the clipboard
    Yank(YankTarget),
}

/// Focus targets for navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusTarget {
    FileList,
    Preview,
}

/// What a yank copies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YankTarget {
    /// `path` or `path:line`
    Location,
    /// Text of the row under the cursor
    Content,
}
