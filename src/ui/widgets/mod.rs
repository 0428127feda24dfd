mod action;
mod diff_view;
mod file_list;
mod help;
mod scroll;

pub use action::{Action, FocusTarget, YankTarget};
pub use diff_view::{DiffView, DiffViewState};
pub use file_list::{FileList, FileListState};
pub use help::HelpModal;
pub use scroll::ScrollState;
