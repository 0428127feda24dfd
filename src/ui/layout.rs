use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Layout configuration
pub struct AppLayout {
    /// Below this width the file list is stacked above the diff
    pub breakpoint: u16,
    pub left_ratio: u16,
}

impl Default for AppLayout {
    fn default() -> Self {
        Self {
            breakpoint: 100,
            left_ratio: 25,
        }
    }
}

/// Computed layout areas
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayoutAreas {
    /// Zero-sized when the patch touches a single file
    pub file_list: Rect,
    pub preview: Rect,
    pub status_bar: Rect,
}

impl AppLayout {
    pub fn compute(&self, area: Rect, show_file_list: bool) -> LayoutAreas {
        let [main_area, status_bar] = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .areas(area);

        if !show_file_list {
            return LayoutAreas {
                file_list: Rect::default(),
                preview: main_area,
                status_bar,
            };
        }

        let (direction, first, second) = if area.width >= self.breakpoint {
            (
                Direction::Horizontal,
                Constraint::Percentage(self.left_ratio),
                Constraint::Percentage(100 - self.left_ratio),
            )
        } else {
            (
                Direction::Vertical,
                Constraint::Percentage(30),
                Constraint::Percentage(70),
            )
        };
        let [file_list, preview] = Layout::default()
            .direction(direction)
            .constraints([first, second])
            .areas(main_area);

        LayoutAreas {
            file_list,
            preview,
            status_bar,
        }
    }
}

/// Calculate centered rect for modal
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let [_, middle, _] = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .areas(area);

    let [_, center, _] = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .areas(middle);
    center
}
