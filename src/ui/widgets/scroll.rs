/// Cursor + viewport offset shared by the list-like widgets.
#[derive(Debug, Default, Clone)]
pub struct ScrollState {
    pub cursor: usize,
    pub offset: usize,
    len: usize,
}

impl ScrollState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update the total number of items. Clamps cursor if needed.
    pub fn set_len(&mut self, len: usize) {
        self.len = len;
        if len == 0 {
            self.cursor = 0;
            self.offset = 0;
        } else if self.cursor >= len {
            self.cursor = len - 1;
        }
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
        self.offset = 0;
    }

    pub fn move_down(&mut self) {
        self.move_down_n(1);
    }

    pub fn move_up(&mut self) {
        self.move_up_n(1);
    }

    pub fn move_down_n(&mut self, n: usize) {
        self.cursor = self.cursor.saturating_add(n).min(self.len.saturating_sub(1));
    }

    pub fn move_up_n(&mut self, n: usize) {
        self.cursor = self.cursor.saturating_sub(n);
    }

    pub fn go_top(&mut self) {
        self.reset();
    }

    pub fn go_bottom(&mut self) {
        self.cursor = self.len.saturating_sub(1);
    }

    /// Put the cursor on `index` and scroll so it sits mid-viewport
    pub fn center_on(&mut self, index: usize, visible_height: usize) {
        if self.len == 0 {
            return;
        }
        self.cursor = index.min(self.len - 1);
        let max_offset = self.len.saturating_sub(visible_height);
        self.offset = self
            .cursor
            .saturating_sub(visible_height / 2)
            .min(max_offset);
    }

    /// Adjust offset so cursor is visible within `visible_height` rows.
    pub fn ensure_visible(&mut self, visible_height: usize) {
        if visible_height == 0 {
            return;
        }
        if self.cursor < self.offset {
            self.offset = self.cursor;
        } else if self.cursor >= self.offset + visible_height {
            self.offset = self.cursor + 1 - visible_height;
        }
    }

    /// Scroll the viewport without moving the cursor out of it
    pub fn scroll_by(&mut self, delta: isize, visible_height: usize) {
        let max_offset = self.len.saturating_sub(visible_height);
        self.offset = self.offset.saturating_add_signed(delta).min(max_offset);
        if self.cursor < self.offset {
            self.cursor = self.offset;
        } else if visible_height > 0 && self.cursor >= self.offset + visible_height {
            self.cursor = self.offset + visible_height - 1;
        }
    }

    pub fn scroll_percent(&self, visible_height: usize) -> String {
        if self.len <= visible_height {
            return String::new();
        }
        let percent = (self.offset * 100) / (self.len - visible_height);
        format!("{}%", percent.min(100))
    }
}
