//! Scroll state for the log view. Offsets are always kept in
//! `[0, max(0, total_lines - height)]`.

/// How close (in lines) to the bottom the view must be to count as following the tail.
pub const AUTO_SCROLL_THRESHOLD: usize = 3;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Viewport {
    offset: usize,
    height: usize,
    total_lines: usize,
}

impl Viewport {
    pub fn new(height: usize) -> Self {
        Self {
            offset: 0,
            height,
            total_lines: 0,
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn total_lines(&self) -> usize {
        self.total_lines
    }

    pub fn max_offset(&self) -> usize {
        self.total_lines.saturating_sub(self.height)
    }

    pub fn set_height(&mut self, height: usize) {
        self.height = height;
        self.clamp();
    }

    pub fn set_total_lines(&mut self, total_lines: usize) {
        self.total_lines = total_lines;
        self.clamp();
    }

    /// Line range currently on screen.
    pub fn visible_range(&self) -> std::ops::Range<usize> {
        self.offset..(self.offset + self.height).min(self.total_lines)
    }

    pub fn is_visible(&self, line: usize) -> bool {
        self.visible_range().contains(&line)
    }

    /// Puts `line` in the middle of the view when the content allows it.
    pub fn center_on(&mut self, line: usize) {
        self.offset = line.saturating_sub(self.height / 2).min(self.max_offset());
    }

    /// `true` when the last visible row is within [`AUTO_SCROLL_THRESHOLD`] lines of the
    /// last content line.
    pub fn is_near_bottom(&self) -> bool {
        let bottom = self.offset + self.height;
        self.total_lines.saturating_sub(bottom) <= AUTO_SCROLL_THRESHOLD
    }

    pub fn scroll_up(&mut self, amount: usize) {
        self.offset = self.offset.saturating_sub(amount);
    }

    pub fn scroll_down(&mut self, amount: usize) {
        self.offset = self.offset.saturating_add(amount).min(self.max_offset());
    }

    pub fn page_up(&mut self) {
        self.scroll_up(self.height.saturating_sub(1).max(1));
    }

    pub fn page_down(&mut self) {
        self.scroll_down(self.height.saturating_sub(1).max(1));
    }

    pub fn scroll_to_top(&mut self) {
        self.offset = 0;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.offset = self.max_offset();
    }

    fn clamp(&mut self) {
        self.offset = self.offset.min(self.max_offset());
    }
}
