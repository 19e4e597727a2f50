use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Paragraph, Widget},
};

use crate::engine::RowCountState;

/// Bottom status line: pending command on the left, position and the last
/// command on the right.
pub struct Controls<'a> {
    pub command: &'a str,
    pub last_command: &'a str,
    /// 0-based data row shown at the top of the table.
    pub top_row: usize,
    pub row_count: RowCountState,
    pub bg: Color,
    pub fg: Color,
    pub dimmed: Color,
}

impl<'a> Controls<'a> {
    pub fn new(command: &'a str, last_command: &'a str) -> Self {
        Self {
            command,
            last_command,
            top_row: 0,
            row_count: RowCountState::default(),
            bg: Color::Indexed(236),
            fg: Color::White,
            dimmed: Color::DarkGray,
        }
    }

    pub fn with_position(mut self, top_row: usize, row_count: RowCountState) -> Self {
        self.top_row = top_row;
        self.row_count = row_count;
        self
    }

    pub fn with_colors(mut self, bg: Color, fg: Color, dimmed: Color) -> Self {
        self.bg = bg;
        self.fg = fg;
        self.dimmed = dimmed;
        self
    }

    /// "Row 12 of 3400" once known, "Row 12 of 3072+" while still counting.
    pub fn position_text(&self) -> String {
        let total = self.row_count.value();
        let row = if total == 0 { 0 } else { self.top_row.saturating_add(1) };
        format!("Row {} of {}", row, self.row_count)
    }

    pub fn last_text(&self) -> String {
        format!("Last: {}", self.last_command)
    }
}

impl Widget for &Controls<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let position = self.position_text();
        let last = self.last_text();

        let layout = Layout::new(
            Direction::Horizontal,
            [
                Constraint::Fill(1),
                Constraint::Length(position.chars().count() as u16 + 2),
                Constraint::Length(last.chars().count() as u16 + 1),
            ],
        )
        .split(area);

        let base_style = Style::default().bg(self.bg);

        Paragraph::new(format!(":{}", self.command))
            .style(base_style.fg(self.fg))
            .render(layout[0], buf);
        Paragraph::new(position)
            .style(base_style.fg(if self.row_count.is_known() {
                self.fg
            } else {
                self.dimmed
            }))
            .right_aligned()
            .render(layout[1], buf);
        Paragraph::new(last)
            .style(base_style.fg(self.fg))
            .right_aligned()
            .render(layout[2], buf);
    }
}
