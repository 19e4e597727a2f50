use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph, Widget},
};

use crate::config::Theme;
use crate::engine::{Row, SearchHit, LOADING_CELL};

/// Where the header line goes in the rendered table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderPlacement {
    /// Fixed above the data, regardless of scroll position.
    Pinned,
    /// First line of the body; only used at the top of the file.
    Inline,
    Hidden,
}

/// Widest cell of each column, in characters.
pub fn column_widths<'r>(
    header: &[String],
    rows: impl IntoIterator<Item = &'r [String]>,
) -> Vec<u16> {
    let mut widths: Vec<u16> = header
        .iter()
        .map(|name| name.chars().count() as u16)
        .collect();
    for row in rows {
        if is_loading(row) {
            continue;
        }
        if row.len() > widths.len() {
            widths.resize(row.len(), 0);
        }
        for (width, value) in widths.iter_mut().zip(row) {
            *width = (*width).max(value.chars().count() as u16);
        }
    }
    widths
}

fn is_loading(row: &[String]) -> bool {
    row.len() == 1 && row[0] == LOADING_CELL
}

/// Rows of the current viewport, header removed, ready to draw.
pub struct DataTable<'a> {
    header: &'a [String],
    rows: &'a [Row],
    /// Data row number of `rows[0]`.
    first_row: usize,
    header_placement: HeaderPlacement,
    tabular: bool,
    column_colors: bool,
    row_numbers: bool,
    column_offset: usize,
    search: Option<&'a str>,
    current_match: Option<SearchHit>,
    theme: &'a Theme,
    block: Option<Block<'a>>,
}

impl<'a> DataTable<'a> {
    pub fn new(header: &'a [String], rows: &'a [Row], first_row: usize, theme: &'a Theme) -> Self {
        Self {
            header,
            rows,
            first_row,
            header_placement: HeaderPlacement::Pinned,
            tabular: true,
            column_colors: true,
            row_numbers: false,
            column_offset: 0,
            search: None,
            current_match: None,
            theme,
            block: None,
        }
    }

    pub fn header_placement(mut self, placement: HeaderPlacement) -> Self {
        self.header_placement = placement;
        self
    }

    pub fn tabular(mut self, tabular: bool) -> Self {
        self.tabular = tabular;
        self
    }

    pub fn column_colors(mut self, enabled: bool) -> Self {
        self.column_colors = enabled;
        self
    }

    pub fn row_numbers(mut self, enabled: bool) -> Self {
        self.row_numbers = enabled;
        self
    }

    pub fn column_offset(mut self, offset: usize) -> Self {
        self.column_offset = offset;
        self
    }

    pub fn search(mut self, pattern: Option<&'a str>, current: Option<SearchHit>) -> Self {
        self.search = pattern.filter(|p| !p.is_empty());
        self.current_match = current;
        self
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    fn column_style(&self, column: usize) -> Style {
        if self.column_colors {
            Style::default().fg(self.theme.column(column))
        } else {
            Style::default()
        }
    }

    fn header_style(&self) -> Style {
        Style::default()
            .fg(self.theme.get("header"))
            .add_modifier(Modifier::BOLD)
    }

    /// Split `value` around the first occurrence of the search pattern.
    fn cell_spans(&self, value: &'a str, row: Option<usize>, column: usize) -> Vec<Span<'a>> {
        let style = self.column_style(column);
        let Some((pattern, pos)) = self
            .search
            .and_then(|pattern| value.find(pattern).map(|pos| (pattern, pos)))
        else {
            return vec![Span::styled(value, style)];
        };

        let is_current = row.is_some_and(|row| {
            self.current_match
                .is_some_and(|hit| hit.row == row && hit.column == column)
        });
        let highlight = if is_current {
            self.theme.get("current_match")
        } else {
            self.theme.get("search_match")
        };
        let end = pos + pattern.len();

        let mut spans = Vec::with_capacity(3);
        if pos > 0 {
            spans.push(Span::styled(&value[..pos], style));
        }
        spans.push(Span::styled(
            &value[pos..end],
            style.bg(highlight).fg(Color::Black),
        ));
        if end < value.len() {
            spans.push(Span::styled(&value[end..], style));
        }
        spans
    }

    fn row_number_width(&self) -> u16 {
        if !self.row_numbers {
            return 0;
        }
        let last = self.first_row.saturating_add(self.rows.len().max(1));
        last.to_string().len() as u16
    }

    /// Body lines in display order, each tagged with its data row number
    /// (`None` for an inline header).
    fn body(&self) -> Vec<(Option<usize>, &'a [String])> {
        let header = (self.header_placement == HeaderPlacement::Inline).then_some((None, self.header));
        header
            .into_iter()
            .chain(
                self.rows
                    .iter()
                    .enumerate()
                    .map(|(i, row)| (Some(self.first_row.saturating_add(i)), row.as_slice())),
            )
            .collect()
    }

    fn row_number_text(row: Option<usize>) -> String {
        row.map(|r| r.saturating_add(1).to_string()).unwrap_or_default()
    }

    fn loading_span(&self) -> Span<'a> {
        Span::styled(
            LOADING_CELL,
            Style::default()
                .fg(self.theme.get("loading"))
                .add_modifier(Modifier::ITALIC),
        )
    }

    /// One display line. In tabular mode every cell is padded to its
    /// column width; otherwise cells are separated by a single space.
    fn line(&self, row: Option<usize>, cells: &'a [String], widths: &[u16]) -> Line<'a> {
        let mut spans = Vec::new();
        if self.row_numbers {
            let width = self.row_number_width() as usize;
            spans.push(Span::styled(
                format!("{:>width$} ", Self::row_number_text(row)),
                Style::default().fg(self.theme.get("row_numbers")),
            ));
        }
        if row.is_some() && is_loading(cells) {
            spans.push(self.loading_span());
            return Line::from(spans);
        }

        for (i, (column, value)) in cells
            .iter()
            .enumerate()
            .skip(self.column_offset)
            .enumerate()
        {
            if i > 0 {
                spans.push(Span::raw(" "));
            }
            spans.extend(self.cell_spans(value, row, column));
            if self.tabular {
                let width = widths.get(column).copied().unwrap_or(0) as usize;
                let pad = width.saturating_sub(value.chars().count());
                if pad > 0 {
                    spans.push(Span::raw(" ".repeat(pad)));
                }
            }
        }

        let line = Line::from(spans);
        if row.is_none() {
            line.style(self.header_style())
        } else {
            line
        }
    }
}

impl Widget for DataTable<'_> {
    fn render(mut self, area: Rect, buf: &mut Buffer) {
        let area = match self.block.take() {
            Some(block) => {
                let inner = block.inner(area);
                block.render(area, buf);
                inner
            }
            None => area,
        };
        if area.is_empty() {
            return;
        }

        let body = self.body();
        let widths = if self.tabular {
            column_widths(self.header, body.iter().map(|(_, cells)| *cells))
        } else {
            Vec::new()
        };

        let mut lines = Vec::with_capacity(body.len() + 1);
        if self.header_placement == HeaderPlacement::Pinned {
            lines.push(self.line(None, self.header, &widths));
        }
        lines.extend(
            body.into_iter()
                .map(|(row, cells)| self.line(row, cells, &widths)),
        );
        Paragraph::new(lines).render(area, buf);
    }
}
