use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::Style,
    widgets::{Block, Borders, Widget},
};
use tracing::debug;

use crate::config::{DisplayConfig, Theme};
use crate::engine::{sniff, CsvModel, SearchHit};
use crate::widgets::controls::Controls;
use crate::widgets::datatable::{DataTable, HeaderPlacement};

/// Lines taken by everything except data rows: two borders, the header
/// line, and the status line.
const CHROME_LINES: u16 = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize(u16, u16), // resized (width, height)
    /// The engine cached new rows; redraw.
    DataReady,
    Exit,
}

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub enum InputMode {
    #[default]
    Normal,
    Search,
}

/// Controller for one open file: owns the engine, tracks scroll position and
/// vim-style command state, and draws the table and status line.
pub struct App {
    model: CsvModel,
    theme: Theme,
    pub display: DisplayConfig,
    pub start_row: usize,
    /// Data rows that fit on screen.
    pub page_rows: usize,
    pub column_offset: usize,
    pub input_mode: InputMode,
    pending_count: usize,
    awaiting_second_g: bool,
    pub command_buffer: String,
    search_buffer: String,
    pub last_command: String,
    pub last_search: Option<String>,
    pub current_match: Option<SearchHit>,
}

/// Data rows that fit in a terminal `height` lines tall.
pub fn page_rows_for_height(height: u16) -> usize {
    height.saturating_sub(CHROME_LINES).max(1) as usize
}

impl App {
    /// Wrap an opened model. The first viewport also asks the engine to keep
    /// reading until the row count is known.
    pub fn new(model: CsvModel, display: DisplayConfig, theme: Theme, height: u16) -> Self {
        let app = Self {
            model,
            theme,
            display,
            start_row: 0,
            page_rows: page_rows_for_height(height),
            column_offset: 0,
            input_mode: InputMode::Normal,
            pending_count: 0,
            awaiting_second_g: false,
            command_buffer: String::new(),
            search_buffer: String::new(),
            last_command: String::new(),
            last_search: None,
            current_match: None,
        };
        app.model.set_viewport(app.start_row, app.page_rows, true);
        app
    }

    pub fn model(&self) -> &CsvModel {
        &self.model
    }

    pub fn event(&mut self, event: &AppEvent) -> Option<AppEvent> {
        match event {
            AppEvent::Key(key) => self.key(key),
            AppEvent::Resize(_, height) => {
                self.page_rows = page_rows_for_height(*height);
                self.clamp_start_row();
                self.update_viewport();
                None
            }
            AppEvent::DataReady => {
                // the end may have just been found below the current position
                let before = self.start_row;
                self.clamp_start_row();
                if self.start_row != before {
                    self.update_viewport();
                }
                None
            }
            AppEvent::Exit => None,
        }
    }

    fn update_viewport(&self) {
        self.model.set_viewport(self.start_row, self.page_rows, false);
    }

    /// Largest useful top row once the row count is known.
    fn max_start_row(&self) -> Option<usize> {
        self.model
            .row_count_known()
            .then(|| self.model.row_count().saturating_sub(self.page_rows))
    }

    fn clamp_start_row(&mut self) {
        if let Some(max_start) = self.max_start_row() {
            self.start_row = self.start_row.min(max_start);
        }
    }

    fn move_rows(&mut self, delta: isize) {
        if delta < 0 {
            self.start_row = self.start_row.saturating_sub(delta.unsigned_abs());
        } else {
            self.start_row = self.start_row.saturating_add(delta as usize);
            self.clamp_start_row();
        }
        self.update_viewport();
    }

    /// Jump so that 1-based `line` is at the top, as far as the data allows.
    fn go_to_line(&mut self, line: usize) {
        let mut row = line.max(1) - 1;
        if self.model.row_count_known() {
            row = row.min(self.model.row_count().saturating_sub(1));
        }
        self.start_row = row;
        self.clamp_start_row();
        self.update_viewport();
    }

    fn adjust_column_offset(&mut self, delta: isize) {
        let max_columns = self
            .model
            .visible_rows()
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.model.header().len()))
            .max()
            .unwrap_or(0);
        let next = self.column_offset.saturating_add_signed(delta);
        self.column_offset = if max_columns == 0 {
            next
        } else {
            next.min(max_columns - 1)
        };
    }

    /// Pending numeric prefix, at least 1 and small enough to negate as `isize`.
    fn take_count(&mut self) -> usize {
        let count = self.pending_count.clamp(1, isize::MAX as usize);
        self.pending_count = 0;
        self.awaiting_second_g = false;
        count
    }

    fn counted(count: usize, command: char) -> String {
        if count == 1 {
            command.to_string()
        } else {
            format!("{count}{command}")
        }
    }

    fn finish_command(&mut self, last: String) {
        self.last_command = last;
        self.command_buffer.clear();
        self.pending_count = 0;
        self.awaiting_second_g = false;
    }

    fn land_on(&mut self, hit: Option<SearchHit>, command: String) {
        match hit {
            Some(hit) => {
                debug!(row = hit.row, column = hit.column, "search hit");
                self.start_row = hit.row;
                self.update_viewport();
                self.current_match = Some(hit);
                self.finish_command(command);
            }
            None => {
                self.current_match = None;
                self.finish_command(format!("{command} (not found)"));
            }
        }
    }

    fn search_key(&mut self, key: &KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                self.input_mode = InputMode::Normal;
                if self.search_buffer.is_empty() {
                    self.command_buffer.clear();
                    return;
                }
                let pattern = std::mem::take(&mut self.search_buffer);
                let hit = self.model.find_next(&pattern, self.start_row);
                let command = format!("/{pattern}");
                self.last_search = Some(pattern);
                self.land_on(hit, command);
            }
            KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
                self.search_buffer.clear();
                self.command_buffer.clear();
                self.current_match = None;
            }
            KeyCode::Backspace => {
                if self.search_buffer.pop().is_some() {
                    self.command_buffer.pop();
                }
            }
            KeyCode::Char(c) => {
                self.search_buffer.push(c);
                self.command_buffer.push(c);
            }
            _ => {}
        }
    }

    fn key(&mut self, key: &KeyEvent) -> Option<AppEvent> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(AppEvent::Exit);
        }
        if self.input_mode == InputMode::Search {
            self.search_key(key);
            return None;
        }

        match key.code {
            KeyCode::Char(c @ '0'..='9') => {
                let digit = c as usize - '0' as usize;
                self.pending_count = self.pending_count.saturating_mul(10).saturating_add(digit);
                self.awaiting_second_g = false;
                self.command_buffer.push(c);
            }
            KeyCode::Char('/') => {
                self.input_mode = InputMode::Search;
                self.search_buffer.clear();
                self.pending_count = 0;
                self.awaiting_second_g = false;
                self.command_buffer = "/".to_string();
            }
            KeyCode::Char('q') => return Some(AppEvent::Exit),
            KeyCode::Char('g') => {
                if self.awaiting_second_g {
                    let line = self.pending_count.max(1);
                    let last = if self.pending_count == 0 {
                        "gg".to_string()
                    } else {
                        format!("{}g", self.command_buffer)
                    };
                    self.go_to_line(line);
                    self.finish_command(last);
                } else {
                    self.awaiting_second_g = true;
                    self.command_buffer.push('g');
                }
            }
            KeyCode::Char('G') => {
                let (line, last) = if self.pending_count == 0 {
                    (self.model.row_count(), "G".to_string())
                } else {
                    (self.pending_count, format!("{}G", self.pending_count))
                };
                self.go_to_line(line);
                self.finish_command(last);
            }
            KeyCode::Char('j') | KeyCode::Down => {
                let count = self.take_count();
                self.move_rows(count as isize);
                self.finish_command(Self::counted(count, 'j'));
            }
            KeyCode::Char('k') | KeyCode::Up => {
                let count = self.take_count();
                self.move_rows(-(count as isize));
                self.finish_command(Self::counted(count, 'k'));
            }
            KeyCode::Char('l') | KeyCode::Right => {
                let count = self.take_count();
                self.adjust_column_offset(count as isize);
                self.finish_command(Self::counted(count, 'l'));
            }
            KeyCode::Char('h') | KeyCode::Left => {
                let count = self.take_count();
                self.adjust_column_offset(-(count as isize));
                self.finish_command(Self::counted(count, 'h'));
            }
            KeyCode::PageDown => {
                self.move_rows(self.page_rows as isize);
                self.finish_command("PgDn".to_string());
            }
            KeyCode::PageUp => {
                self.move_rows(-(self.page_rows as isize));
                self.finish_command("PgUp".to_string());
            }
            KeyCode::Char('H') => {
                self.display.header_pinned = !self.display.header_pinned;
                self.finish_command("H".to_string());
            }
            KeyCode::Char('t') => {
                self.display.tabular = !self.display.tabular;
                self.finish_command("t".to_string());
            }
            KeyCode::Char('n') => {
                if let Some(pattern) = self.last_search.clone() {
                    let hit = self.model.find_next(&pattern, self.start_row.saturating_add(1));
                    self.land_on(hit, "n".to_string());
                } else {
                    self.finish_command(self.last_command.clone());
                }
            }
            KeyCode::Char('N') => {
                if let Some(pattern) = self.last_search.clone() {
                    let hit = self.model.find_prev(&pattern, self.start_row.saturating_sub(1));
                    self.land_on(hit, "N".to_string());
                } else {
                    self.finish_command(self.last_command.clone());
                }
            }
            KeyCode::Esc => {
                self.current_match = None;
                self.finish_command(self.last_command.clone());
            }
            _ => {
                self.finish_command(self.last_command.clone());
            }
        }
        None
    }

    fn title(&self) -> String {
        let name = self
            .model
            .path()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match self.model.delimiter() {
            Some(delimiter) => format!(" {} [{}] ", name, sniff::delimiter_name(delimiter)),
            None => format!(" {} ", name),
        }
    }
}

impl Widget for &mut App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let [table_area, status_area] =
            Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(area);

        let mut rows = self.model.visible_rows();
        // the engine puts the header first when the viewport starts at the top
        let at_top = self.model.viewport().start_row == 0 && !rows.is_empty();
        if at_top {
            rows.remove(0);
        }
        let placement = if self.display.header_pinned {
            HeaderPlacement::Pinned
        } else if at_top {
            HeaderPlacement::Inline
        } else {
            HeaderPlacement::Hidden
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.get("border")))
            .title(self.title());
        DataTable::new(self.model.header(), &rows, self.start_row, &self.theme)
            .header_placement(placement)
            .tabular(self.display.tabular)
            .column_colors(self.display.column_colors)
            .row_numbers(self.display.row_numbers)
            .column_offset(self.column_offset)
            .search(self.last_search.as_deref(), self.current_match)
            .block(block)
            .render(table_area, buf);

        let controls = Controls::new(&self.command_buffer, &self.last_command)
            .with_position(self.start_row, self.model.row_count_state())
            .with_colors(
                self.theme.get("controls_bg"),
                self.theme.get("text_primary"),
                self.theme.get("text_secondary"),
            );
        (&controls).render(status_area, buf);
    }
}
