mod common;

use common::{numbered_csv, wait_for};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use csvpeek::config::DisplayConfig;
use csvpeek::engine::LOADING_CELL;
use csvpeek::{App, AppEvent, CsvModel, EngineOptions, InputMode, Theme};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::widgets::Widget;
use std::path::Path;

/// 14 lines tall: four lines of chrome leave ten data rows.
const HEIGHT: u16 = 14;

fn app_for(path: &Path) -> App {
    let mut model = CsvModel::new(EngineOptions::new().with_chunk_size(100));
    model.open(path).expect("Failed to open test file");
    let app = App::new(model, DisplayConfig::default(), Theme::default(), HEIGHT);
    assert!(wait_for(|| app.model().row_count_known()));
    app
}

fn press(app: &mut App, code: KeyCode) -> Option<AppEvent> {
    app.event(&AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)))
}

fn type_keys(app: &mut App, keys: &str) {
    for c in keys.chars() {
        press(app, KeyCode::Char(c));
    }
}

fn buffer_text(buf: &Buffer) -> String {
    let mut text = String::new();
    for y in 0..buf.area.height {
        for x in 0..buf.area.width {
            text.push_str(buf[(x, y)].symbol());
        }
        text.push('\n');
    }
    text
}

#[test]
fn test_initial_state() {
    let (_dir, path) = numbered_csv(1000);
    let app = app_for(&path);

    assert_eq!(app.start_row, 0);
    assert_eq!(app.page_rows, 10);
    assert_eq!(app.input_mode, InputMode::Normal);
    assert_eq!(app.model().row_count(), 1000);
}

#[test]
fn test_vertical_movement() {
    let (_dir, path) = numbered_csv(1000);
    let mut app = app_for(&path);

    press(&mut app, KeyCode::Char('k'));
    assert_eq!(app.start_row, 0);

    press(&mut app, KeyCode::Char('j'));
    assert_eq!(app.start_row, 1);
    assert_eq!(app.last_command, "j");

    type_keys(&mut app, "5j");
    assert_eq!(app.start_row, 6);
    assert_eq!(app.last_command, "5j");

    press(&mut app, KeyCode::Up);
    assert_eq!(app.start_row, 5);

    press(&mut app, KeyCode::PageDown);
    assert_eq!(app.start_row, 15);
    press(&mut app, KeyCode::PageUp);
    press(&mut app, KeyCode::PageUp);
    assert_eq!(app.start_row, 0);
}

#[test]
fn test_jumps() {
    let (_dir, path) = numbered_csv(1000);
    let mut app = app_for(&path);

    // the last page stays full
    press(&mut app, KeyCode::Char('G'));
    assert_eq!(app.start_row, 990);
    assert_eq!(app.last_command, "G");

    type_keys(&mut app, "5000j");
    assert_eq!(app.start_row, 990);

    type_keys(&mut app, "12gg");
    assert_eq!(app.start_row, 11);
    assert_eq!(app.last_command, "12gg");

    type_keys(&mut app, "gg");
    assert_eq!(app.start_row, 0);
    assert_eq!(app.last_command, "gg");

    type_keys(&mut app, "300G");
    assert_eq!(app.start_row, 299);
    assert_eq!(app.last_command, "300G");
    assert!(app.command_buffer.is_empty());

    let viewport = app.model().viewport();
    assert_eq!(viewport.start_row, 299);
    assert_eq!(viewport.row_count, 10);
}

#[test]
fn test_oversized_count_is_clamped() {
    let (_dir, path) = numbered_csv(1000);
    let mut app = app_for(&path);

    type_keys(&mut app, "99999999999999999999999G");
    assert_eq!(app.start_row, 990);
    type_keys(&mut app, "99999999999999999999999j");
    assert_eq!(app.start_row, 990);
    type_keys(&mut app, "99999999999999999999999k");
    assert_eq!(app.start_row, 0);
}

#[test]
fn test_resize_reclamps_position() {
    let (_dir, path) = numbered_csv(1000);
    let mut app = app_for(&path);

    press(&mut app, KeyCode::Char('G'));
    app.event(&AppEvent::Resize(80, 24));
    assert_eq!(app.page_rows, 20);
    assert_eq!(app.start_row, 980);

    app.event(&AppEvent::Resize(80, 2));
    assert_eq!(app.page_rows, 1);
}

#[test]
fn test_search_and_repeat() {
    let (_dir, path) = numbered_csv(1000);
    let mut app = app_for(&path);

    press(&mut app, KeyCode::Char('/'));
    assert_eq!(app.input_mode, InputMode::Search);
    type_keys(&mut app, "row5000");
    press(&mut app, KeyCode::Backspace);
    assert_eq!(app.command_buffer, "/row500");
    press(&mut app, KeyCode::Enter);

    assert_eq!(app.input_mode, InputMode::Normal);
    assert_eq!(app.start_row, 500);
    assert_eq!(app.last_command, "/row500");
    assert_eq!(app.last_search.as_deref(), Some("row500"));
    let hit = app.current_match.expect("match");
    assert_eq!((hit.row, hit.column), (500, 2));

    press(&mut app, KeyCode::Char('n'));
    assert_eq!(app.last_command, "n (not found)");
    assert_eq!(app.start_row, 500);
    assert!(app.current_match.is_none());

    press(&mut app, KeyCode::Char('N'));
    assert_eq!(app.last_command, "N (not found)");
}

#[test]
fn test_search_next_and_previous_hits() {
    let (_dir, path) = numbered_csv(1000);
    let mut app = app_for(&path);

    press(&mut app, KeyCode::Char('/'));
    type_keys(&mut app, "row99");
    press(&mut app, KeyCode::Enter);
    assert_eq!(app.start_row, 99);

    press(&mut app, KeyCode::Char('n'));
    assert_eq!(app.start_row, 990);
    press(&mut app, KeyCode::Char('n'));
    assert_eq!(app.start_row, 991);

    press(&mut app, KeyCode::Char('N'));
    assert_eq!(app.start_row, 990);
    press(&mut app, KeyCode::Char('N'));
    assert_eq!(app.start_row, 99);
}

#[test]
fn test_search_escape_cancels() {
    let (_dir, path) = numbered_csv(100);
    let mut app = app_for(&path);

    type_keys(&mut app, "/row1");
    press(&mut app, KeyCode::Esc);
    assert_eq!(app.input_mode, InputMode::Normal);
    assert!(app.command_buffer.is_empty());
    assert!(app.last_search.is_none());
    assert_eq!(app.start_row, 0);

    // q is plain text while searching, not quit
    press(&mut app, KeyCode::Char('/'));
    assert_eq!(press(&mut app, KeyCode::Char('q')), None);
    assert_eq!(app.command_buffer, "/q");
}

#[test]
fn test_display_toggles() {
    let (_dir, path) = numbered_csv(10);
    let mut app = app_for(&path);

    press(&mut app, KeyCode::Char('H'));
    assert!(!app.display.header_pinned);
    press(&mut app, KeyCode::Char('t'));
    assert!(!app.display.tabular);
    press(&mut app, KeyCode::Char('H'));
    assert!(app.display.header_pinned);
    assert_eq!(app.last_command, "H");
}

#[test]
fn test_horizontal_scroll_is_clamped() {
    let (_dir, path) = numbered_csv(10);
    let mut app = app_for(&path);
    assert!(wait_for(|| !app
        .model()
        .visible_rows()
        .iter()
        .any(|r| r[0] == LOADING_CELL)));

    type_keys(&mut app, "5l");
    assert_eq!(app.column_offset, 2);
    assert_eq!(app.last_command, "5l");

    press(&mut app, KeyCode::Char('h'));
    assert_eq!(app.column_offset, 1);
    press(&mut app, KeyCode::Left);
    press(&mut app, KeyCode::Left);
    assert_eq!(app.column_offset, 0);
}

#[test]
fn test_quit_keys() {
    let (_dir, path) = numbered_csv(10);
    let mut app = app_for(&path);

    assert_eq!(press(&mut app, KeyCode::Char('q')), Some(AppEvent::Exit));
    let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
    assert_eq!(app.event(&AppEvent::Key(ctrl_c)), Some(AppEvent::Exit));
    assert_eq!(press(&mut app, KeyCode::Char('x')), None);
}

#[test]
fn test_render_shows_header_rows_and_position() {
    let (_dir, path) = numbered_csv(1000);
    let mut app = app_for(&path);
    assert!(wait_for(|| {
        let rows = app.model().visible_rows();
        rows.len() == 11 && !rows.iter().any(|r| r[0] == LOADING_CELL)
    }));

    let area = Rect::new(0, 0, 60, HEIGHT);
    let mut buf = Buffer::empty(area);
    (&mut app).render(area, &mut buf);
    let text = buffer_text(&buf);

    assert!(text.contains("numbers.csv"));
    // tabular padding follows the widest visible cell
    assert!(text.contains("a b  c"));
    assert!(text.contains("0 0  row0"));
    assert!(text.contains("9 18 row9"));
    assert!(!text.contains("row10"));
    assert!(text.contains("Row 1 of 1000"));
}
