//! csvpeek: scroll and search very large delimited text files in the terminal.
//!
//! The [`engine`] module is the reusable part: a chunked, incrementally
//! indexed reader with a bounded cache and a background prefetch thread.
//! The rest is a thin ratatui front-end built on its query surface.

pub mod app;
pub mod cache;
pub mod config;
pub mod engine;
pub mod logging;
pub mod widgets;

pub use app::{App, AppEvent, InputMode};
pub use cache::CacheManager;
pub use config::{
    rgb_to_256_color, rgb_to_basic_ansi, AppConfig, ColorParser, ConfigManager, Theme,
};
pub use csvpeek_cli::Args;
pub use engine::{CsvModel, EngineOptions, OpenError, RowCountState, SearchHit};

/// Application name used for config and cache directories
pub const APP_NAME: &str = "csvpeek";
