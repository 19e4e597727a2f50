use color_eyre::eyre::eyre;
use color_eyre::Result;
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use supports_color::Stream;

use crate::engine::{EngineOptions, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_CHUNKS};

const CONFIG_FILE: &str = "config.toml";
const CONFIG_VERSION: &str = "0.1";

/// Manages config directory and config file operations
#[derive(Clone)]
pub struct ConfigManager {
    pub(crate) config_dir: PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager with a custom config directory (primarily for testing)
    pub fn with_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Create a new ConfigManager for the given app name
    pub fn new(app_name: &str) -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| eyre!("Could not determine config directory"))?
            .join(app_name);

        Ok(Self { config_dir })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Get path to a specific config file
    pub fn config_path(&self, path: &str) -> PathBuf {
        self.config_dir.join(path)
    }

    pub fn ensure_config_dir(&self) -> Result<()> {
        if !self.config_dir.exists() {
            std::fs::create_dir_all(&self.config_dir)?;
        }
        Ok(())
    }

    /// Default configuration as TOML with every field commented out, so the
    /// built-in defaults stay in effect until a line is uncommented.
    pub fn generate_default_config(&self) -> Result<String> {
        let toml_str = toml::to_string_pretty(&AppConfig::default())
            .map_err(|e| eyre!("Failed to serialize default config: {}", e))?;
        Ok(comment_all_fields(&toml_str, &collect_all_comments()))
    }

    /// Write default configuration to config file
    pub fn write_default_config(&self, force: bool) -> Result<PathBuf> {
        let config_path = self.config_path(CONFIG_FILE);

        if config_path.exists() && !force {
            return Err(eyre!(
                "Config file already exists at {}. Use --force to overwrite.",
                config_path.display()
            ));
        }

        self.ensure_config_dir()?;
        std::fs::write(&config_path, self.generate_default_config()?)?;

        Ok(config_path)
    }

    /// Read `config.toml` from this directory. A missing file yields defaults.
    pub fn load_user_config(&self) -> Result<AppConfig> {
        let config_path = self.config_path(CONFIG_FILE);
        if !config_path.exists() {
            return Ok(AppConfig::default());
        }

        let content = std::fs::read_to_string(&config_path).map_err(|e| {
            eyre!(
                "Failed to read config file at {}: {}",
                config_path.display(),
                e
            )
        })?;

        toml::from_str(&content).map_err(|e| {
            eyre!(
                "Failed to parse config file at {}: {}",
                config_path.display(),
                e
            )
        })
    }
}

fn collect_all_comments() -> HashMap<String, String> {
    let sections: &[(&str, &[(&str, &str)])] = &[
        ("", APP_COMMENTS),
        ("engine", ENGINE_COMMENTS),
        ("file_loading", FILE_LOADING_COMMENTS),
        ("display", DISPLAY_COMMENTS),
        ("performance", PERFORMANCE_COMMENTS),
        ("theme.colors", COLOR_COMMENTS),
        ("debug", DEBUG_COMMENTS),
    ];

    let mut comments = HashMap::new();
    for (section, fields) in sections {
        for (field, comment) in *fields {
            let key = if section.is_empty() {
                field.to_string()
            } else {
                format!("{}.{}", section, field)
            };
            comments.insert(key, comment.to_string());
        }
    }
    comments
}

/// Comment out every section and field of `toml`, prefixing the documented
/// ones with their description. `Option` fields that serialize to nothing are
/// added back as commented-out examples.
fn comment_all_fields(toml: &str, comments: &HashMap<String, String>) -> String {
    let mut result = String::new();
    result.push_str("# csvpeek configuration file\n");
    result.push_str("# This file uses TOML format. See https://toml.io/ for syntax reference.\n");
    result.push('\n');

    let mut current_section = String::new();
    let mut in_array = false;

    for line in toml.lines() {
        // continuation lines of a multi-line array value
        if in_array {
            result.push_str("# ");
            result.push_str(line);
            result.push('\n');
            in_array = line.trim() != "]";
            continue;
        }

        if let Some(section) = extract_section_name(line) {
            if let Some((_, header)) = SECTION_HEADERS.iter().find(|(s, _)| *s == section) {
                result.push_str(header);
                result.push('\n');
            }
            result.push_str("# ");
            result.push_str(line);
            result.push('\n');
            current_section = section;
            for field in OPTION_FIELDS {
                if let Some(name) = field
                    .strip_prefix(current_section.as_str())
                    .and_then(|rest| rest.strip_prefix('.'))
                {
                    push_comment(&mut result, comments.get(*field));
                    result.push_str(&format!("# {} = \",\"\n\n", name));
                }
            }
            continue;
        }

        match extract_field_path(line, &current_section) {
            Some(field_path) => {
                push_comment(&mut result, comments.get(&field_path));
                result.push_str("# ");
                result.push_str(line);
                result.push('\n');
                in_array = line.trim_end().ends_with('[');
            }
            None => {
                result.push_str(line);
                result.push('\n');
            }
        }
    }

    result
}

fn push_comment(result: &mut String, comment: Option<&String>) {
    if let Some(comment) = comment {
        for comment_line in comment.lines() {
            result.push_str("# ");
            result.push_str(comment_line);
            result.push('\n');
        }
    }
}

/// Extract section name from TOML line like "[engine]" or "[theme.colors]"
fn extract_section_name(line: &str) -> Option<String> {
    let trimmed = line.trim();
    trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .map(str::to_string)
}

fn extract_field_path(line: &str, current_section: &str) -> Option<String> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('[') {
        return None;
    }

    let (field_name, _) = trimmed.split_once('=')?;
    let field_name = field_name.trim();
    if current_section.is_empty() {
        Some(field_name.to_string())
    } else {
        Some(format!("{}.{}", current_section, field_name))
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub version: String,
    pub engine: EngineConfig,
    pub file_loading: FileLoadingConfig,
    pub display: DisplayConfig,
    pub performance: PerformanceConfig,
    pub theme: ThemeConfig,
    pub debug: DebugConfig,
}

const APP_COMMENTS: &[(&str, &str)] = &[(
    "version",
    "Configuration format version (for future compatibility)",
)];

const SECTION_HEADERS: &[(&str, &str)] = &[
    (
        "engine",
        "# ============================================================================\n# Reading Engine\n# ============================================================================",
    ),
    (
        "file_loading",
        "# ============================================================================\n# File Loading Defaults\n# ============================================================================",
    ),
    (
        "display",
        "# ============================================================================\n# Display Settings\n# ============================================================================",
    ),
    (
        "performance",
        "# ============================================================================\n# Performance Settings\n# ============================================================================",
    ),
    (
        "theme.colors",
        "# ============================================================================\n# Color Theme\n# ============================================================================\n# Color definitions\n# Supported formats:\n#   - Named colors: \"red\", \"blue\", \"bright_red\", \"dark_gray\", etc. (case-insensitive)\n#   - Hex colors: \"#ff0000\" or \"#FF0000\" (case-insensitive)\n#   - Indexed colors: \"indexed(0-255)\" for specific xterm 256-color palette entries\n# Colors automatically adapt to your terminal's capabilities",
    ),
    (
        "debug",
        "# ============================================================================\n# Debug Settings\n# ============================================================================",
    ),
];

/// Fields that are `None` by default and therefore missing from serialized TOML
const OPTION_FIELDS: &[&str] = &["file_loading.delimiter"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub chunk_size: usize,
    pub max_chunks: usize,
}

const ENGINE_COMMENTS: &[(&str, &str)] = &[
    (
        "chunk_size",
        "Rows read from disk per chunk. Larger chunks mean fewer reads\nbut a longer wait for the first screen of a jump",
    ),
    (
        "max_chunks",
        "Chunks kept in memory; the least recently viewed one is dropped first",
    ),
];

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FileLoadingConfig {
    pub delimiter: Option<String>,
}

const FILE_LOADING_COMMENTS: &[(&str, &str)] = &[(
    "delimiter",
    "Field delimiter: a single character, or tab/comma/semicolon/pipe.\nLeave unset to detect it from the header line",
)];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub header_pinned: bool,
    pub tabular: bool,
    pub column_colors: bool,
    pub row_numbers: bool,
}

const DISPLAY_COMMENTS: &[(&str, &str)] = &[
    (
        "header_pinned",
        "Keep the header row at the top while scrolling (toggle with H)",
    ),
    (
        "tabular",
        "Pad cells so columns line up (toggle with t)",
    ),
    (
        "column_colors",
        "Color each column from the theme's column palette",
    ),
    ("row_numbers", "Show 1-based row numbers on the left"),
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    pub event_poll_interval_ms: u64,
}

const PERFORMANCE_COMMENTS: &[(&str, &str)] = &[(
    "event_poll_interval_ms",
    "How often the terminal is polled for input, in milliseconds",
)];

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ThemeConfig {
    pub colors: ColorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub header: String,
    pub row_numbers: String,
    pub border: String,
    pub loading: String,
    pub search_match: String,
    pub current_match: String,
    pub controls_bg: String,
    pub text_primary: String,
    pub text_secondary: String,
    pub columns: Vec<String>,
}

const COLOR_COMMENTS: &[(&str, &str)] = &[
    ("header", "Header row text"),
    ("row_numbers", "Row number gutter"),
    ("border", "Table border"),
    ("loading", "Placeholder rows that are still being read"),
    ("search_match", "Background of search matches"),
    ("current_match", "Background of the match the last search landed on"),
    ("controls_bg", "Status line background"),
    ("text_primary", "Status line text"),
    ("text_secondary", "Dimmed status line text"),
    (
        "columns",
        "Column palette, cycled left to right when column_colors is enabled",
    ),
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    pub log_level: String,
}

const DEBUG_COMMENTS: &[(&str, &str)] = &[(
    "log_level",
    "Log file verbosity: error, warn, info, debug or trace.\nRUST_LOG takes precedence; --debug forces debug",
)];

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            engine: EngineConfig::default(),
            file_loading: FileLoadingConfig::default(),
            display: DisplayConfig::default(),
            performance: PerformanceConfig::default(),
            theme: ThemeConfig::default(),
            debug: DebugConfig::default(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_chunks: DEFAULT_MAX_CHUNKS,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            header_pinned: true,
            tabular: true,
            column_colors: true,
            row_numbers: false,
        }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            event_poll_interval_ms: 25,
        }
    }
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            header: "white".to_string(),
            row_numbers: "dark_gray".to_string(),
            border: "dark_gray".to_string(),
            loading: "dark_gray".to_string(),
            search_match: "yellow".to_string(),
            current_match: "bright_red".to_string(),
            controls_bg: "indexed(236)".to_string(),
            text_primary: "white".to_string(),
            text_secondary: "dark_gray".to_string(),
            columns: [
                "red", "green", "blue", "yellow", "magenta", "cyan", "gray", "white",
                "#ffaf00", "#8700af", "#00d7d7", "#00ff87", "#af005f", "#af8700",
                "#0087ff", "#ffaf87",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

// Configuration loading and merging
impl AppConfig {
    /// Load configuration from all layers (default → user)
    pub fn load(app_name: &str) -> Result<Self> {
        Self::load_from(&ConfigManager::new(app_name)?)
    }

    /// Load defaults merged with the user file managed by `manager`
    pub fn load_from(manager: &ConfigManager) -> Result<Self> {
        let mut config = AppConfig::default();
        config.merge(manager.load_user_config()?);
        config.validate()?;
        Ok(config)
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: AppConfig) {
        if other.version != AppConfig::default().version {
            self.version = other.version;
        }

        self.engine.merge(other.engine);
        self.file_loading.merge(other.file_loading);
        self.display.merge(other.display);
        self.performance.merge(other.performance);
        self.theme.merge(other.theme);
        self.debug.merge(other.debug);
    }

    /// Apply command-line overrides, the highest-precedence layer
    pub fn apply_args(&mut self, args: &csvpeek_cli::Args) {
        if let Some(chunk_size) = args.chunk_size {
            self.engine.chunk_size = chunk_size;
        }
        if let Some(max_chunks) = args.max_chunks {
            self.engine.max_chunks = max_chunks;
        }
        if let Some(delimiter) = args.delimiter {
            self.file_loading.delimiter = Some(char::from(delimiter).to_string());
        }
        if args.no_pin_header {
            self.display.header_pinned = false;
        }
        if args.row_numbers {
            self.display.row_numbers = true;
        }
        if args.debug {
            self.debug.log_level = "debug".to_string();
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !self.version.starts_with(CONFIG_VERSION) {
            return Err(eyre!(
                "Unsupported config version: {}. Expected {}.x",
                self.version,
                CONFIG_VERSION
            ));
        }

        if self.engine.chunk_size == 0 {
            return Err(eyre!("chunk_size must be greater than 0"));
        }
        if self.engine.max_chunks == 0 {
            return Err(eyre!("max_chunks must be greater than 0"));
        }

        self.file_loading.delimiter_byte()?;

        if self.performance.event_poll_interval_ms == 0 {
            return Err(eyre!("event_poll_interval_ms must be greater than 0"));
        }

        match self.debug.log_level.to_lowercase().as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => {}
            _ => {
                return Err(eyre!(
                    "Invalid log_level: {}. Must be one of error, warn, info, debug, trace",
                    self.debug.log_level
                ))
            }
        }

        // syntax only; NO_COLOR and terminal support do not matter here
        let parser = ColorParser::with_capabilities(true, true);
        self.theme.colors.validate(&parser)?;

        Ok(())
    }

    /// Engine settings derived from this configuration
    pub fn engine_options(&self) -> Result<EngineOptions> {
        Ok(EngineOptions {
            chunk_size: self.engine.chunk_size,
            max_chunks: self.engine.max_chunks,
            delimiter: self.file_loading.delimiter_byte()?,
        })
    }
}

// Merge implementations for each config section
impl EngineConfig {
    pub fn merge(&mut self, other: Self) {
        let default = EngineConfig::default();
        if other.chunk_size != default.chunk_size {
            self.chunk_size = other.chunk_size;
        }
        if other.max_chunks != default.max_chunks {
            self.max_chunks = other.max_chunks;
        }
    }
}

impl FileLoadingConfig {
    pub fn merge(&mut self, other: Self) {
        if other.delimiter.is_some() {
            self.delimiter = other.delimiter;
        }
    }

    pub fn delimiter_byte(&self) -> Result<Option<u8>> {
        self.delimiter
            .as_deref()
            .map(|d| csvpeek_cli::parse_delimiter(d).map_err(|e| eyre!("Invalid delimiter: {}", e)))
            .transpose()
    }
}

impl DisplayConfig {
    pub fn merge(&mut self, other: Self) {
        let default = DisplayConfig::default();
        if other.header_pinned != default.header_pinned {
            self.header_pinned = other.header_pinned;
        }
        if other.tabular != default.tabular {
            self.tabular = other.tabular;
        }
        if other.column_colors != default.column_colors {
            self.column_colors = other.column_colors;
        }
        if other.row_numbers != default.row_numbers {
            self.row_numbers = other.row_numbers;
        }
    }
}

impl PerformanceConfig {
    pub fn merge(&mut self, other: Self) {
        let default = PerformanceConfig::default();
        if other.event_poll_interval_ms != default.event_poll_interval_ms {
            self.event_poll_interval_ms = other.event_poll_interval_ms;
        }
    }
}

impl ThemeConfig {
    pub fn merge(&mut self, other: Self) {
        self.colors.merge(other.colors);
    }
}

impl ColorConfig {
    /// Named single-color fields, in declaration order
    fn named(&self) -> [(&'static str, &String); 9] {
        [
            ("header", &self.header),
            ("row_numbers", &self.row_numbers),
            ("border", &self.border),
            ("loading", &self.loading),
            ("search_match", &self.search_match),
            ("current_match", &self.current_match),
            ("controls_bg", &self.controls_bg),
            ("text_primary", &self.text_primary),
            ("text_secondary", &self.text_secondary),
        ]
    }

    /// Validate all color strings can be parsed
    fn validate(&self, parser: &ColorParser) -> Result<()> {
        for (name, value) in self.named() {
            parser
                .parse(value)
                .map_err(|e| eyre!("Invalid color value for '{}': {}", name, e))?;
        }
        if self.columns.is_empty() {
            return Err(eyre!("theme.colors.columns must list at least one color"));
        }
        for (i, value) in self.columns.iter().enumerate() {
            parser
                .parse(value)
                .map_err(|e| eyre!("Invalid color value for 'columns[{}]': {}", i, e))?;
        }
        Ok(())
    }

    pub fn merge(&mut self, other: Self) {
        let default = ColorConfig::default();

        macro_rules! merge_color {
            ($($field:ident),*) => {
                $(
                    if other.$field != default.$field {
                        self.$field = other.$field;
                    }
                )*
            };
        }

        merge_color!(
            header,
            row_numbers,
            border,
            loading,
            search_match,
            current_match,
            controls_bg,
            text_primary,
            text_secondary,
            columns
        );
    }
}

impl DebugConfig {
    pub fn merge(&mut self, other: Self) {
        let default = DebugConfig::default();
        if other.log_level != default.log_level {
            self.log_level = other.log_level;
        }
    }
}

/// Color parser with terminal capability detection
pub struct ColorParser {
    supports_true_color: bool,
    supports_256: bool,
    no_color: bool,
}

impl ColorParser {
    /// Create a new ColorParser with automatic terminal capability detection
    pub fn new() -> Self {
        let no_color = std::env::var("NO_COLOR").is_ok();
        let support = supports_color::on(Stream::Stdout);

        Self {
            supports_true_color: support.as_ref().is_some_and(|s| s.has_16m),
            supports_256: support.as_ref().is_some_and(|s| s.has_256),
            no_color,
        }
    }

    /// Parser with fixed capabilities, independent of the environment
    pub fn with_capabilities(supports_true_color: bool, supports_256: bool) -> Self {
        Self {
            supports_true_color,
            supports_256,
            no_color: false,
        }
    }

    /// Parse a color string (hex, indexed or named) into a terminal color
    pub fn parse(&self, s: &str) -> Result<Color> {
        if self.no_color {
            return Ok(Color::Reset);
        }

        let trimmed = s.trim();

        if trimmed.starts_with('#') && trimmed.len() == 7 {
            let (r, g, b) = parse_hex(trimmed)?;
            return Ok(self.convert_rgb_to_terminal_color(r, g, b));
        }

        let lower = trimmed.to_lowercase();
        if let Some(num_str) = lower
            .strip_prefix("indexed(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let num = num_str.trim().parse::<u8>().map_err(|_| {
                eyre!(
                    "Invalid indexed color: '{}'. Expected format: indexed(0-255)",
                    trimmed
                )
            })?;
            return Ok(Color::Indexed(num));
        }

        match lower.as_str() {
            "black" => Ok(Color::Black),
            "red" => Ok(Color::Red),
            "green" => Ok(Color::Green),
            "yellow" => Ok(Color::Yellow),
            "blue" => Ok(Color::Blue),
            "magenta" => Ok(Color::Magenta),
            "cyan" => Ok(Color::Cyan),
            "white" => Ok(Color::White),

            "bright_black" | "bright black" => Ok(Color::Indexed(8)),
            "bright_red" | "bright red" => Ok(Color::Indexed(9)),
            "bright_green" | "bright green" => Ok(Color::Indexed(10)),
            "bright_yellow" | "bright yellow" => Ok(Color::Indexed(11)),
            "bright_blue" | "bright blue" => Ok(Color::Indexed(12)),
            "bright_magenta" | "bright magenta" => Ok(Color::Indexed(13)),
            "bright_cyan" | "bright cyan" => Ok(Color::Indexed(14)),
            "bright_white" | "bright white" => Ok(Color::Indexed(15)),

            "gray" | "grey" => Ok(Color::Indexed(8)),
            "dark_gray" | "dark gray" | "dark_grey" | "dark grey" => Ok(Color::Indexed(8)),
            "light_gray" | "light gray" | "light_grey" | "light grey" => Ok(Color::Indexed(7)),

            "reset" | "default" => Ok(Color::Reset),

            _ => Err(eyre!(
                "Unknown color name: '{}'. Supported: basic ANSI colors (red, blue, etc.), \
                 bright variants (bright_red, etc.), indexed(0-255), or hex colors (#ff0000)",
                trimmed
            )),
        }
    }

    fn convert_rgb_to_terminal_color(&self, r: u8, g: u8, b: u8) -> Color {
        if self.supports_true_color {
            Color::Rgb(r, g, b)
        } else if self.supports_256 {
            Color::Indexed(rgb_to_256_color(r, g, b))
        } else {
            rgb_to_basic_ansi(r, g, b)
        }
    }
}

impl Default for ColorParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse hex color string (#ff0000) to RGB components
fn parse_hex(s: &str) -> Result<(u8, u8, u8)> {
    let digits = s
        .strip_prefix('#')
        .filter(|d| d.len() == 6 && d.is_ascii())
        .ok_or_else(|| eyre!("Invalid hex color format: '{}'. Expected format: #rrggbb", s))?;

    let component = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16)
            .map_err(|_| eyre!("Invalid hex color: {}", s))
    };
    Ok((component(0..2)?, component(2..4)?, component(4..6)?))
}

/// Nearest entry of the xterm 256-color palette
pub fn rgb_to_256_color(r: u8, g: u8, b: u8) -> u8 {
    // near-gray values map onto the grayscale ramp (232-255)
    let max_diff = r.max(g).max(b) as i16 - r.min(g).min(b) as i16;
    if max_diff < 10 {
        let gray = (r as u16 + g as u16 + b as u16) / 3;
        return if gray < 8 {
            16
        } else if gray > 247 {
            231
        } else {
            232 + ((gray - 8) * 24 / 240) as u8
        };
    }

    // 6x6x6 color cube (16-231)
    let r_idx = (r as u16 * 5 / 255) as u8;
    let g_idx = (g as u16 * 5 / 255) as u8;
    let b_idx = (b as u16 * 5 / 255) as u8;

    16 + 36 * r_idx + 6 * g_idx + b_idx
}

/// Nearest of the 8 basic ANSI colors
pub fn rgb_to_basic_ansi(r: u8, g: u8, b: u8) -> Color {
    let max_diff = r.max(g).max(b) as i16 - r.min(g).min(b) as i16;
    if max_diff < 30 {
        let avg = (r as u16 + g as u16 + b as u16) / 3;
        return if avg < 64 { Color::Black } else { Color::White };
    }

    match (r > 128, g > 128, b > 128) {
        (false, false, false) => Color::Black,
        (true, false, false) => Color::Red,
        (false, true, false) => Color::Green,
        (true, true, false) => Color::Yellow,
        (false, false, true) => Color::Blue,
        (true, false, true) => Color::Magenta,
        (false, true, true) => Color::Cyan,
        (true, true, true) => Color::White,
    }
}

/// Theme containing parsed colors ready for use
#[derive(Debug, Clone)]
pub struct Theme {
    pub colors: HashMap<String, Color>,
    pub columns: Vec<Color>,
}

impl Theme {
    /// Create a Theme from a ThemeConfig by parsing all color strings
    pub fn from_config(config: &ThemeConfig) -> Result<Self> {
        Self::from_config_with(config, &ColorParser::new())
    }

    pub fn from_config_with(config: &ThemeConfig, parser: &ColorParser) -> Result<Self> {
        let colors = config
            .colors
            .named()
            .into_iter()
            .map(|(name, value)| Ok((name.to_string(), parser.parse(value)?)))
            .collect::<Result<HashMap<_, _>>>()?;
        let columns = config
            .colors
            .columns
            .iter()
            .map(|value| parser.parse(value))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { colors, columns })
    }

    /// Get a color by name, returns Reset if not found
    pub fn get(&self, name: &str) -> Color {
        self.colors.get(name).copied().unwrap_or(Color::Reset)
    }

    /// Palette color for column `index`, cycling through the palette
    pub fn column(&self, index: usize) -> Color {
        if self.columns.is_empty() {
            Color::Reset
        } else {
            self.columns[index % self.columns.len()]
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        let parser = ColorParser::with_capabilities(true, true);
        // the built-in colors always parse
        Self::from_config_with(&ThemeConfig::default(), &parser).unwrap_or(Self {
            colors: HashMap::new(),
            columns: Vec::new(),
        })
    }
}
