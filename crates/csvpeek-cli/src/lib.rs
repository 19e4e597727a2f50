//! Shared CLI definitions for csvpeek.
//!
//! Used by the main application and by the build script (manpage) and
//! gen_docs binary (command-line-options markdown).

use clap::{CommandFactory, Parser};

/// Parse a delimiter given as a single ASCII character, or one of the
/// names `tab`, `\t`, `comma`, `semicolon`, `pipe`.
pub fn parse_delimiter(s: &str) -> Result<u8, String> {
    match s.to_lowercase().as_str() {
        "tab" | "\\t" => return Ok(b'\t'),
        "comma" => return Ok(b','),
        "semicolon" => return Ok(b';'),
        "pipe" => return Ok(b'|'),
        _ => {}
    }
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() && c != '\n' && c != '\r' => Ok(c as u8),
        _ => Err(format!(
            "delimiter must be a single ASCII character or one of tab, comma, semicolon, pipe (got {s:?})"
        )),
    }
}

/// Command-line arguments for csvpeek
#[derive(Clone, Parser, Debug)]
#[command(
    name = "csvpeek",
    version,
    about = "Scroll and search huge delimited text files in the terminal",
    long_about = include_str!("../long_about.txt")
)]
pub struct Args {
    /// Path to the delimited text file to open (not required with --generate-config or --clear-cache)
    #[arg(required_unless_present_any = ["generate_config", "clear_cache"], value_name = "PATH")]
    pub path: Option<std::path::PathBuf>,

    /// Field delimiter (single character, or tab/comma/semicolon/pipe). Auto-detected from the header when omitted
    #[arg(long = "delimiter", value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,

    /// Number of rows read per chunk (default: 512)
    #[arg(long = "chunk-size", value_name = "N")]
    pub chunk_size: Option<usize>,

    /// Maximum number of chunks kept in memory (default: 8)
    #[arg(long = "max-chunks", value_name = "N")]
    pub max_chunks: Option<usize>,

    /// Let the header scroll away with the data instead of pinning it to the top
    #[arg(long = "no-pin-header", action)]
    pub no_pin_header: bool,

    /// Display row numbers on the left side of the table
    #[arg(long = "row-numbers", action)]
    pub row_numbers: bool,

    /// Enable debug logging to the log file
    #[arg(long = "debug", action)]
    pub debug: bool,

    /// Clear all cache data (including logs) and exit
    #[arg(long = "clear-cache", action)]
    pub clear_cache: bool,

    /// Generate default configuration file at ~/.config/csvpeek/config.toml
    #[arg(long = "generate-config", action)]
    pub generate_config: bool,

    /// Force overwrite existing config file when using --generate-config
    #[arg(long = "force", requires = "generate_config", action)]
    pub force: bool,
}

/// Escape `|` and newlines for use in markdown table cells.
fn escape_table_cell(s: &str) -> String {
    s.replace('|', "\\|").replace(['\n', '\r'], " ")
}

fn value_placeholder(arg: &clap::Arg) -> String {
    arg.get_value_names()
        .map(|names| {
            names
                .iter()
                .map(|n: &clap::builder::Str| format!("<{}>", n.as_ref() as &str))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
}

/// Render command-line options as markdown.
pub fn render_options_markdown() -> String {
    let mut cmd = Args::command();
    cmd.build();

    let mut out = String::from("# Command Line Options\n\n");

    out.push_str("## Usage\n\n```\n");
    out.push_str(&cmd.render_usage().to_string());
    out.push_str("\n```\n\n");

    out.push_str("## Options\n\n");
    out.push_str("| Option | Description |\n");
    out.push_str("|--------|-------------|\n");

    for arg in cmd.get_arguments() {
        let id = arg.get_id().as_ref().to_string();
        if id == "help" || id == "version" {
            continue;
        }

        let option_str = if arg.is_positional() {
            let placeholder = value_placeholder(arg);
            if arg.is_required_set() {
                placeholder
            } else {
                format!("[{placeholder}]")
            }
        } else {
            let mut parts = Vec::new();
            if let Some(s) = arg.get_short() {
                parts.push(format!("-{s}"));
            }
            if let Some(l) = arg.get_long() {
                parts.push(format!("--{l}"));
            }
            let op = parts.join(", ");
            let placeholder = if arg.get_action().takes_values() {
                value_placeholder(arg)
            } else {
                String::new()
            };
            if placeholder.is_empty() {
                op
            } else {
                format!("{op} {placeholder}")
            }
        };

        let help = arg
            .get_help()
            .map(|h| escape_table_cell(&h.to_string()))
            .unwrap_or_else(|| "-".to_string());

        out.push_str(&format!("| `{option_str}` | {help} |\n"));
    }

    out
}
