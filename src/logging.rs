//! Log file setup.
//!
//! The terminal UI owns stdout and stderr, so everything goes to a daily
//! rolling file, `~/.cache/csvpeek/logs/csvpeek.log.<date>`. `RUST_LOG`
//! overrides the configured level, e.g. `RUST_LOG=csvpeek::engine=trace`.

use color_eyre::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::cache::CacheManager;

pub const LOG_FILE: &str = "csvpeek.log";

/// Install the global subscriber writing to the cache's log directory.
///
/// The returned guard flushes buffered lines on drop and must be held until
/// the app exits.
pub fn init(cache: &CacheManager, level: &str) -> Result<WorkerGuard> {
    let logs_dir = cache.ensure_logs_dir()?;
    let file_appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_thread_names(true)
                .with_filter(filter),
        )
        .try_init()?;

    Ok(guard)
}
