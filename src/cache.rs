use color_eyre::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Subdirectory holding the rolling log files
pub const LOGS_DIR: &str = "logs";

/// Manages cache directory and cache file operations
#[derive(Clone)]
pub struct CacheManager {
    pub(crate) cache_dir: PathBuf,
}

impl CacheManager {
    /// Create a CacheManager with a custom cache directory (primarily for testing)
    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    /// Create a new CacheManager for the given app name
    pub fn new(app_name: &str) -> Result<Self> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| color_eyre::eyre::eyre!("Could not determine cache directory"))?
            .join(app_name);

        Ok(Self { cache_dir })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.cache_dir.join(LOGS_DIR)
    }

    /// Ensure the log directory exists and return it
    pub fn ensure_logs_dir(&self) -> Result<PathBuf> {
        let logs_dir = self.logs_dir();
        if !logs_dir.exists() {
            fs::create_dir_all(&logs_dir)?;
        }
        Ok(logs_dir)
    }

    /// Remove everything csvpeek keeps in the cache directory.
    /// Returns false when there was nothing to clear.
    pub fn clear_all(&self) -> Result<bool> {
        if !self.cache_dir.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(&self.cache_dir)?;
        Ok(true)
    }
}
