use crate::error::{KitzurError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DB_FILENAME: &str = "shortcuts.json";
pub const CONFIG_FILENAME: &str = "config.json";
pub const HOME_ENV: &str = "KITZUR_HOME";

/// Longest shortcut key accepted, in characters
pub const MAX_SHORTCUT_LEN: usize = 20;
pub const DEFAULT_CACHE_SIZE: usize = 2000;
pub const UNDO_CAPACITY: usize = 10;
pub const UNDO_WINDOW_MS: u64 = 30_000;
pub const DEFAULT_QUOTA_MAX: u32 = 100;
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 5 * 60;
pub const DEFAULT_API_PORT: u16 = 3000;

/// Get the kitzur configuration directory
pub fn get_config_dir() -> PathBuf {
    if let Ok(dir) = env::var(HOME_ENV) {
        return PathBuf::from(dir);
    }
    env::var("HOME")
        .map(|home| PathBuf::from(home).join(".kitzur"))
        .unwrap_or_else(|_| PathBuf::from(".kitzur"))
}

/// Ensure the configuration directory and an empty database exist
pub fn ensure_config_dir() -> Result<PathBuf> {
    let config_dir = get_config_dir();
    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    let db_path = get_db_file_path();
    if !db_path.exists() {
        log::info!("Creating shortcut database at: {}", db_path.display());
        fs::write(&db_path, "")?;
    }

    Ok(config_dir)
}

/// Get the path to the shortcut database file
pub fn get_db_file_path() -> PathBuf {
    get_config_dir().join(DB_FILENAME)
}

/// Get the path to the engine configuration file
pub fn get_config_file_path() -> PathBuf {
    get_config_dir().join(CONFIG_FILENAME)
}

/// Engine settings. Built once and handed to constructors; never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on cached shortcut entries
    pub cache_size: usize,
    /// Minimum age of the loaded snapshot before a non-forced reload hits the backend
    pub refresh_interval_secs: u64,
    /// How long after an expansion the undo command may still reverse it
    pub undo_window_ms: u64,
    pub undo_capacity: usize,
    /// Convert spelled tens words to digits and merge compound numbers
    pub convert_numbers: bool,
    /// Category names whose expansions take a "- " separator after a Hebrew prefix
    pub english_categories: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_size: DEFAULT_CACHE_SIZE,
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            undo_window_ms: UNDO_WINDOW_MS,
            undo_capacity: UNDO_CAPACITY,
            convert_numbers: true,
            english_categories: vec!["english".to_string(), "אנגלית".to_string()],
        }
    }
}

impl EngineConfig {
    /// Load settings from a JSON file. A missing or empty file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: EngineConfig = serde_json::from_str(&content)
            .map_err(|e| KitzurError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cache_size == 0 {
            return Err(KitzurError::InvalidConfig(
                "cache_size must be greater than zero".to_string(),
            ));
        }
        if self.undo_capacity == 0 {
            return Err(KitzurError::InvalidConfig(
                "undo_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn undo_window(&self) -> Duration {
        Duration::from_millis(self.undo_window_ms)
    }

    /// Whether a category label marks its entries as English words
    pub fn is_english_category(&self, category: &str) -> bool {
        let category = category.trim().to_lowercase();
        self.english_categories
            .iter()
            .any(|name| name.to_lowercase() == category)
    }
}
