//! Where trellis keeps its files
//!
//! Everything lives in one directory:
//! - Unix/macOS: `$XDG_CONFIG_HOME/trellis/`, else `~/.config/trellis/`
//! - Windows: `%APPDATA%\trellis\`
//!
//! Layout: `config.yaml` plus a `logs/` directory of daily-rotated
//! `trellis.log.YYYY-MM-DD` files.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

const APP_DIR: &str = "trellis";
const CONFIG_FILE: &str = "config.yaml";
const LOGS_DIR: &str = "logs";

/// Prefix of the daily-rotated log files
pub const LOG_FILE_PREFIX: &str = "trellis.log";

/// Base config directory, `None` when no home or app-data directory is known
pub fn config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    let base = env::var_os("APPDATA").map(PathBuf::from);

    #[cfg(not(target_os = "windows"))]
    let base = env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|h| h.join(".config")));

    base.map(|dir| dir.join(APP_DIR))
}

pub fn config_file() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(CONFIG_FILE))
}

pub fn logs_dir() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(LOGS_DIR))
}

/// Log file currently being written to
pub fn log_file() -> Option<PathBuf> {
    logs_dir().map(|dir| newest_log_in(&dir))
}

/// Newest rotated log in `dir`. Dated suffixes sort naturally, so the
/// greatest name wins; an empty or missing directory gives the bare prefix.
pub fn newest_log_in(dir: &Path) -> PathBuf {
    let newest = fs::read_dir(dir).ok().and_then(|entries| {
        entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(LOG_FILE_PREFIX))
            })
            .max()
    });
    newest.unwrap_or_else(|| dir.join(LOG_FILE_PREFIX))
}

/// Every path trellis uses, resolved together
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locations {
    pub config_file: PathBuf,
    pub logs_dir: PathBuf,
    pub log_file: PathBuf,
}

impl Locations {
    /// Layout under an explicit base directory
    pub fn under(dir: &Path) -> Self {
        let logs_dir = dir.join(LOGS_DIR);
        Self {
            config_file: dir.join(CONFIG_FILE),
            log_file: newest_log_in(&logs_dir),
            logs_dir,
        }
    }

    pub fn resolve() -> Option<Self> {
        Some(Self {
            config_file: config_file()?,
            logs_dir: logs_dir()?,
            log_file: log_file()?,
        })
    }
}

fn ensure_dir(path: &Path) -> Result<(), String> {
    fs::create_dir_all(path)
        .map_err(|e| format!("Failed to create directory {}: {}", path.display(), e))
}

/// Create the config dir if needed and return it
pub fn ensure_config_dir() -> Result<PathBuf, String> {
    let dir = config_dir().ok_or_else(|| "No config directory available".to_string())?;
    ensure_dir(&dir)?;
    Ok(dir)
}

/// Create the logs dir if needed and return it
pub fn ensure_logs_dir() -> Result<PathBuf, String> {
    let logs = ensure_config_dir()?.join(LOGS_DIR);
    ensure_dir(&logs)?;
    Ok(logs)
}
