//! Editor configuration persistence
//!
//! Stores user preferences in `~/.config/trellis/config.yaml`

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::history::DEFAULT_UNDO_LIMIT;

/// Editor configuration that persists across sessions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Number of undo steps kept
    #[serde(default = "default_undo_limit")]
    pub undo_limit: usize,

    /// Deleting more frames than this asks for confirmation first
    #[serde(default = "default_delete_confirm_threshold")]
    pub delete_confirm_threshold: usize,

    /// Flag required slots that are left empty
    #[serde(default = "default_validate_empty_slots")]
    pub validate_empty_slots: bool,
}

fn default_undo_limit() -> usize {
    DEFAULT_UNDO_LIMIT
}

fn default_delete_confirm_threshold() -> usize {
    20
}

fn default_validate_empty_slots() -> bool {
    true
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            undo_limit: default_undo_limit(),
            delete_confirm_threshold: default_delete_confirm_threshold(),
            validate_empty_slots: default_validate_empty_slots(),
        }
    }
}

impl EditorConfig {
    /// Load config from the user config directory, or return defaults
    pub fn load() -> Self {
        let Some(path) = crate::config_paths::config_file() else {
            tracing::debug!("No config directory available, using defaults");
            return Self::default();
        };
        Self::load_from(&path)
    }

    /// Load config from `path`; missing or unreadable files give defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!("Config file not found at {}, using defaults", path.display());
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match serde_yaml::from_str(&content) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse config at {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read config at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save config to the user config directory
    pub fn save(&self) -> Result<(), String> {
        let path = crate::config_paths::config_file()
            .ok_or_else(|| "No config directory available".to_string())?;
        self.save_to(&path)
    }

    /// Save config to `path`, creating its directory if needed
    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        let content = serde_yaml::to_string(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        std::fs::write(path, content)
            .map_err(|e| format!("Failed to write config to {}: {}", path.display(), e))?;

        tracing::info!("Saved config to {}", path.display());
        Ok(())
    }
}
