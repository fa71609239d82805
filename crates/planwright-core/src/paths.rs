//! Centralized path utilities

use std::path::PathBuf;

use crate::constants::ui;

/// Get the planwright config directory (~/.planwright)
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(ui::CONFIG_DIR_NAME)
}

/// Get the optional TOML config file (~/.planwright/config.toml)
pub fn config_file_path() -> PathBuf {
    config_dir().join(ui::CONFIG_FILE_NAME)
}

/// Get the default SQLite database path (~/.planwright/planwright.db)
pub fn default_db_path() -> PathBuf {
    config_dir().join(ui::DB_FILE_NAME)
}
