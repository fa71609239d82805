//! Runtime configuration
//!
//! Resolved in three layers: built-in defaults, then the optional
//! `~/.planwright/config.toml`, then environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::constants::{ai, plan};
use crate::paths;

/// Resolved configuration shared by the server and the CLI.
#[derive(Debug, Clone)]
pub struct PlanwrightConfig {
    /// Model ID sent with every generation request
    pub model: String,
    /// Messages API endpoint
    pub base_url: String,
    /// API key (generation is unavailable without one)
    pub api_key: Option<String>,
    /// Output budget per analysis section
    pub section_max_tokens: usize,
    /// Output budget for the executive summary
    pub summary_max_tokens: usize,
    /// SQLite database location
    pub db_path: PathBuf,
    /// HTTP port for `serve`
    pub port: u16,
    /// Wall-clock budget for one generation request
    pub run_timeout: Duration,
}

impl Default for PlanwrightConfig {
    fn default() -> Self {
        Self {
            model: ai::DEFAULT_MODEL.to_string(),
            base_url: ai::DEFAULT_API_URL.to_string(),
            api_key: None,
            section_max_tokens: ai::SECTION_MAX_TOKENS,
            summary_max_tokens: ai::SUMMARY_MAX_TOKENS,
            db_path: paths::default_db_path(),
            port: 3000,
            run_timeout: Duration::from_secs(plan::RUN_TIMEOUT_SECS),
        }
    }
}

/// On-disk shape of `config.toml`. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub section_max_tokens: Option<usize>,
    pub summary_max_tokens: Option<usize>,
    pub db_path: Option<PathBuf>,
    pub port: Option<u16>,
    pub run_timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Read a config file, returning `None` when it does not exist.
    pub fn read(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let parsed = toml::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(Some(parsed))
    }
}

impl PlanwrightConfig {
    /// Load from `~/.planwright/config.toml` and the process environment.
    pub fn load() -> Result<Self> {
        let file = FileConfig::read(&paths::config_file_path())?;
        Self::from_sources(file, |key| std::env::var(key).ok())
    }

    /// Layer a parsed config file and an environment lookup over the defaults.
    pub fn from_sources(
        file: Option<FileConfig>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut config = Self::default();

        if let Some(file) = file {
            if let Some(model) = file.model {
                config.model = model;
            }
            if let Some(base_url) = file.base_url {
                config.base_url = base_url;
            }
            if file.api_key.is_some() {
                config.api_key = file.api_key;
            }
            if let Some(tokens) = file.section_max_tokens {
                config.section_max_tokens = tokens;
            }
            if let Some(tokens) = file.summary_max_tokens {
                config.summary_max_tokens = tokens;
            }
            if let Some(db_path) = file.db_path {
                config.db_path = db_path;
            }
            if let Some(port) = file.port {
                config.port = port;
            }
            if let Some(secs) = file.run_timeout_secs {
                config.run_timeout = Duration::from_secs(secs);
            }
        }

        let env = |key: &str| env(key).filter(|value| !value.trim().is_empty());

        if let Some(key) = env("ANTHROPIC_API_KEY") {
            config.api_key = Some(key);
        }
        if let Some(model) = env("PLANWRIGHT_MODEL") {
            config.model = model;
        }
        if let Some(base_url) = env("PLANWRIGHT_BASE_URL") {
            config.base_url = base_url;
        }
        if let Some(db_path) = env("PLANWRIGHT_DB_PATH") {
            config.db_path = PathBuf::from(db_path);
        }
        if let Some(port) = env("PORT") {
            config.port = port
                .parse()
                .with_context(|| format!("invalid PORT value: {}", port))?;
        }
        if let Some(secs) = env("PLANWRIGHT_RUN_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .with_context(|| format!("invalid PLANWRIGHT_RUN_TIMEOUT_SECS value: {}", secs))?;
            config.run_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}
