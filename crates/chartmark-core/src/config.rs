//! Configuration management for chartmark.
//!
//! Loads configuration from ${CHARTMARK_HOME}/config.toml with sensible defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::html::HtmlOptions;
use crate::hydrate::HydrateOptions;

/// Environment variable overriding `charts.base_url`.
pub const BASE_URL_ENV: &str = "CHARTMARK_BASE_URL";

/// Returns the default config template with comments.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

pub mod paths {
    //! Path resolution for chartmark configuration.
    //!
    //! CHARTMARK_HOME resolution order:
    //! 1. CHARTMARK_HOME environment variable (if set)
    //! 2. ~/.config/chartmark (default)

    use std::env;
    use std::path::PathBuf;

    /// Returns the chartmark home directory.
    pub fn chartmark_home() -> PathBuf {
        if let Ok(home) = env::var("CHARTMARK_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".chartmark"),
            |h| h.join(".config").join("chartmark"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        chartmark_home().join("config.toml")
    }
}

/// Chart hydration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartsConfig {
    /// Base URL for relative chart references
    pub base_url: Option<String>,
    /// Timeout for each chart data request in seconds (0 disables)
    pub fetch_timeout_secs: u64,
    /// Layout width applied after the first draw (0 disables)
    pub surface_width: f64,
}

impl Default for ChartsConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            fetch_timeout_secs: Self::DEFAULT_FETCH_TIMEOUT_SECS,
            surface_width: 0.0,
        }
    }
}

impl ChartsConfig {
    const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

    pub fn fetch_timeout(&self) -> Option<Duration> {
        if self.fetch_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.fetch_timeout_secs))
        }
    }

    /// Returns the base URL, honoring the `CHARTMARK_BASE_URL` override.
    pub fn effective_base_url(&self) -> Result<Option<Url>> {
        resolve_base_url(env::var(BASE_URL_ENV).ok().as_deref(), self.base_url.as_deref())
    }

    /// Builds hydrator settings from this section.
    pub fn hydrate_options(&self) -> Result<HydrateOptions> {
        Ok(HydrateOptions {
            base_url: self.effective_base_url()?,
            fetch_timeout: self.fetch_timeout(),
        })
    }
}

/// Logging settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log file path. Logs go to stderr when unset.
    pub file: Option<String>,
}

impl LogConfig {
    pub fn file_path(&self) -> Option<PathBuf> {
        self.file
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(PathBuf::from)
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTML rendering switches
    pub render: HtmlOptions,

    /// Chart hydration settings
    pub charts: ChartsConfig,

    /// Logging settings
    pub log: LogConfig,
}

impl Config {
    /// Loads configuration from the default config path.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Creates a default config file at the given path.
    /// Returns an error if the file already exists.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, default_config_template())
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }
}

/// Picks the override when non-empty, else the configured value, and
/// validates the result.
fn resolve_base_url(override_value: Option<&str>, configured: Option<&str>) -> Result<Option<Url>> {
    let (raw, source) = match override_value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => (value, BASE_URL_ENV),
        None => match configured.map(str::trim).filter(|v| !v.is_empty()) {
            Some(value) => (value, "charts.base_url"),
            None => return Ok(None),
        },
    };

    let url = Url::parse(raw).with_context(|| format!("Invalid base URL in {source}: {raw}"))?;
    if url.cannot_be_a_base() {
        anyhow::bail!("Base URL in {source} cannot hold relative paths: {raw}");
    }
    Ok(Some(url))
}
