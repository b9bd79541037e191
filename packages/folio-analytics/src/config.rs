//! Engine configuration loaded from TOML.

use crate::filters::FilterCriteria;
use crate::stats::{CONSISTENCY_THRESHOLD, RISK_FREE_RATE};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Constants used by the period statistics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StatsConfig {
    /// Annual risk-free rate in percent
    pub risk_free_rate: f64,
    /// Monthly return in percent counted as a consistent month
    pub consistency_threshold: f64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: RISK_FREE_RATE,
            consistency_threshold: CONSISTENCY_THRESHOLD,
        }
    }
}

/// Top-level configuration for the analytics engine and CLI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Lookback used when no period is requested
    pub default_period_months: usize,
    /// Rows per page for filtered signal lists
    pub page_size: usize,
    pub stats: StatsConfig,
    /// Default filter criteria
    pub filters: FilterCriteria,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_period_months: 12,
            page_size: 20,
            stats: StatsConfig::default(),
            filters: FilterCriteria::default(),
        }
    }
}

impl EngineConfig {
    /// Get the default config file path.
    ///
    /// Default path: `~/.folio/config.toml`
    /// Can be overridden with `FOLIO_CONFIG_FILE` environment variable.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("FOLIO_CONFIG_FILE") {
            return PathBuf::from(path);
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".folio/config.toml"))
            .unwrap_or_else(|| PathBuf::from("folio.toml"))
    }

    /// Load from the default path.
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::default_path())
    }

    /// Load from a specific path. A missing file yields the defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Save to a specific path, creating parent directories.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
