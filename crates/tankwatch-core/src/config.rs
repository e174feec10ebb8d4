//! Analytics configuration
//!
//! Loaded from `tankwatch.toml` (or `--config`). Every field has a default,
//! so an empty file is a valid configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::analytics::{CardThresholds, PredictionConfig, StatusThresholds, TrendThresholds};
use crate::error::CoreError;
use crate::store::MAX_WINDOW_HOURS;

/// Tunables for the analytics and the aggregator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Default trend window when the caller does not pass one
    pub trend_window_hours: u32,
    /// History window fed to the depletion predictor
    pub prediction_window_hours: u32,
    /// Maximum readings fetched per entity and window
    pub history_limit: usize,
    /// Readings older than this are pruned by the store
    pub retention_days: u32,
    pub trend: TrendThresholds,
    pub prediction: PredictionConfig,
    /// Cutoffs for status tables
    pub status: StatusThresholds,
    /// Cutoffs for entity cards
    pub card: CardThresholds,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            trend_window_hours: 24,
            prediction_window_hours: 168,
            history_limit: 100,
            retention_days: 90,
            trend: TrendThresholds::default(),
            prediction: PredictionConfig::default(),
            status: StatusThresholds::default(),
            card: CardThresholds::default(),
        }
    }
}

impl AnalyticsConfig {
    /// Default location: `<config dir>/tankwatch/tankwatch.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("tankwatch").join("tankwatch.toml"))
    }

    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path).map_err(|source| CoreError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| CoreError::ConfigParse {
            path: path.to_path_buf(),
            message: source.message().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given, else the default location if it exists, else defaults
    pub fn resolve(path: Option<&Path>) -> Result<Self, CoreError> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(default) if default.exists() => Self::load(&default),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        let invalid = |message: String| Err(CoreError::InvalidConfig { message });

        let cutoffs = [
            ("trend.up", self.trend.up),
            ("trend.down", self.trend.down),
            ("prediction.tank_critical_days", self.prediction.tank_critical_days),
            ("prediction.tank_low_days", self.prediction.tank_low_days),
            ("prediction.generator_critical_hours", self.prediction.generator_critical_hours),
            ("prediction.generator_low_hours", self.prediction.generator_low_hours),
            ("status.critical_below", self.status.critical_below),
            ("status.warning_below", self.status.warning_below),
            ("card.critical_below", self.card.critical_below),
            ("card.low_below", self.card.low_below),
            ("card.medium_below", self.card.medium_below),
        ];
        if let Some((name, value)) = cutoffs.iter().find(|(_, v)| !v.is_finite()) {
            return invalid(format!("{} must be a finite number, got {}", name, value));
        }

        if self.trend.up < self.trend.down {
            return invalid(format!(
                "trend.up ({}) must not be below trend.down ({})",
                self.trend.up, self.trend.down
            ));
        }
        if self.trend_window_hours == 0 || self.prediction_window_hours == 0 {
            return invalid("history windows must be at least one hour".to_string());
        }
        if self.trend_window_hours > MAX_WINDOW_HOURS
            || self.prediction_window_hours > MAX_WINDOW_HOURS
        {
            return invalid(format!("history windows must not exceed {} hours", MAX_WINDOW_HOURS));
        }
        if self.retention_days > MAX_WINDOW_HOURS / 24 {
            return invalid(format!(
                "retention_days must not exceed {}",
                MAX_WINDOW_HOURS / 24
            ));
        }
        if self.history_limit == 0 {
            return invalid("history_limit must be positive".to_string());
        }
        if self.prediction.min_readings < 2 {
            return invalid("prediction.min_readings must be at least 2".to_string());
        }
        if self.status.critical_below > self.status.warning_below {
            return invalid("status.critical_below must not exceed status.warning_below".to_string());
        }
        let card = &self.card;
        if !(card.critical_below <= card.low_below && card.low_below <= card.medium_below) {
            return invalid("card cutoffs must be ascending (critical <= low <= medium)".to_string());
        }
        Ok(())
    }

    /// Write this configuration as TOML, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }
}
