//! Linear depletion forecast
//!
//! Estimates the time until an entity runs dry from the average
//! consumption over its history window. Each reading is counted as one
//! hour of history, whatever the real sampling interval was; with
//! sparser or denser sampling the estimate is biased accordingly.

use serde::{Deserialize, Serialize};

use super::round_to;
use crate::models::{EntityKind, Reading, clamp_level};

/// Qualitative backing of a prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        }
    }
}

/// Recommendation texts
pub mod recommendation {
    pub const INSUFFICIENT_DATA: &str = "insufficient data";
    pub const LEVEL_STABLE: &str = "level stable";
    pub const TANK_CRITICAL: &str = "critical, act immediately";
    pub const TANK_LOW: &str = "low, schedule refill";
    pub const GENERATOR_CRITICAL: &str = "critical, refuel immediately";
    pub const GENERATOR_LOW: &str = "low, schedule refuel";
    pub const HEALTHY: &str = "healthy";
}

/// Predictor tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    /// Minimum readings before any prediction is made
    pub min_readings: usize,
    /// More readings than this give `high` confidence
    pub high_confidence_above: usize,
    /// Tank tiers, in days remaining
    pub tank_critical_days: f64,
    pub tank_low_days: f64,
    /// Generator tiers, in hours remaining
    pub generator_critical_hours: f64,
    pub generator_low_hours: f64,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            min_readings: 10,
            high_confidence_above: 48,
            tank_critical_days: 1.0,
            tank_low_days: 3.0,
            generator_critical_hours: 24.0,
            generator_low_hours: 72.0,
        }
    }
}

/// Depletion forecast for one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    pub kind: EntityKind,
    /// Days for tanks, hours for generators (1 decimal); None without a forecast
    pub predicted_remaining: Option<f64>,
    /// Level percent consumed per hour (3 decimals)
    pub consumption_rate: f64,
    /// Level percent consumed per day (2 decimals)
    pub daily_consumption: f64,
    pub current_level: f64,
    pub recommendation: String,
    pub confidence: Confidence,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PredictionResult {
    /// Degraded result when history is too short
    pub fn insufficient(kind: EntityKind, current_level: f64) -> Self {
        Self {
            kind,
            predicted_remaining: None,
            consumption_rate: 0.0,
            daily_consumption: 0.0,
            current_level: clamp_level(current_level),
            recommendation: recommendation::INSUFFICIENT_DATA.to_string(),
            confidence: Confidence::Low,
            error: None,
        }
    }

    /// Placeholder for an entity whose data could not be loaded
    pub fn failed(kind: EntityKind, reason: impl Into<String>) -> Self {
        Self {
            error: Some(reason.into()),
            ..Self::insufficient(kind, 0.0)
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    /// Remaining time expressed in days regardless of entity kind
    pub fn remaining_days(&self) -> Option<f64> {
        self.predicted_remaining.map(|r| match self.kind {
            EntityKind::Tank => r,
            EntityKind::Generator => round_to(r / 24.0, 1),
        })
    }
}

/// Depletion predictor
#[derive(Debug, Clone, Copy, Default)]
pub struct UsagePredictor {
    config: PredictionConfig,
}

impl UsagePredictor {
    pub fn new(config: PredictionConfig) -> Self {
        Self { config }
    }

    /// Forecast time to empty from an ascending reading window
    pub fn predict(&self, readings: &[Reading], current_level: f64, kind: EntityKind) -> PredictionResult {
        let current_level = clamp_level(current_level);
        let (Some(first), Some(last)) = (readings.first(), readings.last()) else {
            return PredictionResult::insufficient(kind, current_level);
        };
        if readings.len() < self.config.min_readings {
            return PredictionResult::insufficient(kind, current_level);
        }

        let confidence = if readings.len() > self.config.high_confidence_above {
            Confidence::High
        } else {
            Confidence::Medium
        };

        // Positive while draining, negative while refilling
        let total_consumption = first.clamped_level() - last.clamped_level();
        if total_consumption <= 0.0 {
            return PredictionResult {
                kind,
                predicted_remaining: None,
                consumption_rate: 0.0,
                daily_consumption: 0.0,
                current_level,
                recommendation: recommendation::LEVEL_STABLE.to_string(),
                confidence,
                error: None,
            };
        }

        let hourly_rate = total_consumption / readings.len() as f64;
        let daily_rate = hourly_rate * 24.0;

        let (remaining, advice) = match kind {
            EntityKind::Tank => {
                let days = current_level / daily_rate;
                (days, self.tank_advice(days))
            }
            EntityKind::Generator => {
                let hours = current_level / hourly_rate;
                (hours, self.generator_advice(hours))
            }
        };

        PredictionResult {
            kind,
            predicted_remaining: Some(round_to(remaining, 1)),
            consumption_rate: round_to(hourly_rate, 3),
            daily_consumption: round_to(daily_rate, 2),
            current_level,
            recommendation: advice.to_string(),
            confidence,
            error: None,
        }
    }

    fn tank_advice(&self, days: f64) -> &'static str {
        if days < self.config.tank_critical_days {
            recommendation::TANK_CRITICAL
        } else if days < self.config.tank_low_days {
            recommendation::TANK_LOW
        } else {
            recommendation::HEALTHY
        }
    }

    fn generator_advice(&self, hours: f64) -> &'static str {
        if hours < self.config.generator_critical_hours {
            recommendation::GENERATOR_CRITICAL
        } else if hours < self.config.generator_low_hours {
            recommendation::GENERATOR_LOW
        } else {
            recommendation::HEALTHY
        }
    }
}

/// Forecast with the default configuration
pub fn predict_depletion(readings: &[Reading], current_level: f64, kind: EntityKind) -> PredictionResult {
    UsagePredictor::default().predict(readings, current_level, kind)
}
